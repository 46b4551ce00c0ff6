// src/resolve/backend.rs

//! Pluggable resolver abstraction.
//!
//! The executor talks to a `FieldResolver` instead of knowing anything about
//! where values come from. This is the only place domain-specific logic
//! lives; it may do IO (e.g. look a value up in a reference set).

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::dag::RecordSnapshot;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("no allowed values configured for field '{0}'")]
    NoAllowedValues(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("{0}")]
    Failed(String),
}

pub type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ResolveError>> + Send + 'a>>;

/// Computes the value of one field.
///
/// `snapshot` holds the values of the fields resolved so far; whether
/// parents are in it depends on the run's
/// [`ResolutionOrder`](crate::types::ResolutionOrder).
pub trait FieldResolver: Send + Sync {
    fn resolve<'a>(&'a self, field: &'a str, snapshot: &'a RecordSnapshot) -> ResolveFuture<'a>;
}
