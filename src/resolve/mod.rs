// src/resolve/mod.rs

//! Field resolution layer.
//!
//! - [`backend`] provides the [`FieldResolver`] trait each field task calls
//!   exactly once. Tests plug in their own implementations.
//! - [`allowed`] is the built-in resolver that picks a value from a field's
//!   configured set of allowed values.

pub mod allowed;
pub mod backend;

pub use allowed::AllowedValuesResolver;
pub use backend::{FieldResolver, ResolveError, ResolveFuture};
