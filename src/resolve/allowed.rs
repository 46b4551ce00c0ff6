// src/resolve/allowed.rs

use std::collections::BTreeMap;

use tracing::trace;

use crate::config::{FieldConfig, RecordConfig};
use crate::dag::RecordSnapshot;
use crate::engine::FieldName;
use crate::resolve::backend::{FieldResolver, ResolveError, ResolveFuture};

/// Picks each field's value from its configured reference set.
///
/// The configured `default` wins when present; otherwise the first allowed
/// value is used. A field with neither resolves to an error.
#[derive(Debug, Clone, Default)]
pub struct AllowedValuesResolver {
    fields: BTreeMap<FieldName, FieldConfig>,
}

impl AllowedValuesResolver {
    pub fn new(fields: BTreeMap<FieldName, FieldConfig>) -> Self {
        Self { fields }
    }

    pub fn from_config(cfg: &RecordConfig) -> Self {
        Self::new(cfg.field.clone())
    }

    fn pick(&self, field: &str) -> Result<String, ResolveError> {
        let cfg = self
            .fields
            .get(field)
            .ok_or_else(|| ResolveError::UnknownField(field.to_string()))?;

        cfg.default
            .clone()
            .or_else(|| cfg.values.first().cloned())
            .ok_or_else(|| ResolveError::NoAllowedValues(field.to_string()))
    }
}

impl FieldResolver for AllowedValuesResolver {
    fn resolve<'a>(&'a self, field: &'a str, snapshot: &'a RecordSnapshot) -> ResolveFuture<'a> {
        Box::pin(async move {
            trace!(field = %field, known = snapshot.len(), "picking allowed value");
            self.pick(field)
        })
    }
}
