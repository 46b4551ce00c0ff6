use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fieldgate::dag::RecordSnapshot;
use fieldgate::engine::FieldName;
use fieldgate::resolve::{FieldResolver, ResolveError, ResolveFuture};

/// One resolver call as seen by a [`ScriptedResolver`].
#[derive(Debug, Clone)]
pub struct ResolveCall {
    pub field: FieldName,
    pub snapshot: RecordSnapshot,
}

/// A fake resolver that:
/// - records every call together with the snapshot it was given
/// - sleeps for a fixed or random per-field delay
/// - fails for selected fields
/// - otherwise resolves `field` to `"<field>-v"`.
#[derive(Default)]
pub struct ScriptedResolver {
    delays: BTreeMap<FieldName, Duration>,
    jitter_ms: u64,
    rng: Mutex<fastrand::Rng>,
    failing: BTreeSet<FieldName>,
    calls: Arc<Mutex<Vec<ResolveCall>>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, field: &str, delay: Duration) -> Self {
        self.delays.insert(field.to_string(), delay);
        self
    }

    /// Add a random `0..=max_ms` delay to every call, seeded for repeatability.
    pub fn with_jitter(mut self, max_ms: u64, seed: u64) -> Self {
        self.jitter_ms = max_ms;
        self.rng = Mutex::new(fastrand::Rng::with_seed(seed));
        self
    }

    pub fn failing(mut self, field: &str) -> Self {
        self.failing.insert(field.to_string());
        self
    }

    /// Shared handle to the recorded calls.
    pub fn calls(&self) -> Arc<Mutex<Vec<ResolveCall>>> {
        Arc::clone(&self.calls)
    }

    fn delay_for(&self, field: &str) -> Duration {
        let fixed = self.delays.get(field).copied().unwrap_or_default();
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            self.rng.lock().unwrap().u64(0..=self.jitter_ms)
        };
        fixed + Duration::from_millis(jitter)
    }
}

/// Value a [`ScriptedResolver`] produces for `field`.
pub fn value_for(field: &str) -> String {
    format!("{field}-v")
}

impl FieldResolver for ScriptedResolver {
    fn resolve<'a>(&'a self, field: &'a str, snapshot: &'a RecordSnapshot) -> ResolveFuture<'a> {
        let delay = self.delay_for(field);
        Box::pin(async move {
            self.calls.lock().unwrap().push(ResolveCall {
                field: field.to_string(),
                snapshot: snapshot.clone(),
            });

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            if self.failing.contains(field) {
                return Err(ResolveError::Failed(format!("scripted failure for '{field}'")));
            }
            Ok(value_for(field))
        })
    }
}
