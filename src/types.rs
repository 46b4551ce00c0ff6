use std::str::FromStr;
use serde::Deserialize;

/// What to do when the declared parents form a cycle.
///
/// - `Degrade`: build the graph anyway. Fields in the cycle wait on each
///   other until their gate timeout fires and then complete in degraded mode
///   (default behaviour).
/// - `Reject`: refuse to build the graph and report the cycle up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CyclePolicy {
    Degrade,
    Reject,
}

impl Default for CyclePolicy {
    fn default() -> Self {
        CyclePolicy::Degrade
    }
}

impl FromStr for CyclePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "degrade" => Ok(CyclePolicy::Degrade),
            "reject" => Ok(CyclePolicy::Reject),
            other => Err(format!(
                "invalid cycle_policy: {other} (expected \"degrade\" or \"reject\")"
            )),
        }
    }
}

/// When a field with parents calls its resolver relative to its gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOrder {
    /// Resolve while `Running`, then wait for parents (default).
    BeforeParents,
    /// Wait for parents first so the resolver snapshot includes their values.
    AfterParents,
}

impl Default for ResolutionOrder {
    fn default() -> Self {
        ResolutionOrder::BeforeParents
    }
}

impl FromStr for ResolutionOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "before_parents" => Ok(ResolutionOrder::BeforeParents),
            "after_parents" => Ok(ResolutionOrder::AfterParents),
            other => Err(format!(
                "invalid resolution_order: {other} (expected \"before_parents\" or \"after_parents\")"
            )),
        }
    }
}
