//! Feature normalization components.
//!
//! One implementation is registered today (`global_mvn`), shared by the
//! `normalize`, `pitch_normalize`, and `energy_normalize` slots. Each slot
//! instantiates its own copy with its own statistics file.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Capability contract for normalization slots.
pub trait Normalize: Debug {
    /// Registered label of this implementation.
    fn name(&self) -> &'static str;
}

fn default_true() -> bool {
    true
}

fn default_eps() -> f64 {
    1e-20
}

/// Global mean-variance normalization configuration (`global_mvn`).
///
/// The statistics file is produced by the collect-stats stage of the data
/// pipeline; it is not read at assembly time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalMvn {
    /// Path to the aggregated mean/variance statistics.
    #[serde(default)]
    pub stats_file: Option<String>,
    #[serde(default = "default_true")]
    pub norm_means: bool,
    #[serde(default = "default_true")]
    pub norm_vars: bool,
    #[serde(default = "default_eps")]
    pub eps: f64,
}

impl Default for GlobalMvn {
    fn default() -> Self {
        Self {
            stats_file: None,
            norm_means: true,
            norm_vars: true,
            eps: default_eps(),
        }
    }
}

impl Normalize for GlobalMvn {
    fn name(&self) -> &'static str {
        "global_mvn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::from_conf;

    #[test]
    fn test_global_mvn_defaults() {
        let mvn = GlobalMvn::default();
        assert!(mvn.norm_means);
        assert!(mvn.norm_vars);
        assert_eq!(mvn.eps, 1e-20);
    }

    #[test]
    fn test_global_mvn_from_conf() {
        let conf = serde_yaml::from_str("stats_file: dump/feats_stats.npz\nnorm_vars: false")
            .unwrap();
        let mvn: GlobalMvn = from_conf(&conf).unwrap();
        assert_eq!(mvn.stats_file.as_deref(), Some("dump/feats_stats.npz"));
        assert!(!mvn.norm_vars);
    }
}
