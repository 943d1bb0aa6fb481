//! The assembled model - the container the trainer drives.
//!
//! [`SvsModel`] holds the synthesis network plus every optional sub-component
//! as an `Option` field. It is created once per run by
//! [`crate::task::SvsTask::build_model`] and immutable afterwards; the
//! network's learnable state is owned by the training collaborator, not this
//! crate.

use serde::{Deserialize, Serialize};

use crate::config::Conf;
use crate::feats::FeatsExtract;
use crate::normalize::Normalize;
use crate::svs::SvsNetwork;

/// Model-type wrapper selection: continuous features or discrete tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Continuous acoustic-feature targets.
    #[default]
    Svs,
    /// Quantized cluster-index targets.
    DiscreteSvs,
}

impl ModelKind {
    /// Registered label of the wrapper.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Svs => "svs",
            ModelKind::DiscreteSvs => "discrete_svs",
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully assembled SVS model.
#[derive(Debug)]
pub struct SvsModel {
    /// Which wrapper the components were assembled into.
    pub kind: ModelKind,
    /// Size of the resolved token vocabulary.
    pub vocab_size: usize,
    /// Resolved output feature dimensionality.
    pub odim: usize,
    /// Discrete-token layer count (discrete_svs only).
    pub discrete_token_layers: Option<usize>,

    /// Acoustic feature extractor; absent when `odim` was given explicitly
    /// and features come from the data loader.
    pub feats_extract: Option<Box<dyn FeatsExtract>>,
    /// Score feature extractor, also consumed for label/duration alignment.
    pub score_feats_extract: Option<Box<dyn FeatsExtract>>,
    /// Feature normalizer.
    pub normalize: Option<Box<dyn Normalize>>,
    /// The core synthesis network.
    pub svs: Box<dyn SvsNetwork>,
    /// Pitch extractor.
    pub pitch_extract: Option<Box<dyn FeatsExtract>>,
    /// Pitch normalizer.
    pub pitch_normalize: Option<Box<dyn Normalize>>,
    /// Ying extractor.
    pub ying_extract: Option<Box<dyn FeatsExtract>>,
    /// Energy extractor.
    pub energy_extract: Option<Box<dyn FeatsExtract>>,
    /// Energy normalizer.
    pub energy_normalize: Option<Box<dyn Normalize>>,

    /// Keyword configuration forwarded to the wrapper.
    pub model_conf: Conf,
}

impl SvsModel {
    /// Per-slot component labels, `None` for unconfigured optional slots.
    ///
    /// The order matches assembly order, so the summary doubles as an
    /// identity check in tests and as the CLI report.
    pub fn summary(&self) -> Vec<(&'static str, Option<&'static str>)> {
        vec![
            ("feats_extract", self.feats_extract.as_deref().map(|c| c.name())),
            (
                "score_feats_extract",
                self.score_feats_extract.as_deref().map(|c| c.name()),
            ),
            ("normalize", self.normalize.as_deref().map(|c| c.name())),
            ("svs", Some(self.svs.name())),
            ("pitch_extract", self.pitch_extract.as_deref().map(|c| c.name())),
            (
                "pitch_normalize",
                self.pitch_normalize.as_deref().map(|c| c.name()),
            ),
            ("ying_extract", self.ying_extract.as_deref().map(|c| c.name())),
            ("energy_extract", self.energy_extract.as_deref().map(|c| c.name())),
            (
                "energy_normalize",
                self.energy_normalize.as_deref().map(|c| c.name()),
            ),
        ]
    }
}
