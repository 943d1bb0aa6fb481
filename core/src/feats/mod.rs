//! Feature extractor components.
//!
//! Extractors convert raw waveform (or score/label streams) into the
//! time-aligned representations the synthesis network trains on. This crate
//! assembles them; the DSP kernels themselves live in collaborator crates.
//! The capability contract of every extractor slot is [`FeatsExtract`]:
//! declared output dimensionality, exported construction parameters (used to
//! parameterize the fallback vocoder), and an optional reduction factor that
//! must stay in lockstep with the synthesis network.
//!
//! | Module | Components |
//! |--------|-----------|
//! | [`acoustic`] | fbank, spectrogram, linear_spectrogram |
//! | [`score`] | frame_score_feats, syllable_score_feats |
//! | [`pitch`] | dio, energy, ying |

use std::fmt::Debug;

mod acoustic;
mod pitch;
mod score;

pub use acoustic::{LinearSpectrogram, LogMelFbank, LogSpectrogram};
pub use pitch::{Dio, Energy, Ying};
pub use score::{FrameScoreFeats, SyllableScoreFeats};

/// Capability contract for every feature extractor slot.
pub trait FeatsExtract: Debug {
    /// Registered label of this implementation.
    fn name(&self) -> &'static str;

    /// Dimensionality of the extracted feature per frame.
    fn output_size(&self) -> usize;

    /// Construction parameters, exported for vocoder parameterization.
    ///
    /// Keys follow the waveform-reconstruction naming (`n_fft`, `n_shift`,
    /// `fs`, ...); extractors that do not know their sample rate simply omit
    /// `fs`.
    fn parameters(&self) -> serde_yaml::Mapping;

    /// Frame-subsampling ratio relative to the synthesis network output,
    /// for extractors that are time-aligned with it.
    fn reduction_factor(&self) -> Option<usize> {
        None
    }
}

pub(crate) fn param(map: &mut serde_yaml::Mapping, key: &str, value: impl Into<serde_yaml::Value>) {
    map.insert(serde_yaml::Value::String(key.to_string()), value.into());
}
