//! Score feature extractors: time-aligned musical score information.
//!
//! Registered under the `score_feats_extract` slot. The frame variant aligns
//! score pitch/duration to acoustic frames; the syllable variant keeps one
//! event per syllable.

use serde::{Deserialize, Serialize};

use super::{param, FeatsExtract};

fn default_fs() -> u32 {
    24000
}

fn default_n_fft() -> usize {
    1024
}

fn default_win_length() -> usize {
    512
}

fn default_hop_length() -> usize {
    128
}

fn default_window() -> String {
    "hann".to_string()
}

/// Frame-level score feature extractor configuration (`frame_score_feats`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameScoreFeats {
    /// Sample rate in Hz, inherited from the task config at assembly time.
    #[serde(default = "default_fs")]
    pub fs: u32,
    #[serde(default = "default_n_fft")]
    pub n_fft: usize,
    #[serde(default = "default_win_length")]
    pub win_length: usize,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    #[serde(default = "default_window")]
    pub window: String,
}

impl Default for FrameScoreFeats {
    fn default() -> Self {
        Self {
            fs: default_fs(),
            n_fft: default_n_fft(),
            win_length: default_win_length(),
            hop_length: default_hop_length(),
            window: default_window(),
        }
    }
}

impl FeatsExtract for FrameScoreFeats {
    fn name(&self) -> &'static str {
        "frame_score_feats"
    }

    // One score value per frame.
    fn output_size(&self) -> usize {
        1
    }

    fn parameters(&self) -> serde_yaml::Mapping {
        let mut map = serde_yaml::Mapping::new();
        param(&mut map, "fs", self.fs);
        param(&mut map, "n_fft", self.n_fft);
        param(&mut map, "n_shift", self.hop_length);
        param(&mut map, "win_length", self.win_length);
        param(&mut map, "window", self.window.as_str());
        map
    }
}

/// Syllable-level score feature extractor configuration
/// (`syllable_score_feats`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyllableScoreFeats {
    /// Sample rate in Hz, inherited from the task config at assembly time.
    #[serde(default = "default_fs")]
    pub fs: u32,
    #[serde(default = "default_n_fft")]
    pub n_fft: usize,
    #[serde(default = "default_win_length")]
    pub win_length: usize,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    #[serde(default = "default_window")]
    pub window: String,
}

impl Default for SyllableScoreFeats {
    fn default() -> Self {
        Self {
            fs: default_fs(),
            n_fft: default_n_fft(),
            win_length: default_win_length(),
            hop_length: default_hop_length(),
            window: default_window(),
        }
    }
}

impl FeatsExtract for SyllableScoreFeats {
    fn name(&self) -> &'static str {
        "syllable_score_feats"
    }

    fn output_size(&self) -> usize {
        1
    }

    fn parameters(&self) -> serde_yaml::Mapping {
        let mut map = serde_yaml::Mapping::new();
        param(&mut map, "fs", self.fs);
        param(&mut map, "n_fft", self.n_fft);
        param(&mut map, "n_shift", self.hop_length);
        param(&mut map, "win_length", self.win_length);
        param(&mut map, "window", self.window.as_str());
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::from_conf;

    #[test]
    fn test_frame_score_defaults() {
        let feats = FrameScoreFeats::default();
        assert_eq!(feats.name(), "frame_score_feats");
        assert_eq!(feats.hop_length, 128);
        assert_eq!(feats.output_size(), 1);
    }

    #[test]
    fn test_syllable_score_from_conf() {
        let conf = serde_yaml::from_str("hop_length: 64").unwrap();
        let feats: SyllableScoreFeats = from_conf(&conf).unwrap();
        assert_eq!(feats.hop_length, 64);
        assert_eq!(feats.win_length, 512);
    }
}
