//! Pitch, energy, and ying extractors.
//!
//! These auxiliary extractors produce one scalar per model output frame, so
//! their `reduction_factor` must agree with the synthesis network's. The
//! assembler enforces that: an explicit mismatch is fatal, absence inherits
//! the network's value.

use serde::{Deserialize, Serialize};

use super::{param, FeatsExtract};

fn default_fs() -> u32 {
    24000
}

fn default_n_fft() -> usize {
    1024
}

fn default_hop_length() -> usize {
    256
}

fn default_f0min() -> u32 {
    80
}

fn default_f0max() -> u32 {
    400
}

fn default_true() -> bool {
    true
}

fn default_window() -> String {
    "hann".to_string()
}

/// Dio pitch extractor configuration (`dio`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dio {
    /// Sample rate in Hz, inherited from the task config at assembly time.
    #[serde(default = "default_fs")]
    pub fs: u32,
    #[serde(default = "default_n_fft")]
    pub n_fft: usize,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    #[serde(default = "default_f0min")]
    pub f0min: u32,
    #[serde(default = "default_f0max")]
    pub f0max: u32,
    #[serde(default = "default_true")]
    pub use_token_averaged_f0: bool,
    #[serde(default = "default_true")]
    pub use_continuous_f0: bool,
    #[serde(default = "default_true")]
    pub use_log_f0: bool,
    /// Inherited from the synthesis network when absent.
    #[serde(default)]
    pub reduction_factor: Option<usize>,
}

impl Default for Dio {
    fn default() -> Self {
        Self {
            fs: default_fs(),
            n_fft: default_n_fft(),
            hop_length: default_hop_length(),
            f0min: default_f0min(),
            f0max: default_f0max(),
            use_token_averaged_f0: true,
            use_continuous_f0: true,
            use_log_f0: true,
            reduction_factor: None,
        }
    }
}

impl FeatsExtract for Dio {
    fn name(&self) -> &'static str {
        "dio"
    }

    fn output_size(&self) -> usize {
        1
    }

    fn parameters(&self) -> serde_yaml::Mapping {
        let mut map = serde_yaml::Mapping::new();
        param(&mut map, "fs", self.fs);
        param(&mut map, "n_fft", self.n_fft);
        param(&mut map, "n_shift", self.hop_length);
        param(&mut map, "f0min", self.f0min);
        param(&mut map, "f0max", self.f0max);
        map
    }

    fn reduction_factor(&self) -> Option<usize> {
        self.reduction_factor
    }
}

/// Energy extractor configuration (`energy`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Energy {
    /// Sample rate in Hz, inherited from the task config at assembly time.
    #[serde(default = "default_fs")]
    pub fs: u32,
    #[serde(default = "default_n_fft")]
    pub n_fft: usize,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    #[serde(default)]
    pub win_length: Option<usize>,
    #[serde(default = "default_window")]
    pub window: String,
    #[serde(default = "default_true")]
    pub use_token_averaged_energy: bool,
    /// Inherited from the synthesis network when absent.
    #[serde(default)]
    pub reduction_factor: Option<usize>,
}

impl Default for Energy {
    fn default() -> Self {
        Self {
            fs: default_fs(),
            n_fft: default_n_fft(),
            hop_length: default_hop_length(),
            win_length: None,
            window: default_window(),
            use_token_averaged_energy: true,
            reduction_factor: None,
        }
    }
}

impl FeatsExtract for Energy {
    fn name(&self) -> &'static str {
        "energy"
    }

    fn output_size(&self) -> usize {
        1
    }

    fn parameters(&self) -> serde_yaml::Mapping {
        let mut map = serde_yaml::Mapping::new();
        param(&mut map, "fs", self.fs);
        param(&mut map, "n_fft", self.n_fft);
        param(&mut map, "n_shift", self.hop_length);
        if let Some(win_length) = self.win_length {
            param(&mut map, "win_length", win_length);
        }
        param(&mut map, "window", self.window.as_str());
        map
    }

    fn reduction_factor(&self) -> Option<usize> {
        self.reduction_factor
    }
}

fn default_w_step() -> usize {
    256
}

fn default_w() -> usize {
    2048
}

fn default_tau_max() -> usize {
    2048
}

fn default_midi_start() -> i32 {
    -5
}

fn default_midi_end() -> i32 {
    75
}

fn default_octave_range() -> usize {
    24
}

/// Ying pitch-periodicity extractor configuration (`ying`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Ying {
    /// Sample rate in Hz, inherited from the task config at assembly time.
    #[serde(default = "default_fs")]
    pub fs: u32,
    #[serde(default = "default_w_step")]
    pub w_step: usize,
    #[serde(rename = "W", default = "default_w")]
    pub w: usize,
    #[serde(default = "default_tau_max")]
    pub tau_max: usize,
    #[serde(default = "default_midi_start")]
    pub midi_start: i32,
    #[serde(default = "default_midi_end")]
    pub midi_end: i32,
    #[serde(default = "default_octave_range")]
    pub octave_range: usize,
}

impl Default for Ying {
    fn default() -> Self {
        Self {
            fs: default_fs(),
            w_step: default_w_step(),
            w: default_w(),
            tau_max: default_tau_max(),
            midi_start: default_midi_start(),
            midi_end: default_midi_end(),
            octave_range: default_octave_range(),
        }
    }
}

impl FeatsExtract for Ying {
    fn name(&self) -> &'static str {
        "ying"
    }

    // One lag-bin column per midi note in range.
    fn output_size(&self) -> usize {
        (self.midi_end - self.midi_start + 1).max(0) as usize
    }

    fn parameters(&self) -> serde_yaml::Mapping {
        let mut map = serde_yaml::Mapping::new();
        param(&mut map, "fs", self.fs);
        param(&mut map, "w_step", self.w_step);
        param(&mut map, "tau_max", self.tau_max);
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::from_conf;

    #[test]
    fn test_dio_reduction_factor_passthrough() {
        let dio = Dio::default();
        assert_eq!(dio.reduction_factor(), None);

        let conf = serde_yaml::from_str("reduction_factor: 2").unwrap();
        let dio: Dio = from_conf(&conf).unwrap();
        assert_eq!(dio.reduction_factor(), Some(2));
    }

    #[test]
    fn test_energy_defaults() {
        let energy = Energy::default();
        assert_eq!(energy.name(), "energy");
        assert_eq!(energy.output_size(), 1);
        assert!(energy.use_token_averaged_energy);
    }

    #[test]
    fn test_ying_capital_w_alias() {
        let conf = serde_yaml::from_str("W: 1024").unwrap();
        let ying: Ying = from_conf(&conf).unwrap();
        assert_eq!(ying.w, 1024);
        assert_eq!(ying.output_size(), 81);
    }
}
