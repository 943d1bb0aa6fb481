//! Acoustic feature extractors: waveform to spectral representation.
//!
//! Three variants are registered under the `feats_extract` slot. `fbank` is
//! the default and the only one that exports its sample rate, which is why
//! the fallback vocoder can be built without an explicit config for it but
//! not for the spectrogram variants.

use serde::{Deserialize, Serialize};

use super::{param, FeatsExtract};

fn default_n_fft() -> usize {
    1024
}

fn default_hop_length() -> usize {
    256
}

fn default_window() -> String {
    "hann".to_string()
}

fn default_n_mels() -> usize {
    80
}

fn default_fmin() -> u32 {
    80
}

fn default_fmax() -> Option<u32> {
    Some(7600)
}

fn default_fs() -> u32 {
    24000
}

/// Log mel-filterbank extractor configuration (`fbank`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogMelFbank {
    /// Sample rate in Hz, inherited from the task config at assembly time.
    #[serde(default = "default_fs")]
    pub fs: u32,
    #[serde(default = "default_n_fft")]
    pub n_fft: usize,
    #[serde(default)]
    pub win_length: Option<usize>,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    #[serde(default = "default_window")]
    pub window: String,
    #[serde(default = "default_n_mels")]
    pub n_mels: usize,
    #[serde(default = "default_fmin")]
    pub fmin: u32,
    #[serde(default = "default_fmax")]
    pub fmax: Option<u32>,
}

impl Default for LogMelFbank {
    fn default() -> Self {
        Self {
            fs: default_fs(),
            n_fft: default_n_fft(),
            win_length: None,
            hop_length: default_hop_length(),
            window: default_window(),
            n_mels: default_n_mels(),
            fmin: default_fmin(),
            fmax: default_fmax(),
        }
    }
}

impl FeatsExtract for LogMelFbank {
    fn name(&self) -> &'static str {
        "fbank"
    }

    fn output_size(&self) -> usize {
        self.n_mels
    }

    fn parameters(&self) -> serde_yaml::Mapping {
        let mut map = serde_yaml::Mapping::new();
        param(&mut map, "fs", self.fs);
        param(&mut map, "n_mels", self.n_mels);
        param(&mut map, "n_fft", self.n_fft);
        param(&mut map, "n_shift", self.hop_length);
        if let Some(win_length) = self.win_length {
            param(&mut map, "win_length", win_length);
        }
        param(&mut map, "window", self.window.as_str());
        param(&mut map, "fmin", self.fmin);
        if let Some(fmax) = self.fmax {
            param(&mut map, "fmax", fmax);
        }
        map
    }
}

/// Log amplitude spectrogram extractor configuration (`spectrogram`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSpectrogram {
    /// Accepted for slot uniformity; an amplitude spectrogram is otherwise
    /// rate-agnostic.
    #[serde(default = "default_fs")]
    pub fs: u32,
    #[serde(default = "default_n_fft")]
    pub n_fft: usize,
    #[serde(default)]
    pub win_length: Option<usize>,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    #[serde(default = "default_window")]
    pub window: String,
}

impl Default for LogSpectrogram {
    fn default() -> Self {
        Self {
            fs: default_fs(),
            n_fft: default_n_fft(),
            win_length: None,
            hop_length: default_hop_length(),
            window: default_window(),
        }
    }
}

impl FeatsExtract for LogSpectrogram {
    fn name(&self) -> &'static str {
        "spectrogram"
    }

    fn output_size(&self) -> usize {
        self.n_fft / 2 + 1
    }

    // No fs exported: the fallback vocoder must get it from the vocoder
    // config instead.
    fn parameters(&self) -> serde_yaml::Mapping {
        let mut map = serde_yaml::Mapping::new();
        param(&mut map, "n_fft", self.n_fft);
        param(&mut map, "n_shift", self.hop_length);
        if let Some(win_length) = self.win_length {
            param(&mut map, "win_length", win_length);
        }
        param(&mut map, "window", self.window.as_str());
        map
    }
}

/// Linear amplitude spectrogram extractor configuration
/// (`linear_spectrogram`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearSpectrogram {
    /// Accepted for slot uniformity; an amplitude spectrogram is otherwise
    /// rate-agnostic.
    #[serde(default = "default_fs")]
    pub fs: u32,
    #[serde(default = "default_n_fft")]
    pub n_fft: usize,
    #[serde(default)]
    pub win_length: Option<usize>,
    #[serde(default = "default_hop_length")]
    pub hop_length: usize,
    #[serde(default = "default_window")]
    pub window: String,
}

impl Default for LinearSpectrogram {
    fn default() -> Self {
        Self {
            fs: default_fs(),
            n_fft: default_n_fft(),
            win_length: None,
            hop_length: default_hop_length(),
            window: default_window(),
        }
    }
}

impl FeatsExtract for LinearSpectrogram {
    fn name(&self) -> &'static str {
        "linear_spectrogram"
    }

    fn output_size(&self) -> usize {
        self.n_fft / 2 + 1
    }

    fn parameters(&self) -> serde_yaml::Mapping {
        let mut map = serde_yaml::Mapping::new();
        param(&mut map, "n_fft", self.n_fft);
        param(&mut map, "n_shift", self.hop_length);
        if let Some(win_length) = self.win_length {
            param(&mut map, "win_length", win_length);
        }
        param(&mut map, "window", self.window.as_str());
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::from_conf;

    #[test]
    fn test_fbank_output_size_is_n_mels() {
        let fbank = LogMelFbank::default();
        assert_eq!(fbank.output_size(), 80);

        let fbank: LogMelFbank =
            from_conf(&serde_yaml::from_str("n_mels: 120").unwrap()).unwrap();
        assert_eq!(fbank.output_size(), 120);
    }

    #[test]
    fn test_spectrogram_output_size_from_n_fft() {
        let spec = LogSpectrogram::default();
        assert_eq!(spec.output_size(), 513);

        let spec: LinearSpectrogram =
            from_conf(&serde_yaml::from_str("n_fft: 512").unwrap()).unwrap();
        assert_eq!(spec.output_size(), 257);
    }

    #[test]
    fn test_fbank_parameters_carry_fs() {
        let fbank = LogMelFbank::default();
        let params = fbank.parameters();
        assert_eq!(params.get("fs").and_then(|v| v.as_u64()), Some(24000));
        assert_eq!(params.get("n_shift").and_then(|v| v.as_u64()), Some(256));
        assert_eq!(params.get("n_fft").and_then(|v| v.as_u64()), Some(1024));
    }

    #[test]
    fn test_spectrogram_parameters_omit_fs() {
        let spec = LogSpectrogram::default();
        let params = spec.parameters();
        assert!(params.get("fs").is_none());
        assert_eq!(params.get("n_shift").and_then(|v| v.as_u64()), Some(256));
    }

    #[test]
    fn test_unknown_conf_key_is_rejected() {
        let conf = serde_yaml::from_str("n_mel: 80").unwrap();
        assert!(from_conf::<LogMelFbank>(&conf).is_err());
    }
}
