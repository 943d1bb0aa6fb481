//! Vocoder resolution - waveform synthesis back-ends for inference.
//!
//! Without a checkpoint the task falls back to deterministic Griffin-Lim
//! spectrogram inversion, parameterized by the vocoder config file merged
//! with the acoustic extractor's exported parameters. A checkpoint with the
//! recognized extension loads a pretrained neural vocoder bound to a compute
//! device; any other extension is a fatal format error. Missing Griffin-Lim
//! parameters are the one soft failure in the crate: the caller gets
//! `Ok(None)` and a logged warning.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{TaskError, TaskResult};

/// Checkpoint extension produced by the pretrained-vocoder training stack.
const PRETRAINED_EXTENSION: &str = "pkl";

/// Compute device a pretrained vocoder is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl FromStr for Device {
    type Err = TaskError;

    fn from_str(s: &str) -> TaskResult<Self> {
        match s {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda),
            other => Err(TaskError::config(format!(
                "unknown device '{}' (expected cpu or cuda)",
                other
            ))),
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Cuda => f.write_str("cuda"),
        }
    }
}

/// A resolved waveform-synthesis back-end.
#[derive(Debug, Clone, PartialEq)]
pub enum Vocoder {
    /// Deterministic magnitude-spectrogram inversion.
    GriffinLim(GriffinLim),
    /// Pretrained neural vocoder loaded from a checkpoint.
    Pretrained(PretrainedVocoder),
}

impl Vocoder {
    /// Short label for logs and the CLI report.
    pub fn kind(&self) -> &'static str {
        match self {
            Vocoder::GriffinLim(_) => "griffin_lim",
            Vocoder::Pretrained(_) => "pretrained",
        }
    }
}

fn default_n_iter() -> u32 {
    32
}

/// Griffin-Lim spectrogram-inversion parameters.
///
/// `n_fft`, `n_shift`, and `fs` are mandatory; the rest refines the
/// inversion when the extractor exported them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GriffinLim {
    pub n_fft: usize,
    pub n_shift: usize,
    pub fs: u32,
    #[serde(default)]
    pub win_length: Option<usize>,
    #[serde(default)]
    pub window: Option<String>,
    #[serde(default)]
    pub n_mels: Option<usize>,
    #[serde(default)]
    pub fmin: Option<u32>,
    #[serde(default)]
    pub fmax: Option<u32>,
    #[serde(default = "default_n_iter")]
    pub n_iter: u32,
}

/// A pretrained neural vocoder: checkpoint, optional config, target device.
///
/// The checkpoint weights are read by the inference collaborator; resolution
/// here validates the format and binds the device.
#[derive(Debug, Clone, PartialEq)]
pub struct PretrainedVocoder {
    pub checkpoint: PathBuf,
    pub config: Option<PathBuf>,
    pub device: Device,
}

/// Resolve a vocoder from an optional checkpoint, an optional YAML config,
/// and the acoustic extractor's exported parameters.
///
/// `extract_params` is merged over the config file, so extractor-derived
/// values win on conflicts.
pub fn resolve_vocoder(
    vocoder_file: Option<&Path>,
    vocoder_config_file: Option<&Path>,
    extract_params: Option<serde_yaml::Mapping>,
    device: Device,
) -> TaskResult<Option<Vocoder>> {
    info!("vocoder_config_file: {:?}", vocoder_config_file);
    info!("vocoder_file: {:?}", vocoder_file);

    let Some(vocoder_file) = vocoder_file else {
        let mut conf = match vocoder_config_file {
            Some(path) => load_vocoder_conf(path)?,
            None => serde_yaml::Mapping::new(),
        };
        if let Some(params) = extract_params {
            for (key, value) in params {
                conf.insert(key, value);
            }
        }
        let complete = ["n_fft", "n_shift", "fs"]
            .iter()
            .all(|key| conf.contains_key(*key));
        if !complete {
            warn!("Vocoder is not available. Skipped its building.");
            return Ok(None);
        }
        let griffin_lim: GriffinLim =
            serde_yaml::from_value(serde_yaml::Value::Mapping(conf))
                .map_err(|e| TaskError::config(format!("invalid vocoder parameters: {}", e)))?;
        return Ok(Some(Vocoder::GriffinLim(griffin_lim)));
    };

    match vocoder_file.extension().and_then(|e| e.to_str()) {
        Some(PRETRAINED_EXTENSION) => Ok(Some(Vocoder::Pretrained(PretrainedVocoder {
            checkpoint: vocoder_file.to_path_buf(),
            config: vocoder_config_file.map(|p| p.to_path_buf()),
            device,
        }))),
        _ => Err(TaskError::unsupported_format(format!(
            "{} is not a supported format",
            vocoder_file.display()
        ))),
    }
}

fn load_vocoder_conf(path: &Path) -> TaskResult<serde_yaml::Mapping> {
    let text = fs::read_to_string(path)?;
    let value: serde_yaml::Value = serde_yaml::from_str(&text)?;
    match value {
        serde_yaml::Value::Mapping(map) => Ok(map),
        serde_yaml::Value::Null => Ok(serde_yaml::Mapping::new()),
        _ => Err(TaskError::config(format!(
            "vocoder config {} must be a YAML mapping",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feats::{FeatsExtract, LogMelFbank, LogSpectrogram};
    use std::io::Write;

    #[test]
    fn test_griffin_lim_from_fbank_parameters() {
        let fbank = LogMelFbank::default();
        let vocoder = resolve_vocoder(None, None, Some(fbank.parameters()), Device::Cpu)
            .unwrap()
            .unwrap();
        let Vocoder::GriffinLim(gl) = vocoder else {
            panic!("expected griffin-lim");
        };
        assert_eq!(gl.n_fft, 1024);
        assert_eq!(gl.n_shift, 256);
        assert_eq!(gl.fs, 24000);
        assert_eq!(gl.n_mels, Some(80));
        assert_eq!(gl.n_iter, 32);
    }

    #[test]
    fn test_incomplete_parameters_yield_none() {
        // A bare spectrogram exports no fs, so inversion cannot be set up.
        let spec = LogSpectrogram::default();
        let vocoder =
            resolve_vocoder(None, None, Some(spec.parameters()), Device::Cpu).unwrap();
        assert!(vocoder.is_none());
    }

    #[test]
    fn test_config_file_supplies_missing_fs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fs: 22050").unwrap();

        let spec = LogSpectrogram::default();
        let vocoder = resolve_vocoder(
            None,
            Some(file.path()),
            Some(spec.parameters()),
            Device::Cpu,
        )
        .unwrap()
        .unwrap();
        let Vocoder::GriffinLim(gl) = vocoder else {
            panic!("expected griffin-lim");
        };
        assert_eq!(gl.fs, 22050);
    }

    #[test]
    fn test_extractor_parameters_override_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fs: 22050\nn_fft: 2048").unwrap();

        let fbank = LogMelFbank::default();
        let vocoder = resolve_vocoder(
            None,
            Some(file.path()),
            Some(fbank.parameters()),
            Device::Cpu,
        )
        .unwrap()
        .unwrap();
        let Vocoder::GriffinLim(gl) = vocoder else {
            panic!("expected griffin-lim");
        };
        assert_eq!(gl.fs, 24000);
        assert_eq!(gl.n_fft, 1024);
    }

    #[test]
    fn test_pretrained_checkpoint() {
        let vocoder = resolve_vocoder(
            Some(Path::new("exp/vocoder/checkpoint-400000steps.pkl")),
            None,
            None,
            Device::Cuda,
        )
        .unwrap()
        .unwrap();
        let Vocoder::Pretrained(pretrained) = vocoder else {
            panic!("expected pretrained");
        };
        assert_eq!(pretrained.device, Device::Cuda);
        assert!(pretrained.config.is_none());
    }

    #[test]
    fn test_unsupported_extension_is_fatal() {
        let result = resolve_vocoder(
            Some(Path::new("vocoder.onnx")),
            None,
            None,
            Device::Cpu,
        );
        assert!(matches!(result, Err(TaskError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_device_parsing() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Cuda);
        assert!("npu".parse::<Device>().is_err());
    }
}
