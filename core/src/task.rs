//! The SVS task - registries plus the assembly routines.
//!
//! [`SvsTask`] is the composition root: it declares which implementations
//! are selectable per slot and turns a validated [`TaskConfig`] into an
//! assembled [`SvsModel`], a preprocessor, a collator, and (optionally) a
//! vocoder. Assembly is one-shot and synchronous; the only I/O is the
//! token-list read and the optional vocoder config read.

use std::path::Path;

use log::info;

use crate::collate::CollateFn;
use crate::config::{base_options, conf_set_u64, conf_u64, from_conf, Conf, OptionSpec, TaskConfig};
use crate::error::{TaskError, TaskResult};
use crate::feats::{
    Dio, Energy, FeatsExtract, FrameScoreFeats, LinearSpectrogram, LogMelFbank, LogSpectrogram,
    SyllableScoreFeats, Ying,
};
use crate::model::{ModelKind, SvsModel};
use crate::normalize::{GlobalMvn, Normalize};
use crate::preprocess::SvsPreprocessor;
use crate::registry::ComponentRegistry;
use crate::svs::{
    JointScore2Wav, NaiveRnn, NaiveRnnDp, SingingTacotron, SvsDims, SvsNetwork, TokSing, Vits,
    XiaoiceSing,
};
use crate::vocoder::{resolve_vocoder, Device, Vocoder};

type FeatsRegistry = ComponentRegistry<Box<dyn FeatsExtract>>;
type NormalizeRegistry = ComponentRegistry<Box<dyn Normalize>>;
type SvsRegistry = ComponentRegistry<Box<dyn SvsNetwork>, SvsDims>;

fn build_fbank(_: &(), conf: &Conf) -> TaskResult<Box<dyn FeatsExtract>> {
    Ok(Box::new(from_conf::<LogMelFbank>(conf)?))
}

fn build_spectrogram(_: &(), conf: &Conf) -> TaskResult<Box<dyn FeatsExtract>> {
    Ok(Box::new(from_conf::<LogSpectrogram>(conf)?))
}

fn build_linear_spectrogram(_: &(), conf: &Conf) -> TaskResult<Box<dyn FeatsExtract>> {
    Ok(Box::new(from_conf::<LinearSpectrogram>(conf)?))
}

fn build_frame_score_feats(_: &(), conf: &Conf) -> TaskResult<Box<dyn FeatsExtract>> {
    Ok(Box::new(from_conf::<FrameScoreFeats>(conf)?))
}

fn build_syllable_score_feats(_: &(), conf: &Conf) -> TaskResult<Box<dyn FeatsExtract>> {
    Ok(Box::new(from_conf::<SyllableScoreFeats>(conf)?))
}

fn build_dio(_: &(), conf: &Conf) -> TaskResult<Box<dyn FeatsExtract>> {
    Ok(Box::new(from_conf::<Dio>(conf)?))
}

fn build_energy(_: &(), conf: &Conf) -> TaskResult<Box<dyn FeatsExtract>> {
    Ok(Box::new(from_conf::<Energy>(conf)?))
}

fn build_ying(_: &(), conf: &Conf) -> TaskResult<Box<dyn FeatsExtract>> {
    Ok(Box::new(from_conf::<Ying>(conf)?))
}

fn build_global_mvn(_: &(), conf: &Conf) -> TaskResult<Box<dyn Normalize>> {
    Ok(Box::new(from_conf::<GlobalMvn>(conf)?))
}

fn build_naive_rnn(dims: &SvsDims, conf: &Conf) -> TaskResult<Box<dyn SvsNetwork>> {
    Ok(Box::new(NaiveRnn::new(*dims, from_conf(conf)?)))
}

fn build_naive_rnn_dp(dims: &SvsDims, conf: &Conf) -> TaskResult<Box<dyn SvsNetwork>> {
    Ok(Box::new(NaiveRnnDp::new(*dims, from_conf(conf)?)))
}

fn build_xiaoice(dims: &SvsDims, conf: &Conf) -> TaskResult<Box<dyn SvsNetwork>> {
    Ok(Box::new(XiaoiceSing::new(*dims, from_conf(conf)?)))
}

fn build_toksing(dims: &SvsDims, conf: &Conf) -> TaskResult<Box<dyn SvsNetwork>> {
    Ok(Box::new(TokSing::new(*dims, from_conf(conf)?)))
}

fn build_vits(dims: &SvsDims, conf: &Conf) -> TaskResult<Box<dyn SvsNetwork>> {
    Ok(Box::new(Vits::new(*dims, from_conf(conf)?)))
}

fn build_joint_score2wav(dims: &SvsDims, conf: &Conf) -> TaskResult<Box<dyn SvsNetwork>> {
    Ok(Box::new(JointScore2Wav::new(*dims, from_conf(conf)?)))
}

fn build_singing_tacotron(dims: &SvsDims, conf: &Conf) -> TaskResult<Box<dyn SvsNetwork>> {
    Ok(Box::new(SingingTacotron::new(*dims, from_conf(conf)?)))
}

/// The singing-voice-synthesis task.
pub struct SvsTask;

impl SvsTask {
    /// Registry for the `feats_extract` slot.
    pub fn feats_registry() -> FeatsRegistry {
        ComponentRegistry::new("feats_extract", false)
            .register("fbank", build_fbank)
            .register("spectrogram", build_spectrogram)
            .register("linear_spectrogram", build_linear_spectrogram)
            .with_default("fbank")
    }

    /// Registry for the `score_feats_extract` slot.
    pub fn score_feats_registry() -> FeatsRegistry {
        ComponentRegistry::new("score_feats_extract", false)
            .register("frame_score_feats", build_frame_score_feats)
            .register("syllable_score_feats", build_syllable_score_feats)
            .with_default("frame_score_feats")
    }

    /// Registry for the `pitch_extract` slot.
    pub fn pitch_registry() -> FeatsRegistry {
        ComponentRegistry::new("pitch_extract", true).register("dio", build_dio)
    }

    /// Registry for the `energy_extract` slot.
    pub fn energy_registry() -> FeatsRegistry {
        ComponentRegistry::new("energy_extract", true).register("energy", build_energy)
    }

    /// Registry for the `ying_extract` slot.
    pub fn ying_registry() -> FeatsRegistry {
        ComponentRegistry::new("ying_extract", true).register("ying", build_ying)
    }

    /// Registry for the `normalize` slot.
    pub fn normalize_registry() -> NormalizeRegistry {
        ComponentRegistry::new("normalize", true)
            .register("global_mvn", build_global_mvn)
            .with_default("global_mvn")
    }

    /// Registry for the `pitch_normalize` slot.
    pub fn pitch_normalize_registry() -> NormalizeRegistry {
        ComponentRegistry::new("pitch_normalize", true).register("global_mvn", build_global_mvn)
    }

    /// Registry for the `energy_normalize` slot.
    pub fn energy_normalize_registry() -> NormalizeRegistry {
        ComponentRegistry::new("energy_normalize", true).register("global_mvn", build_global_mvn)
    }

    /// Registry for the `svs` slot.
    pub fn svs_registry() -> SvsRegistry {
        ComponentRegistry::new("svs", false)
            .register("naive_rnn", build_naive_rnn)
            .register("naive_rnn_dp", build_naive_rnn_dp)
            .register("xiaoice", build_xiaoice)
            .register("toksing", build_toksing)
            .register("vits", build_vits)
            .register("joint_score2wav", build_joint_score2wav)
            .register("singing_tacotron", build_singing_tacotron)
            .with_default("naive_rnn")
    }

    /// Enumerate the full configuration surface (for `cantus options`).
    ///
    /// Slot entries are derived from the registries, so the listing tracks
    /// what is actually selectable.
    pub fn describe_options() -> Vec<OptionSpec> {
        let mut options = base_options();
        options.push(Self::score_feats_registry().option_spec("Score feature extractor"));
        options.push(Self::feats_registry().option_spec("Acoustic feature extractor"));
        options.push(Self::normalize_registry().option_spec("Feature normalizer"));
        options.push(Self::svs_registry().option_spec("Synthesis network"));
        options.push(Self::pitch_registry().option_spec("Pitch extractor"));
        options.push(Self::pitch_normalize_registry().option_spec("Pitch normalizer"));
        options.push(Self::ying_registry().option_spec("Ying extractor"));
        options.push(Self::energy_registry().option_spec("Energy extractor"));
        options.push(Self::energy_normalize_registry().option_spec("Energy normalizer"));
        options.push(OptionSpec {
            name: "model_type",
            default: ModelKind::Svs.as_str().to_string(),
            help: "Model-type wrapper (choose from: svs, discrete_svs)".to_string(),
            required: false,
        });
        options
    }

    /// Fields the data pipeline must supply.
    pub fn required_data_names(inference: bool) -> &'static [&'static str] {
        if inference {
            &["text", "score", "label"]
        } else {
            &["text", "singing", "score", "label"]
        }
    }

    /// Fields the data pipeline may supply.
    pub fn optional_data_names(inference: bool) -> &'static [&'static str] {
        if inference {
            &[
                "spembs",
                "singing",
                "pitch",
                "durations",
                "sids",
                "lids",
                "discrete_token",
            ]
        } else {
            &[
                "spembs",
                "durations",
                "pitch",
                "energy",
                "sids",
                "lids",
                "feats",
                "ying",
                "discrete_token",
            ]
        }
    }

    /// Build the fixed collation strategy.
    ///
    /// The strategy does not depend on the train/inference mode today; the
    /// flag stays in the signature because it is part of the task contract.
    pub fn build_collate_fn(_config: &TaskConfig, _train: bool) -> CollateFn {
        CollateFn::new(0.0, 0, &["spembs", "sids", "lids"])
    }

    /// Build the text/label preprocessor, or `None` when preprocessing is
    /// disabled.
    pub fn build_preprocess_fn(
        config: &TaskConfig,
        train: bool,
    ) -> TaskResult<Option<SvsPreprocessor>> {
        if !config.use_preprocessor {
            return Ok(None);
        }
        let tokens = config.resolve_token_list()?;
        let hop_length = conf_u64(&config.feats_extract_conf, "hop_length")
            .map(|v| v as usize)
            .unwrap_or(256);
        let preprocessor = SvsPreprocessor::new(config, tokens, train, hop_length)?;
        Ok(Some(preprocessor))
    }

    /// Assemble the model from a resolved configuration.
    ///
    /// Returns the model together with a fresh config snapshot in which the
    /// vocabulary is inlined (the portable form for persisting alongside the
    /// run).
    pub fn build_model(config: &TaskConfig) -> TaskResult<(SvsModel, TaskConfig)> {
        config.validate()?;

        // 1. Token vocabulary, normalized into the snapshot for portability.
        let token_list = config.resolve_token_list()?;
        let vocab_size = token_list.len();
        info!("Vocabulary size: {}", vocab_size);
        let snapshot = config.with_inline_token_list(token_list);

        // 2. Output dimensionality: explicit, or derived from the acoustic
        // extractor.
        let (feats_extract, mut odim) = match config.odim {
            Some(odim) => (None, odim),
            None => {
                let label = config.feats_extract.as_deref().ok_or_else(|| {
                    TaskError::config("either odim or feats_extract must be configured")
                })?;
                let mut conf = config.feats_extract_conf.clone();
                conf_set_u64(&mut conf, "fs", config.fs as u64);
                let extract = Self::feats_registry().build(label, &(), &conf)?;
                let odim = extract.output_size();
                (Some(extract), odim)
            }
        };

        // 3. Discrete variant overrides the target dimensionality with the
        // cluster count.
        let discrete_token_layers = match config.model_type {
            ModelKind::DiscreteSvs => {
                odim = config.nclusters;
                Some(config.discrete_token_layers)
            }
            ModelKind::Svs => None,
        };

        // 4. Normalizer.
        let normalize = match config.normalize.as_deref() {
            Some(label) => Some(Self::normalize_registry().build(
                label,
                &(),
                &config.normalize_conf,
            )?),
            None => None,
        };

        // 5. Synthesis network.
        let dims = SvsDims {
            idim: vocab_size,
            odim,
            discrete_token_layers,
        };
        let svs = Self::svs_registry().build(&config.svs, &dims, &config.svs_conf)?;

        // 6. Auxiliary extractors. Pitch and energy must share the network's
        // reduction factor; unset confs inherit it.
        let score_feats_extract = match config.score_feats_extract.as_deref() {
            Some(label) => {
                let mut conf = config.score_feats_extract_conf.clone();
                conf_set_u64(&mut conf, "fs", config.fs as u64);
                Some(Self::score_feats_registry().build(label, &(), &conf)?)
            }
            None => None,
        };
        let pitch_extract = match config.pitch_extract.as_deref() {
            Some(label) => {
                let conf = Self::aligned_conf(
                    "pitch_extract",
                    &config.pitch_extract_conf,
                    svs.reduction_factor(),
                    config.fs,
                )?;
                Some(Self::pitch_registry().build(label, &(), &conf)?)
            }
            None => None,
        };
        let ying_extract = match config.ying_extract.as_deref() {
            Some(label) => {
                let mut conf = config.ying_extract_conf.clone();
                conf_set_u64(&mut conf, "fs", config.fs as u64);
                Some(Self::ying_registry().build(label, &(), &conf)?)
            }
            None => None,
        };
        let energy_extract = match config.energy_extract.as_deref() {
            Some(label) => {
                let conf = Self::aligned_conf(
                    "energy_extract",
                    &config.energy_extract_conf,
                    svs.reduction_factor(),
                    config.fs,
                )?;
                Some(Self::energy_registry().build(label, &(), &conf)?)
            }
            None => None,
        };

        // 7. Auxiliary normalizers.
        let pitch_normalize = match config.pitch_normalize.as_deref() {
            Some(label) => Some(Self::pitch_normalize_registry().build(
                label,
                &(),
                &config.pitch_normalize_conf,
            )?),
            None => None,
        };
        let energy_normalize = match config.energy_normalize.as_deref() {
            Some(label) => Some(Self::energy_normalize_registry().build(
                label,
                &(),
                &config.energy_normalize_conf,
            )?),
            None => None,
        };

        // 8. Wrap.
        let model = SvsModel {
            kind: config.model_type,
            vocab_size,
            odim,
            discrete_token_layers,
            feats_extract,
            score_feats_extract,
            normalize,
            svs,
            pitch_extract,
            pitch_normalize,
            ying_extract,
            energy_extract,
            energy_normalize,
            model_conf: config.model_conf.clone(),
        };
        Ok((model, snapshot))
    }

    /// Resolve a vocoder for an assembled model.
    ///
    /// See [`crate::vocoder::resolve_vocoder`] for the selection rules; this
    /// wrapper contributes the model's acoustic-extractor parameters.
    pub fn build_vocoder_from_file(
        vocoder_config_file: Option<&Path>,
        vocoder_file: Option<&Path>,
        model: &SvsModel,
        device: Device,
    ) -> TaskResult<Option<Vocoder>> {
        let extract_params = model.feats_extract.as_deref().map(|e| e.parameters());
        resolve_vocoder(vocoder_file, vocoder_config_file, extract_params, device)
    }

    // Check or inherit the reduction factor, and inject the task sample rate.
    fn aligned_conf(
        slot: &str,
        conf: &Conf,
        svs_reduction_factor: usize,
        fs: u32,
    ) -> TaskResult<Conf> {
        let mut conf = conf.clone();
        match conf.get("reduction_factor") {
            Some(value) => {
                let factor = value.as_u64().filter(|f| *f > 0).ok_or_else(|| {
                    TaskError::config(format!(
                        "{} reduction_factor must be a positive integer",
                        slot
                    ))
                })?;
                if factor as usize != svs_reduction_factor {
                    return Err(TaskError::inconsistent(format!(
                        "{} reduction_factor {} conflicts with svs reduction_factor {}",
                        slot, factor, svs_reduction_factor
                    )));
                }
            }
            None => conf_set_u64(&mut conf, "reduction_factor", svs_reduction_factor as u64),
        }
        conf_set_u64(&mut conf, "fs", fs as u64);
        Ok(conf)
    }
}
