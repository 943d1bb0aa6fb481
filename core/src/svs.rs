//! Synthesis network components - the `svs` registry slot.
//!
//! Seven networks are selectable. Each is a declarative configuration bound
//! to the resolved dimensions at assembly time; the forward math lives in the
//! collaborator training crates. What matters to assembly is the capability
//! contract: input/output sizes, the reduction factor (shared with the
//! time-aligned auxiliary extractors), and for `toksing` the discrete-token
//! layer count.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Dimensions resolved by the assembler before the network is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvsDims {
    /// Input dimensionality (vocabulary size).
    pub idim: usize,
    /// Output dimensionality (acoustic feature dim, or nclusters for the
    /// discrete model type).
    pub odim: usize,
    /// Discrete-token layer count, set only for the discrete model type.
    pub discrete_token_layers: Option<usize>,
}

/// Capability contract for the `svs` slot.
pub trait SvsNetwork: Debug {
    /// Registered label of this implementation.
    fn name(&self) -> &'static str;

    /// Input dimensionality (vocabulary size).
    fn input_size(&self) -> usize;

    /// Output dimensionality.
    fn output_size(&self) -> usize;

    /// Frame-subsampling ratio between feature rate and output rate.
    fn reduction_factor(&self) -> usize {
        1
    }

    /// Discrete-token layer count, for networks that predict token stacks.
    fn discrete_token_layers(&self) -> Option<usize> {
        None
    }
}

fn default_one() -> usize {
    1
}

fn default_midi_dim() -> usize {
    129
}

fn default_embed_dim() -> usize {
    512
}

fn default_dropout() -> f64 {
    0.5
}

// ─────────────────────────────────────────────────────────────────────────────
// naive_rnn / naive_rnn_dp
// ─────────────────────────────────────────────────────────────────────────────

/// Keyword configuration for the plain RNN encoder-decoder (`naive_rnn`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NaiveRnnConfig {
    #[serde(default = "default_midi_dim")]
    pub midi_dim: usize,
    #[serde(default = "default_embed_dim")]
    pub embed_dim: usize,
    #[serde(default = "default_one")]
    pub elayers: usize,
    #[serde(default = "default_eunits")]
    pub eunits: usize,
    #[serde(default = "default_dlayers")]
    pub dlayers: usize,
    #[serde(default = "default_dunits")]
    pub dunits: usize,
    #[serde(default = "default_dropout")]
    pub dropout_rate: f64,
    #[serde(default = "default_one")]
    pub reduction_factor: usize,
}

fn default_eunits() -> usize {
    256
}

fn default_dlayers() -> usize {
    2
}

fn default_dunits() -> usize {
    1024
}

impl Default for NaiveRnnConfig {
    fn default() -> Self {
        Self {
            midi_dim: default_midi_dim(),
            embed_dim: default_embed_dim(),
            elayers: default_one(),
            eunits: default_eunits(),
            dlayers: default_dlayers(),
            dunits: default_dunits(),
            dropout_rate: default_dropout(),
            reduction_factor: default_one(),
        }
    }
}

/// Plain RNN encoder-decoder, the default synthesis network.
#[derive(Debug, Clone)]
pub struct NaiveRnn {
    dims: SvsDims,
    pub conf: NaiveRnnConfig,
}

impl NaiveRnn {
    pub fn new(dims: SvsDims, conf: NaiveRnnConfig) -> Self {
        Self { dims, conf }
    }
}

impl SvsNetwork for NaiveRnn {
    fn name(&self) -> &'static str {
        "naive_rnn"
    }

    fn input_size(&self) -> usize {
        self.dims.idim
    }

    fn output_size(&self) -> usize {
        self.dims.odim
    }

    fn reduction_factor(&self) -> usize {
        self.conf.reduction_factor
    }
}

/// RNN encoder-decoder with an explicit duration predictor (`naive_rnn_dp`).
#[derive(Debug, Clone)]
pub struct NaiveRnnDp {
    dims: SvsDims,
    pub conf: NaiveRnnDpConfig,
}

/// Keyword configuration for `naive_rnn_dp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NaiveRnnDpConfig {
    #[serde(default = "default_midi_dim")]
    pub midi_dim: usize,
    #[serde(default = "default_embed_dim")]
    pub embed_dim: usize,
    #[serde(default = "default_one")]
    pub elayers: usize,
    #[serde(default = "default_eunits")]
    pub eunits: usize,
    #[serde(default = "default_dlayers")]
    pub dlayers: usize,
    #[serde(default = "default_dunits")]
    pub dunits: usize,
    #[serde(default = "default_duration_layers")]
    pub duration_predictor_layers: usize,
    #[serde(default = "default_duration_chans")]
    pub duration_predictor_chans: usize,
    #[serde(default = "default_dropout")]
    pub dropout_rate: f64,
    #[serde(default = "default_one")]
    pub reduction_factor: usize,
}

fn default_duration_layers() -> usize {
    2
}

fn default_duration_chans() -> usize {
    384
}

impl Default for NaiveRnnDpConfig {
    fn default() -> Self {
        Self {
            midi_dim: default_midi_dim(),
            embed_dim: default_embed_dim(),
            elayers: default_one(),
            eunits: default_eunits(),
            dlayers: default_dlayers(),
            dunits: default_dunits(),
            duration_predictor_layers: default_duration_layers(),
            duration_predictor_chans: default_duration_chans(),
            dropout_rate: default_dropout(),
            reduction_factor: default_one(),
        }
    }
}

impl NaiveRnnDp {
    pub fn new(dims: SvsDims, conf: NaiveRnnDpConfig) -> Self {
        Self { dims, conf }
    }
}

impl SvsNetwork for NaiveRnnDp {
    fn name(&self) -> &'static str {
        "naive_rnn_dp"
    }

    fn input_size(&self) -> usize {
        self.dims.idim
    }

    fn output_size(&self) -> usize {
        self.dims.odim
    }

    fn reduction_factor(&self) -> usize {
        self.conf.reduction_factor
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// xiaoice
// ─────────────────────────────────────────────────────────────────────────────

/// Keyword configuration for the XiaoiceSing transformer (`xiaoice`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct XiaoiceConfig {
    #[serde(default = "default_adim")]
    pub adim: usize,
    #[serde(default = "default_aheads")]
    pub aheads: usize,
    #[serde(default = "default_transformer_layers")]
    pub elayers: usize,
    #[serde(default = "default_transformer_units")]
    pub eunits: usize,
    #[serde(default = "default_transformer_layers")]
    pub dlayers: usize,
    #[serde(default = "default_transformer_units")]
    pub dunits: usize,
    #[serde(default = "default_postnet_layers")]
    pub postnet_layers: usize,
    #[serde(default = "default_loss_type")]
    pub loss_type: String,
    #[serde(default = "default_one")]
    pub reduction_factor: usize,
}

fn default_adim() -> usize {
    384
}

fn default_aheads() -> usize {
    4
}

fn default_transformer_layers() -> usize {
    6
}

fn default_transformer_units() -> usize {
    1536
}

fn default_postnet_layers() -> usize {
    5
}

fn default_loss_type() -> String {
    "L1".to_string()
}

impl Default for XiaoiceConfig {
    fn default() -> Self {
        Self {
            adim: default_adim(),
            aheads: default_aheads(),
            elayers: default_transformer_layers(),
            eunits: default_transformer_units(),
            dlayers: default_transformer_layers(),
            dunits: default_transformer_units(),
            postnet_layers: default_postnet_layers(),
            loss_type: default_loss_type(),
            reduction_factor: default_one(),
        }
    }
}

/// XiaoiceSing-style transformer network.
#[derive(Debug, Clone)]
pub struct XiaoiceSing {
    dims: SvsDims,
    pub conf: XiaoiceConfig,
}

impl XiaoiceSing {
    pub fn new(dims: SvsDims, conf: XiaoiceConfig) -> Self {
        Self { dims, conf }
    }
}

impl SvsNetwork for XiaoiceSing {
    fn name(&self) -> &'static str {
        "xiaoice"
    }

    fn input_size(&self) -> usize {
        self.dims.idim
    }

    fn output_size(&self) -> usize {
        self.dims.odim
    }

    fn reduction_factor(&self) -> usize {
        self.conf.reduction_factor
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// toksing (discrete tokens)
// ─────────────────────────────────────────────────────────────────────────────

/// Keyword configuration for the discrete-token network (`toksing`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokSingConfig {
    #[serde(default = "default_adim")]
    pub adim: usize,
    #[serde(default = "default_transformer_layers")]
    pub elayers: usize,
    #[serde(default = "default_transformer_layers")]
    pub dlayers: usize,
    #[serde(default = "default_postnet_layers")]
    pub postnet_layers: usize,
    #[serde(default = "default_one")]
    pub reduction_factor: usize,
}

impl Default for TokSingConfig {
    fn default() -> Self {
        Self {
            adim: default_adim(),
            elayers: default_transformer_layers(),
            dlayers: default_transformer_layers(),
            postnet_layers: default_postnet_layers(),
            reduction_factor: default_one(),
        }
    }
}

/// Discrete-token synthesis network: predicts quantized cluster indices
/// instead of continuous features.
#[derive(Debug, Clone)]
pub struct TokSing {
    dims: SvsDims,
    pub conf: TokSingConfig,
}

impl TokSing {
    pub fn new(dims: SvsDims, conf: TokSingConfig) -> Self {
        Self { dims, conf }
    }
}

impl SvsNetwork for TokSing {
    fn name(&self) -> &'static str {
        "toksing"
    }

    fn input_size(&self) -> usize {
        self.dims.idim
    }

    fn output_size(&self) -> usize {
        self.dims.odim
    }

    fn reduction_factor(&self) -> usize {
        self.conf.reduction_factor
    }

    fn discrete_token_layers(&self) -> Option<usize> {
        self.dims.discrete_token_layers
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// vits / joint_score2wav
// ─────────────────────────────────────────────────────────────────────────────

/// Keyword configuration for the end-to-end adversarial network (`vits`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VitsConfig {
    #[serde(default = "default_hidden_channels")]
    pub hidden_channels: usize,
    #[serde(default = "default_segment_size")]
    pub segment_size: usize,
    #[serde(default = "default_generator_type")]
    pub generator_type: String,
    #[serde(default = "default_flow_layers")]
    pub flow_layers: usize,
}

fn default_hidden_channels() -> usize {
    192
}

fn default_segment_size() -> usize {
    32
}

fn default_generator_type() -> String {
    "visinger".to_string()
}

fn default_flow_layers() -> usize {
    4
}

impl Default for VitsConfig {
    fn default() -> Self {
        Self {
            hidden_channels: default_hidden_channels(),
            segment_size: default_segment_size(),
            generator_type: default_generator_type(),
            flow_layers: default_flow_layers(),
        }
    }
}

/// End-to-end variational adversarial network. Operates at frame rate, so
/// the reduction factor is fixed at 1.
#[derive(Debug, Clone)]
pub struct Vits {
    dims: SvsDims,
    pub conf: VitsConfig,
}

impl Vits {
    pub fn new(dims: SvsDims, conf: VitsConfig) -> Self {
        Self { dims, conf }
    }
}

impl SvsNetwork for Vits {
    fn name(&self) -> &'static str {
        "vits"
    }

    fn input_size(&self) -> usize {
        self.dims.idim
    }

    fn output_size(&self) -> usize {
        self.dims.odim
    }
}

/// Keyword configuration for the joint score-to-waveform network
/// (`joint_score2wav`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JointScore2WavConfig {
    #[serde(default = "default_score2mel_type")]
    pub score2mel_type: String,
    #[serde(default = "default_vocoder_type")]
    pub vocoder_type: String,
    #[serde(default = "default_segment_size")]
    pub segment_size: usize,
}

fn default_score2mel_type() -> String {
    "xiaoice".to_string()
}

fn default_vocoder_type() -> String {
    "hifigan_generator".to_string()
}

impl Default for JointScore2WavConfig {
    fn default() -> Self {
        Self {
            score2mel_type: default_score2mel_type(),
            vocoder_type: default_vocoder_type(),
            segment_size: default_segment_size(),
        }
    }
}

/// Jointly trained score-to-mel plus neural vocoder.
#[derive(Debug, Clone)]
pub struct JointScore2Wav {
    dims: SvsDims,
    pub conf: JointScore2WavConfig,
}

impl JointScore2Wav {
    pub fn new(dims: SvsDims, conf: JointScore2WavConfig) -> Self {
        Self { dims, conf }
    }
}

impl SvsNetwork for JointScore2Wav {
    fn name(&self) -> &'static str {
        "joint_score2wav"
    }

    fn input_size(&self) -> usize {
        self.dims.idim
    }

    fn output_size(&self) -> usize {
        self.dims.odim
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// singing_tacotron
// ─────────────────────────────────────────────────────────────────────────────

/// Keyword configuration for the attention-based network (`singing_tacotron`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SingingTacotronConfig {
    #[serde(default = "default_embed_dim")]
    pub embed_dim: usize,
    #[serde(default = "default_one")]
    pub elayers: usize,
    #[serde(default = "default_tacotron_eunits")]
    pub eunits: usize,
    #[serde(default = "default_dlayers")]
    pub dlayers: usize,
    #[serde(default = "default_dunits")]
    pub dunits: usize,
    #[serde(default = "default_atype")]
    pub atype: String,
    #[serde(default = "default_adim_tacotron")]
    pub adim: usize,
    #[serde(default = "default_dropout")]
    pub dropout_rate: f64,
    #[serde(default = "default_one")]
    pub reduction_factor: usize,
}

fn default_tacotron_eunits() -> usize {
    512
}

fn default_atype() -> String {
    "GDCA".to_string()
}

fn default_adim_tacotron() -> usize {
    512
}

impl Default for SingingTacotronConfig {
    fn default() -> Self {
        Self {
            embed_dim: default_embed_dim(),
            elayers: default_one(),
            eunits: default_tacotron_eunits(),
            dlayers: default_dlayers(),
            dunits: default_dunits(),
            atype: default_atype(),
            adim: default_adim_tacotron(),
            dropout_rate: default_dropout(),
            reduction_factor: default_one(),
        }
    }
}

/// Attention-based encoder-decoder in the tacotron style.
#[derive(Debug, Clone)]
pub struct SingingTacotron {
    dims: SvsDims,
    pub conf: SingingTacotronConfig,
}

impl SingingTacotron {
    pub fn new(dims: SvsDims, conf: SingingTacotronConfig) -> Self {
        Self { dims, conf }
    }
}

impl SvsNetwork for SingingTacotron {
    fn name(&self) -> &'static str {
        "singing_tacotron"
    }

    fn input_size(&self) -> usize {
        self.dims.idim
    }

    fn output_size(&self) -> usize {
        self.dims.odim
    }

    fn reduction_factor(&self) -> usize {
        self.conf.reduction_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::from_conf;

    fn dims() -> SvsDims {
        SvsDims {
            idim: 40,
            odim: 80,
            discrete_token_layers: None,
        }
    }

    #[test]
    fn test_naive_rnn_carries_dims() {
        let net = NaiveRnn::new(dims(), NaiveRnnConfig::default());
        assert_eq!(net.input_size(), 40);
        assert_eq!(net.output_size(), 80);
        assert_eq!(net.reduction_factor(), 1);
    }

    #[test]
    fn test_xiaoice_reduction_factor_from_conf() {
        let conf = serde_yaml::from_str("reduction_factor: 3").unwrap();
        let net = XiaoiceSing::new(dims(), from_conf(&conf).unwrap());
        assert_eq!(net.reduction_factor(), 3);
    }

    #[test]
    fn test_vits_reduction_factor_fixed() {
        let net = Vits::new(dims(), VitsConfig::default());
        assert_eq!(net.reduction_factor(), 1);
    }

    #[test]
    fn test_toksing_discrete_layers() {
        let d = SvsDims {
            idim: 40,
            odim: 1024,
            discrete_token_layers: Some(3),
        };
        let net = TokSing::new(d, TokSingConfig::default());
        assert_eq!(net.discrete_token_layers(), Some(3));
        assert_eq!(net.output_size(), 1024);
    }
}
