//! Task configuration - the resolved option surface for an SVS training run.
//!
//! [`TaskConfig`] is the flat set of named options that selects one
//! implementation per registry slot and supplies its keyword configuration.
//! It is parsed from YAML, validated once, and treated as immutable: the only
//! "mutation" in the crate is [`TaskConfig::with_inline_token_list`], which
//! returns a fresh snapshot with the vocabulary inlined so the persisted
//! config stays portable across machines.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{TaskError, TaskResult};
use crate::model::ModelKind;

/// Keyword configuration for a single component (a YAML mapping).
///
/// Component constructors deserialize this into their own config struct, so
/// unknown slots stay schema-free at the task level.
pub type Conf = serde_yaml::Value;

/// An empty keyword configuration.
pub fn empty_conf() -> Conf {
    Conf::Mapping(serde_yaml::Mapping::new())
}

/// Deserialize a component keyword configuration into its config struct.
///
/// A null/absent conf yields the component defaults.
pub fn from_conf<T: DeserializeOwned + Default>(conf: &Conf) -> TaskResult<T> {
    if conf.is_null() {
        return Ok(T::default());
    }
    serde_yaml::from_value(conf.clone())
        .map_err(|e| TaskError::config(format!("invalid component configuration: {}", e)))
}

/// Read an unsigned integer entry from a keyword configuration.
pub fn conf_u64(conf: &Conf, key: &str) -> Option<u64> {
    conf.get(key).and_then(|v| v.as_u64())
}

/// Set an entry in a keyword configuration, overwriting any existing value.
///
/// A null conf is promoted to an empty mapping first.
pub fn conf_set(conf: &mut Conf, key: &str, value: Conf) {
    if conf.is_null() {
        *conf = empty_conf();
    }
    if let Conf::Mapping(map) = conf {
        map.insert(Conf::String(key.to_string()), value);
    }
}

/// Set an unsigned integer entry in a keyword configuration.
pub fn conf_set_u64(conf: &mut Conf, key: &str, value: u64) {
    conf_set(conf, key, Conf::Number(serde_yaml::Number::from(value)));
}

/// Source of the token vocabulary: a file path (one token per line) or an
/// already-materialized list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenListSource {
    /// Path to a plain-text token list, one token per line, order-significant.
    File(String),
    /// Inline ordered token list (the normalized, portable form).
    Inline(Vec<String>),
}

/// Tokenization level applied by the preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Sentencepiece byte-pair-encoding pieces
    Bpe,
    /// Individual characters
    Char,
    /// Whitespace-separated words
    Word,
    /// Phoneme symbols
    #[default]
    Phn,
}

/// Text cleaning method applied before tokenization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanerType {
    /// English normalization in the tacotron style (lowercase, collapse
    /// whitespace, strip non-linguistic punctuation)
    Tacotron,
    /// Japanese kana normalization
    Jaconv,
    /// Vietnamese diacritic normalization
    Vietnamese,
}

/// Grapheme-to-phoneme backend, applied when `token_type = phn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum G2pType {
    G2pEn,
    G2pEnNoSpace,
    Pyopenjtalk,
    PyopenjtalkKana,
    PyopenjtalkAccent,
    PyopenjtalkAccentWithPause,
    PypinyinG2p,
    PypinyinG2pPhone,
    PypinyinG2pPhoneWithoutProsody,
    EspeakNgArabic,
}

fn default_true() -> bool {
    true
}

fn default_fs() -> u32 {
    24000
}

fn default_discrete_token_layers() -> usize {
    1
}

fn default_nclusters() -> usize {
    1024
}

fn default_score_feats_extract() -> Option<String> {
    Some("frame_score_feats".to_string())
}

fn default_feats_extract() -> Option<String> {
    Some("fbank".to_string())
}

fn default_normalize() -> Option<String> {
    Some("global_mvn".to_string())
}

fn default_svs() -> String {
    "naive_rnn".to_string()
}

/// Complete resolved configuration for an SVS task.
///
/// Every registry slot appears as a `<slot>` label plus a `<slot>_conf`
/// keyword mapping. Optional slots use `Option<String>`: `None` means the
/// component is simply not built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    /// Token vocabulary: file path or inline list. Required.
    #[serde(default)]
    pub token_list: Option<TokenListSource>,

    /// Output feature dimensionality. When absent it is derived from the
    /// acoustic feature extractor.
    #[serde(default)]
    pub odim: Option<usize>,

    /// Keyword configuration for the model-type wrapper.
    #[serde(default = "empty_conf")]
    pub model_conf: Conf,

    /// Whether to build the text/label preprocessor.
    #[serde(default = "default_true")]
    pub use_preprocessor: bool,

    /// Tokenization level.
    #[serde(default)]
    pub token_type: TokenType,

    /// Sentencepiece model path, required when `token_type = bpe`.
    #[serde(default)]
    pub bpemodel: Option<String>,

    /// Path to a non-linguistic-symbols file.
    #[serde(default)]
    pub non_linguistic_symbols: Option<String>,

    /// Text cleaning method.
    #[serde(default)]
    pub cleaner: Option<CleanerType>,

    /// Grapheme-to-phoneme backend.
    #[serde(default)]
    pub g2p: Option<G2pType>,

    /// Sample rate in Hz. The single source of truth: extractor confs inherit
    /// this value at assembly time.
    #[serde(default = "default_fs")]
    pub fs: u32,

    /// Number of discrete-token layers (discrete_svs only).
    #[serde(default = "default_discrete_token_layers")]
    pub discrete_token_layers: usize,

    /// Number of cluster centers (discrete_svs only).
    #[serde(default = "default_nclusters")]
    pub nclusters: usize,

    /// Score feature extractor label.
    #[serde(default = "default_score_feats_extract")]
    pub score_feats_extract: Option<String>,
    #[serde(default = "empty_conf")]
    pub score_feats_extract_conf: Conf,

    /// Acoustic feature extractor label.
    #[serde(default = "default_feats_extract")]
    pub feats_extract: Option<String>,
    #[serde(default = "empty_conf")]
    pub feats_extract_conf: Conf,

    /// Feature normalizer label.
    #[serde(default = "default_normalize")]
    pub normalize: Option<String>,
    #[serde(default = "empty_conf")]
    pub normalize_conf: Conf,

    /// Synthesis network label. Required slot with a default.
    #[serde(default = "default_svs")]
    pub svs: String,
    #[serde(default = "empty_conf")]
    pub svs_conf: Conf,

    /// Pitch extractor label.
    #[serde(default)]
    pub pitch_extract: Option<String>,
    #[serde(default = "empty_conf")]
    pub pitch_extract_conf: Conf,

    /// Pitch normalizer label.
    #[serde(default)]
    pub pitch_normalize: Option<String>,
    #[serde(default = "empty_conf")]
    pub pitch_normalize_conf: Conf,

    /// Ying extractor label.
    #[serde(default)]
    pub ying_extract: Option<String>,
    #[serde(default = "empty_conf")]
    pub ying_extract_conf: Conf,

    /// Energy extractor label.
    #[serde(default)]
    pub energy_extract: Option<String>,
    #[serde(default = "empty_conf")]
    pub energy_extract_conf: Conf,

    /// Energy normalizer label.
    #[serde(default)]
    pub energy_normalize: Option<String>,
    #[serde(default = "empty_conf")]
    pub energy_normalize_conf: Conf,

    /// Model-type wrapper selection.
    #[serde(default)]
    pub model_type: ModelKind,
}

impl Default for TaskConfig {
    fn default() -> Self {
        // Matches a config deserialized from an empty YAML mapping.
        Self {
            token_list: None,
            odim: None,
            model_conf: empty_conf(),
            use_preprocessor: true,
            token_type: TokenType::default(),
            bpemodel: None,
            non_linguistic_symbols: None,
            cleaner: None,
            g2p: None,
            fs: default_fs(),
            discrete_token_layers: default_discrete_token_layers(),
            nclusters: default_nclusters(),
            score_feats_extract: default_score_feats_extract(),
            score_feats_extract_conf: empty_conf(),
            feats_extract: default_feats_extract(),
            feats_extract_conf: empty_conf(),
            normalize: default_normalize(),
            normalize_conf: empty_conf(),
            svs: default_svs(),
            svs_conf: empty_conf(),
            pitch_extract: None,
            pitch_extract_conf: empty_conf(),
            pitch_normalize: None,
            pitch_normalize_conf: empty_conf(),
            ying_extract: None,
            ying_extract_conf: empty_conf(),
            energy_extract: None,
            energy_extract_conf: empty_conf(),
            energy_normalize: None,
            energy_normalize_conf: empty_conf(),
            model_type: ModelKind::default(),
        }
    }
}

impl TaskConfig {
    /// Parse a task configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> TaskResult<Self> {
        let config: TaskConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Parse a task configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> TaskResult<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&text)
    }

    /// Serialize the configuration to YAML (the persisted-snapshot form).
    pub fn to_yaml(&self) -> TaskResult<String> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(yaml)
    }

    /// Validate the cross-option invariants.
    pub fn validate(&self) -> TaskResult<()> {
        if self.token_list.is_none() {
            return Err(TaskError::config("token_list is required"));
        }
        if let Some(TokenListSource::Inline(tokens)) = &self.token_list {
            if tokens.is_empty() {
                return Err(TaskError::config("token_list must not be empty"));
            }
        }
        if self.token_type == TokenType::Bpe && self.bpemodel.is_none() {
            return Err(TaskError::config("token_type=bpe requires bpemodel"));
        }
        if self.nclusters == 0 {
            return Err(TaskError::config("nclusters must be positive"));
        }
        if self.discrete_token_layers == 0 {
            return Err(TaskError::config("discrete_token_layers must be positive"));
        }
        Ok(())
    }

    /// Resolve the token vocabulary into an ordered list.
    ///
    /// Reads the token-list file line by line with trailing newlines stripped,
    /// or clones the inline list. Fails when the source is absent or empty.
    pub fn resolve_token_list(&self) -> TaskResult<Vec<String>> {
        let tokens = match &self.token_list {
            Some(TokenListSource::File(path)) => fs::read_to_string(path)?
                .lines()
                .map(|line| line.to_string())
                .collect::<Vec<_>>(),
            Some(TokenListSource::Inline(tokens)) => tokens.clone(),
            None => return Err(TaskError::config("token_list must be a path or a list")),
        };
        if tokens.is_empty() {
            return Err(TaskError::config("token_list resolved to an empty vocabulary"));
        }
        Ok(tokens)
    }

    /// Return a fresh snapshot with the vocabulary inlined, so the persisted
    /// config no longer depends on the token-list file.
    pub fn with_inline_token_list(&self, tokens: Vec<String>) -> Self {
        let mut snapshot = self.clone();
        snapshot.token_list = Some(TokenListSource::Inline(tokens));
        snapshot
    }

    /// Builder-style label setter for the synthesis network, used by tests
    /// and programmatic assembly.
    pub fn with_svs(mut self, label: impl Into<String>, conf: Conf) -> Self {
        self.svs = label.into();
        self.svs_conf = conf;
        self
    }

    /// Builder-style setter for the token list.
    pub fn with_token_list(mut self, source: TokenListSource) -> Self {
        self.token_list = Some(source);
        self
    }
}

/// One entry of the user-facing configuration surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSpec {
    /// Option name as it appears in the YAML surface.
    pub name: &'static str,
    /// Rendered default value, empty when there is none.
    pub default: String,
    /// Help text.
    pub help: String,
    /// Whether the option must be supplied.
    pub required: bool,
}

impl OptionSpec {
    fn new(name: &'static str, default: &str, help: &str, required: bool) -> Self {
        Self {
            name,
            default: default.to_string(),
            help: help.to_string(),
            required,
        }
    }
}

/// The non-slot options of the configuration surface. Registry slots are
/// described by the registries themselves; see
/// [`crate::task::SvsTask::describe_options`] for the full listing.
pub(crate) fn base_options() -> Vec<OptionSpec> {
    vec![
        OptionSpec::new(
            "token_list",
            "",
            "A text file (or inline list) mapping int-id to token",
            true,
        ),
        OptionSpec::new(
            "odim",
            "",
            "The number of dimensions of the output feature",
            false,
        ),
        OptionSpec::new(
            "model_conf",
            "{}",
            "Keyword configuration for the model wrapper",
            false,
        ),
        OptionSpec::new(
            "use_preprocessor",
            "true",
            "Apply preprocessing to data or not",
            false,
        ),
        OptionSpec::new(
            "token_type",
            "phn",
            "Tokenization level (bpe, char, word, phn)",
            false,
        ),
        OptionSpec::new("bpemodel", "", "The model file of sentencepiece", false),
        OptionSpec::new(
            "non_linguistic_symbols",
            "",
            "non_linguistic_symbols file path",
            false,
        ),
        OptionSpec::new(
            "cleaner",
            "",
            "Text cleaning method (tacotron, jaconv, vietnamese)",
            false,
        ),
        OptionSpec::new(
            "g2p",
            "",
            "Grapheme-to-phoneme backend when token_type=phn",
            false,
        ),
        OptionSpec::new(
            "fs",
            "24000",
            "Sample rate in Hz, inherited by every extractor",
            false,
        ),
        OptionSpec::new(
            "discrete_token_layers",
            "1",
            "Layers of discrete tokens",
            false,
        ),
        OptionSpec::new("nclusters", "1024", "Number of cluster centers", false),
    ]
}

/// Render a keyword configuration as a compact single-line summary.
pub fn render_conf(conf: &Conf) -> String {
    let Conf::Mapping(map) = conf else {
        return "{}".to_string();
    };
    let entries: BTreeMap<&str, String> = map
        .iter()
        .filter_map(|(k, v)| {
            let rendered = serde_yaml::to_string(v).unwrap_or_default();
            k.as_str().map(|k| (k, rendered.trim().to_string()))
        })
        .collect();
    let parts: Vec<String> = entries
        .into_iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect();
    format!("{{{}}}", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_empty_yaml() {
        let parsed = TaskConfig::from_yaml("{}").unwrap();
        assert_eq!(parsed, TaskConfig::default());
        assert_eq!(parsed.fs, 24000);
        assert_eq!(parsed.svs, "naive_rnn");
        assert_eq!(parsed.feats_extract.as_deref(), Some("fbank"));
        assert_eq!(parsed.normalize.as_deref(), Some("global_mvn"));
        assert!(parsed.pitch_extract.is_none());
        assert!(parsed.use_preprocessor);
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
token_list: ["<blank>", "a", "b", "<sos/eos>"]
odim: 80
svs: xiaoice
svs_conf:
  adim: 256
  reduction_factor: 2
pitch_extract: dio
cleaner: tacotron
g2p: g2p_en
model_type: discrete_svs
nclusters: 512
"#;
        let config = TaskConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.odim, Some(80));
        assert_eq!(config.svs, "xiaoice");
        assert_eq!(conf_u64(&config.svs_conf, "reduction_factor"), Some(2));
        assert_eq!(config.pitch_extract.as_deref(), Some("dio"));
        assert_eq!(config.cleaner, Some(CleanerType::Tacotron));
        assert_eq!(config.g2p, Some(G2pType::G2pEn));
        assert_eq!(config.model_type, ModelKind::DiscreteSvs);
        assert_eq!(config.nclusters, 512);
    }

    #[test]
    fn test_config_rejects_unknown_fields() {
        assert!(TaskConfig::from_yaml("no_such_option: 1").is_err());
    }

    #[test]
    fn test_validate_requires_token_list() {
        let config = TaskConfig::default();
        assert!(matches!(config.validate(), Err(TaskError::Config(_))));

        let config = config.with_token_list(TokenListSource::Inline(vec!["a".into()]));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_inline_vocabulary() {
        let config = TaskConfig::default().with_token_list(TokenListSource::Inline(vec![]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bpe_requires_bpemodel() {
        let mut config =
            TaskConfig::default().with_token_list(TokenListSource::Inline(vec!["a".into()]));
        config.token_type = TokenType::Bpe;
        assert!(config.validate().is_err());
        config.bpemodel = Some("bpe.model".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_token_list_source_untagged() {
        let config = TaskConfig::from_yaml("token_list: tokens.txt").unwrap();
        assert_eq!(
            config.token_list,
            Some(TokenListSource::File("tokens.txt".into()))
        );

        let config = TaskConfig::from_yaml("token_list: [a, b]").unwrap();
        assert_eq!(
            config.token_list,
            Some(TokenListSource::Inline(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_inline_snapshot_roundtrip() {
        let config = TaskConfig::default()
            .with_token_list(TokenListSource::Inline(vec!["a".into(), "b".into()]));
        let snapshot = config.with_inline_token_list(config.resolve_token_list().unwrap());
        let yaml = snapshot.to_yaml().unwrap();
        let reparsed = TaskConfig::from_yaml(&yaml).unwrap();
        assert_eq!(snapshot, reparsed);
    }

    #[test]
    fn test_conf_helpers() {
        let mut conf = Conf::Null;
        assert_eq!(conf_u64(&conf, "reduction_factor"), None);
        conf_set_u64(&mut conf, "reduction_factor", 2);
        assert_eq!(conf_u64(&conf, "reduction_factor"), Some(2));
        // Overwrite wins.
        conf_set_u64(&mut conf, "reduction_factor", 3);
        assert_eq!(conf_u64(&conf, "reduction_factor"), Some(3));
    }

    #[test]
    fn test_base_options_mark_token_list_required() {
        let options = base_options();
        let token_list = options.iter().find(|o| o.name == "token_list").unwrap();
        assert!(token_list.required);
        assert_eq!(options.iter().filter(|o| o.required).count(), 1);
    }
}
