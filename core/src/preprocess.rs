//! Text/label preprocessing for SVS data.
//!
//! The preprocessor maps lyrics (or phoneme streams) onto vocabulary ids and
//! score/label timings onto frame indices. It is built per run by
//! [`crate::task::SvsTask::build_preprocess_fn`] when `use_preprocessor` is
//! enabled; otherwise the data pipeline receives the fields untouched.
//!
//! SVS corpora usually arrive pre-phonemized, so the g2p selection mainly
//! fixes the symbol conventions the vocabulary was built with; only the
//! `*_no_space` variants alter the token stream here, by dropping space
//! tokens.

use std::collections::HashMap;

use crate::config::{CleanerType, G2pType, TaskConfig, TokenType};
use crate::error::{TaskError, TaskResult};

/// Conventional unknown-token symbol.
const UNK_TOKEN: &str = "<unk>";

/// Token/label preprocessor for one train or inference run.
#[derive(Debug, Clone)]
pub struct SvsPreprocessor {
    train: bool,
    token_type: TokenType,
    cleaner: Option<CleanerType>,
    g2p: Option<G2pType>,
    fs: u32,
    hop_length: usize,
    token2id: HashMap<String, i64>,
    unk_id: Option<i64>,
}

impl SvsPreprocessor {
    /// Build a preprocessor from the task config and the resolved vocabulary.
    ///
    /// `hop_length` comes from the acoustic extractor configuration and sets
    /// the seconds-to-frames scale for score/label timing.
    pub fn new(
        config: &TaskConfig,
        tokens: Vec<String>,
        train: bool,
        hop_length: usize,
    ) -> TaskResult<Self> {
        if tokens.is_empty() {
            return Err(TaskError::config("preprocessor needs a non-empty vocabulary"));
        }
        if config.token_type == TokenType::Bpe && config.bpemodel.is_none() {
            return Err(TaskError::config("token_type=bpe requires bpemodel"));
        }
        if hop_length == 0 {
            return Err(TaskError::config("hop_length must be positive"));
        }
        let token2id: HashMap<String, i64> = tokens
            .into_iter()
            .enumerate()
            .map(|(id, token)| (token, id as i64))
            .collect();
        let unk_id = token2id.get(UNK_TOKEN).copied();
        Ok(Self {
            train,
            token_type: config.token_type,
            cleaner: config.cleaner,
            g2p: config.g2p,
            fs: config.fs,
            hop_length,
            token2id,
            unk_id,
        })
    }

    /// Whether this preprocessor was built for training (vs inference).
    pub fn is_train(&self) -> bool {
        self.train
    }

    /// Number of entries in the vocabulary.
    pub fn vocab_size(&self) -> usize {
        self.token2id.len()
    }

    /// Apply the configured text cleaner.
    pub fn clean(&self, text: &str) -> String {
        match self.cleaner {
            Some(CleanerType::Tacotron) => {
                let lowered = text.to_lowercase();
                let stripped: String = lowered
                    .chars()
                    .filter(|c| !matches!(c, '"' | '(' | ')' | '[' | ']'))
                    .collect();
                stripped.split_whitespace().collect::<Vec<_>>().join(" ")
            }
            Some(CleanerType::Vietnamese) => text.to_lowercase(),
            // Kana normalization happens upstream in the corpus preparation.
            Some(CleanerType::Jaconv) | None => text.to_string(),
        }
    }

    /// Split cleaned text into vocabulary tokens.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens: Vec<String> = match self.token_type {
            TokenType::Char => text.chars().map(|c| c.to_string()).collect(),
            // bpe input is pre-segmented pieces; word and phn streams are
            // whitespace-separated.
            TokenType::Bpe | TokenType::Word | TokenType::Phn => {
                text.split_whitespace().map(|t| t.to_string()).collect()
            }
        };
        if matches!(
            self.g2p,
            Some(G2pType::G2pEnNoSpace) | Some(G2pType::PypinyinG2pPhoneWithoutProsody)
        ) {
            tokens.retain(|t| t != "<space>" && t != " ");
        }
        tokens
    }

    /// Map text onto vocabulary ids.
    ///
    /// Unknown tokens map to `<unk>` when the vocabulary carries it and are
    /// dropped otherwise.
    pub fn text_to_ids(&self, text: &str) -> Vec<i64> {
        let cleaned = self.clean(text);
        self.tokenize(&cleaned)
            .iter()
            .filter_map(|token| self.token2id.get(token).copied().or(self.unk_id))
            .collect()
    }

    /// Convert a score/label timestamp in seconds to a frame index.
    pub fn seconds_to_frames(&self, seconds: f64) -> usize {
        (seconds * self.fs as f64 / self.hop_length as f64).round() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TokenListSource;

    fn vocab() -> Vec<String> {
        ["<blank>", "<unk>", "a", "b", "c", "HH", "AH", "<sos/eos>"]
            .iter()
            .map(|t| t.to_string())
            .collect()
    }

    fn preprocessor(config: TaskConfig) -> SvsPreprocessor {
        SvsPreprocessor::new(&config, vocab(), true, 256).unwrap()
    }

    #[test]
    fn test_phn_text_to_ids() {
        let pre = preprocessor(TaskConfig::default());
        assert_eq!(pre.text_to_ids("HH AH"), vec![5, 6]);
    }

    #[test]
    fn test_unknown_token_maps_to_unk() {
        let pre = preprocessor(TaskConfig::default());
        assert_eq!(pre.text_to_ids("HH ZZ"), vec![5, 1]);
    }

    #[test]
    fn test_char_tokenization() {
        let mut config = TaskConfig::default();
        config.token_type = TokenType::Char;
        let pre = preprocessor(config);
        assert_eq!(pre.text_to_ids("cab"), vec![4, 2, 3]);
    }

    #[test]
    fn test_tacotron_cleaner() {
        let mut config = TaskConfig::default();
        config.cleaner = Some(CleanerType::Tacotron);
        let pre = preprocessor(config);
        assert_eq!(pre.clean("A  (B)   c"), "a b c");
    }

    #[test]
    fn test_g2p_no_space_drops_spaces() {
        let mut config = TaskConfig::default();
        config.g2p = Some(G2pType::G2pEnNoSpace);
        let pre = preprocessor(config);
        assert_eq!(pre.tokenize("HH <space> AH"), vec!["HH", "AH"]);
    }

    #[test]
    fn test_seconds_to_frames() {
        let pre = preprocessor(TaskConfig::default());
        // 24000 Hz / 256 hop = 93.75 frames per second.
        assert_eq!(pre.seconds_to_frames(1.0), 94);
        assert_eq!(pre.seconds_to_frames(0.0), 0);
    }

    #[test]
    fn test_bpe_requires_bpemodel() {
        let mut config = TaskConfig::default()
            .with_token_list(TokenListSource::Inline(vocab()));
        config.token_type = TokenType::Bpe;
        assert!(SvsPreprocessor::new(&config, vocab(), true, 256).is_err());
    }
}
