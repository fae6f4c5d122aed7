// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate selection: picks the most plausible chip code out of the raw
// text an OCR pass produced.
//
// Tokens are normalized, filtered by length and denylist, and then ranked in
// two tiers: the first token carrying a known manufacturer prefix wins;
// otherwise the longest token wins, earliest first on ties.

use std::collections::HashSet;

use chipscan_core::config::SelectionConfig;
use chipscan_core::error::{Result, ScanError};
use regex::Regex;
use tracing::{debug, instrument};

use crate::normalize::{NormalizeMode, normalize};

/// A normalized token judged to be a plausible chip code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    code: String,
    /// Whether the token won on a manufacturer prefix rather than length.
    pub prefix_match: bool,
}

impl Candidate {
    pub fn as_str(&self) -> &str {
        &self.code
    }

    pub fn into_string(self) -> String {
        self.code
    }
}

impl std::fmt::Display for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}

/// Filters and ranks OCR words. Stateless once built.
#[derive(Debug, Clone)]
pub struct CandidateSelector {
    min_length: usize,
    denylist: HashSet<String>,
    prefix: Option<Regex>,
    mode: NormalizeMode,
}

impl CandidateSelector {
    /// Build a selector from configuration.
    ///
    /// Denylist entries go through the same normalization as OCR words so the
    /// comparison holds when look-alike remapping is on.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::InvalidConfig`] if the prefix pattern is not a
    /// valid regular expression.
    pub fn from_config(config: &SelectionConfig) -> Result<Self> {
        let mode = NormalizeMode::from_remap_flag(config.remap_confusables);
        let prefix = config
            .prefix_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|err| {
                ScanError::InvalidConfig(format!("invalid prefix pattern: {err}"))
            })?;
        let denylist = config
            .denylist
            .iter()
            .map(|word| normalize(word, mode))
            .filter(|word| !word.is_empty())
            .collect();

        Ok(Self {
            min_length: config.min_length,
            denylist,
            prefix,
            mode,
        })
    }

    pub fn mode(&self) -> NormalizeMode {
        self.mode
    }

    /// Every surviving token, in reading order.
    pub fn candidates(&self, raw_text: &str) -> Vec<String> {
        self.survivors(raw_text)
            .into_iter()
            .map(|token| token.code)
            .collect()
    }

    /// Pick the single best chip code, or `None` if nothing survives.
    ///
    /// The prefix pattern is matched against the plain form of each token, so
    /// look-alike remapping cannot hide a manufacturer prefix such as `S`. A
    /// prefix winner keeps the matched prefix as read and remaps the rest.
    #[instrument(skip_all, fields(raw_len = raw_text.len()))]
    pub fn select(&self, raw_text: &str) -> Option<Candidate> {
        let survivors = self.survivors(raw_text);
        debug!(survivors = survivors.len(), "Candidates filtered");

        if let Some(prefix) = &self.prefix {
            let hit = survivors
                .iter()
                .find_map(|token| prefix.find(&token.plain).map(|m| (token, m.range())));
            if let Some((token, span)) = hit {
                let plain = &token.plain;
                return Some(Candidate {
                    code: format!(
                        "{}{}{}",
                        normalize(&plain[..span.start], self.mode),
                        &plain[span.clone()],
                        normalize(&plain[span.end..], self.mode),
                    ),
                    prefix_match: true,
                });
            }
        }

        // `max_by_key` keeps the last maximum, so fold to keep the first.
        survivors
            .into_iter()
            .fold(None::<Token>, |best, token| match best {
                Some(current) if current.code.len() >= token.code.len() => Some(current),
                _ => Some(token),
            })
            .map(|token| Candidate {
                code: token.code,
                prefix_match: false,
            })
    }

    /// Tokens that pass the length and denylist filters, in reading order.
    fn survivors(&self, raw_text: &str) -> Vec<Token> {
        raw_text
            .split_whitespace()
            .map(|word| {
                let plain = normalize(word, NormalizeMode::Plain);
                let code = normalize(&plain, self.mode);
                Token { plain, code }
            })
            .filter(|token| token.code.len() >= self.min_length)
            .filter(|token| !self.denylist.contains(&token.code))
            .collect()
    }
}

/// One OCR word, before and after look-alike remapping.
struct Token {
    plain: String,
    code: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector_with_prefix(pattern: &str) -> CandidateSelector {
        CandidateSelector::from_config(&SelectionConfig {
            prefix_pattern: Some(pattern.into()),
            ..SelectionConfig::default()
        })
        .unwrap()
    }

    fn default_selector() -> CandidateSelector {
        CandidateSelector::from_config(&SelectionConfig::default()).unwrap()
    }

    #[test]
    fn denylisted_words_yield_nothing() {
        assert_eq!(default_selector().select("THE AND CHIP"), None);
        assert_eq!(default_selector().select("made in china"), None);
    }

    #[test]
    fn prefix_match_beats_longer_token() {
        let selector = selector_with_prefix("^(K|H|J)");
        let picked = selector.select("ZZZZZZZZ KLM31AAA").unwrap();
        assert_eq!(picked.as_str(), "KLM31AAA");
        assert!(picked.prefix_match);
    }

    #[test]
    fn first_prefix_match_wins() {
        let selector = selector_with_prefix("^(K|H|J)");
        let picked = selector.select("HY5PS12 K4B2G1646Q").unwrap();
        assert_eq!(picked.as_str(), "HY5PS12");
    }

    #[test]
    fn falls_back_to_longest_token() {
        let selector = selector_with_prefix("^(K|H|J)");
        let picked = selector.select("ABCD 74HC595N XYZW").unwrap();
        assert_eq!(picked.as_str(), "74HC595N");
        assert!(!picked.prefix_match);
    }

    #[test]
    fn length_ties_keep_first_occurrence() {
        let selector = CandidateSelector::from_config(&SelectionConfig {
            prefix_pattern: None,
            ..SelectionConfig::default()
        })
        .unwrap();
        let picked = selector.select("AAAA1 BBBB2 CCCC3").unwrap();
        assert_eq!(picked.as_str(), "AAAA1");
    }

    #[test]
    fn short_tokens_are_never_returned() {
        for min_length in [4, 6] {
            let selector = CandidateSelector::from_config(&SelectionConfig {
                min_length,
                prefix_pattern: Some("^(K|H|J)".into()),
                ..SelectionConfig::default()
            })
            .unwrap();
            let text = "K1 K12 K123 K1234 HX A-B";
            for token in selector.candidates(text) {
                assert!(token.len() >= min_length, "{token} shorter than {min_length}");
            }
            if let Some(picked) = selector.select(text) {
                assert!(picked.as_str().len() >= min_length);
            }
        }
    }

    #[test]
    fn punctuation_is_stripped_before_filtering() {
        let picked = default_selector().select("(NE555P), T.I.").unwrap();
        assert_eq!(picked.as_str(), "NE555P");
    }

    #[test]
    fn empty_text_yields_nothing() {
        assert_eq!(default_selector().select(""), None);
        assert_eq!(default_selector().select("   \n\t "), None);
    }

    #[test]
    fn denylist_follows_remap_policy() {
        let selector = CandidateSelector::from_config(&SelectionConfig::strict()).unwrap();
        // "SERIES" remaps to "5ER1E5" and must still be rejected.
        assert_eq!(selector.select("SERIES"), None);
        assert_eq!(selector.mode(), NormalizeMode::RemapConfusables);
    }

    #[test]
    fn strict_preset_remaps_candidates() {
        let selector = CandidateSelector::from_config(&SelectionConfig::strict()).unwrap();
        let picked = selector.select("MT4ICO8B").unwrap();
        assert_eq!(picked.as_str(), "MT41C088");
        assert!(picked.prefix_match);
    }

    #[test]
    fn strict_preset_keeps_s_prefix() {
        let selector = CandidateSelector::from_config(&SelectionConfig::strict()).unwrap();
        let picked = selector.select("SN74HC595N ABCDEFGHIJKL").unwrap();
        assert_eq!(picked.as_str(), "SN74HC595N");
        assert!(picked.prefix_match);
    }

    #[test]
    fn prefix_winner_remaps_only_after_the_prefix() {
        let selector = CandidateSelector::from_config(&SelectionConfig::strict()).unwrap();
        let picked = selector.select("SOB4IZ").unwrap();
        assert_eq!(picked.into_string(), "S08412");
    }

    #[test]
    fn invalid_prefix_pattern_is_config_error() {
        let err = CandidateSelector::from_config(&SelectionConfig {
            prefix_pattern: Some("^(K|".into()),
            ..SelectionConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig(_)));
    }
}
