// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Token normalization: uppercase, strip to `[A-Z0-9-]`, and optionally
// rewrite characters OCR engines commonly confuse with digits.

/// How aggressively OCR words are cleaned up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeMode {
    /// Uppercase and strip; letters are kept as read.
    #[default]
    Plain,
    /// Additionally rewrite `O→0, I→1, L→1, S→5, B→8, Z→2`.
    ///
    /// Recovers digits the engine misread as letters, at the cost of breaking
    /// codes that legitimately contain those letters.
    RemapConfusables,
}

impl NormalizeMode {
    pub fn from_remap_flag(remap_confusables: bool) -> Self {
        if remap_confusables {
            Self::RemapConfusables
        } else {
            Self::Plain
        }
    }
}

/// Normalize one OCR word.
///
/// The output only contains `A-Z`, `0-9` and `-`, and applying `normalize`
/// again returns it unchanged.
pub fn normalize(raw_word: &str, mode: NormalizeMode) -> String {
    raw_word
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '-')
        .map(|c| match mode {
            NormalizeMode::Plain => c,
            NormalizeMode::RemapConfusables => remap_confusable(c),
        })
        .collect()
}

fn remap_confusable(c: char) -> char {
    match c {
        'O' => '0',
        'I' | 'L' => '1',
        'S' => '5',
        'B' => '8',
        'Z' => '2',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "klm31aaa",
        "  K4B-2G1646Q,",
        "Straße",
        "ıSO/9001",
        "NH82801-ZB!",
        "日本製 TPS54331",
        "--o0O--",
    ];

    #[test]
    fn plain_mode_uppercases_and_strips() {
        assert_eq!(normalize("k4b2g1646q-bcma,", NormalizeMode::Plain), "K4B2G1646Q-BCMA");
        assert_eq!(normalize("(TPS54331)", NormalizeMode::Plain), "TPS54331");
        assert_eq!(normalize("日本製", NormalizeMode::Plain), "");
    }

    #[test]
    fn remap_mode_rewrites_lookalikes() {
        assert_eq!(
            normalize("SOIC-BZL", NormalizeMode::RemapConfusables),
            "501C-821"
        );
        assert_eq!(normalize("K4B", NormalizeMode::RemapConfusables), "K48");
    }

    #[test]
    fn normalize_is_idempotent() {
        for mode in [NormalizeMode::Plain, NormalizeMode::RemapConfusables] {
            for sample in SAMPLES {
                let once = normalize(sample, mode);
                assert_eq!(normalize(&once, mode), once, "{mode:?} on {sample:?}");
            }
        }
    }

    #[test]
    fn output_alphabet_is_restricted() {
        for sample in SAMPLES {
            let out = normalize(sample, NormalizeMode::Plain);
            assert!(
                out.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-'),
                "{out:?}"
            );
        }
    }

    #[test]
    fn mode_from_flag() {
        assert_eq!(NormalizeMode::from_remap_flag(false), NormalizeMode::Plain);
        assert_eq!(
            NormalizeMode::from_remap_flag(true),
            NormalizeMode::RemapConfusables
        );
    }
}
