//! Offline password strength estimation.

mod dictionary;

pub use dictionary::Dictionary;

use ksafe_domain::config::StrengthConfig;
use std::fmt::Debug;

/// Highest score a password can get.
pub const MAX_SCORE: u8 = 4;
/// Scores below this mark a password as weak.
pub const WEAK_BELOW: u8 = 3;

const PATTERN_PENALTY: i32 = 3;
const MIN_SEQUENCE: usize = 4;

pub trait StrengthScorer: Send + Sync + Debug {
    /// A score in `0..=MAX_SCORE`.
    fn score(&self, password: &str) -> u8;
}

/// Rule-based scorer: length and character classes earn points, guessable
/// patterns (sequences, repetition, dictionary words) cost them.
#[derive(Debug)]
pub struct PasswordStrength {
    dictionary: Dictionary,
}

impl Default for PasswordStrength {
    fn default() -> Self {
        Self::from_config(&StrengthConfig::default())
    }
}

impl PasswordStrength {
    #[must_use]
    pub const fn new(dictionary: Dictionary) -> Self {
        Self { dictionary }
    }

    #[must_use]
    pub fn from_config(config: &StrengthConfig) -> Self {
        Self::new(Dictionary::common(config))
    }
}

impl StrengthScorer for PasswordStrength {
    fn score(&self, password: &str) -> u8 {
        let chars: Vec<char> = password.chars().collect();
        let mut score: i32 = 0;

        score += if chars.len() >= 8 { 1 } else { -1 };
        if chars.len() >= 12 {
            score += 1;
        }

        score += i32::from(chars.iter().any(|c| c.is_uppercase()));
        score += i32::from(chars.iter().any(char::is_ascii_digit));
        score += i32::from(chars.iter().any(|c| !c.is_alphanumeric()));

        if has_sequence(&chars) {
            score -= PATTERN_PENALTY;
        }
        if has_repetition(&chars) {
            score -= PATTERN_PENALTY;
        }
        if self.dictionary.matches(password) {
            score -= PATTERN_PENALTY;
        }

        u8::try_from(score.clamp(0, i32::from(MAX_SCORE))).unwrap_or(0)
    }
}

/// An ascending or descending run of at least [`MIN_SEQUENCE`] code points, case-folded.
fn has_sequence(chars: &[char]) -> bool {
    let folded: Vec<u32> =
        chars.iter().map(|c| c.to_lowercase().next().map_or(u32::from(*c), u32::from)).collect();

    let (mut up, mut down) = (1, 1);
    for pair in folded.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        up = if a.checked_add(1) == Some(b) { up + 1 } else { 1 };
        down = if b.checked_add(1) == Some(a) { down + 1 } else { 1 };
        if up >= MIN_SEQUENCE || down >= MIN_SEQUENCE {
            return true;
        }
    }
    false
}

/// Three identical chars in a row, or any substring of 2+ chars repeated back to back.
fn has_repetition(chars: &[char]) -> bool {
    if chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2]) {
        return true;
    }

    let n = chars.len();
    (2..=n / 2).any(|len| {
        (0..=n - 2 * len).any(|start| chars[start..start + len] == chars[start + len..start + 2 * len])
    })
}
