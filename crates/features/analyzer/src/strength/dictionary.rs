use ksafe_domain::config::{DictionaryMode, StrengthConfig};
use std::collections::BTreeMap;

const COMMON_WORDS: &str = include_str!("../../data/common-words.txt");

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<char, Node>,
    terminal: bool,
}

/// Prefix tree of words that make a password guessable.
#[derive(Debug)]
pub struct Dictionary {
    root: Node,
    words: usize,
    mode: DictionaryMode,
    case_sensitive: bool,
}

impl Dictionary {
    /// The embedded common-password word list.
    #[must_use]
    pub fn common(config: &StrengthConfig) -> Self {
        let words = COMMON_WORDS.lines().map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('#'));
        Self::with_words(words, config)
    }

    /// Words shorter than `min_word_len` chars are skipped.
    pub fn with_words<I, S>(words: I, config: &StrengthConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = Self {
            root: Node::default(),
            words: 0,
            mode: config.dictionary_mode,
            case_sensitive: config.case_sensitive,
        };
        let min_len = config.min_word_len.max(1);

        for word in words {
            let word: Vec<char> = dictionary.normalize(word.as_ref());
            if word.len() >= min_len && dictionary.insert(&word) {
                dictionary.words += 1;
            }
        }
        dictionary
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.words
    }

    #[must_use]
    pub const fn mode(&self) -> DictionaryMode {
        self.mode
    }

    /// Whether `password` contains a dictionary word under the configured mode.
    #[must_use]
    pub fn matches(&self, password: &str) -> bool {
        let chars = self.normalize(password);
        match self.mode {
            DictionaryMode::Substring => (0..chars.len()).any(|start| self.has_prefix_word(&chars[start..])),
            DictionaryMode::WholeWord => chars
                .split(|c| !c.is_alphabetic())
                .filter(|run| !run.is_empty())
                .any(|run| self.contains(run)),
        }
    }

    fn normalize(&self, text: &str) -> Vec<char> {
        if self.case_sensitive {
            text.chars().collect()
        } else {
            text.chars().flat_map(char::to_lowercase).collect()
        }
    }

    fn insert(&mut self, word: &[char]) -> bool {
        let mut node = &mut self.root;
        for c in word {
            node = node.children.entry(*c).or_default();
        }
        !std::mem::replace(&mut node.terminal, true)
    }

    /// True if some word is a prefix of `text`.
    fn has_prefix_word(&self, text: &[char]) -> bool {
        let mut node = &self.root;
        for c in text {
            match node.children.get(c) {
                Some(next) if next.terminal => return true,
                Some(next) => node = next,
                None => return false,
            }
        }
        false
    }

    fn contains(&self, word: &[char]) -> bool {
        let mut node = &self.root;
        for c in word {
            match node.children.get(c) {
                Some(next) => node = next,
                None => return false,
            }
        }
        node.terminal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(mode: DictionaryMode, case_sensitive: bool) -> StrengthConfig {
        StrengthConfig { dictionary_mode: mode, case_sensitive, min_word_len: 4 }
    }

    #[test]
    fn substring_mode_finds_embedded_words() {
        let dict = Dictionary::with_words(["dragon", "pass"], &config(DictionaryMode::Substring, false));
        assert!(dict.matches("xxDRAGONxx"));
        assert!(dict.matches("my-pass-1"));
        assert!(!dict.matches("drag0n"));
        assert_eq!(dict.len(), 2);
    }

    #[test]
    fn whole_word_mode_needs_the_entire_alphabetic_run() {
        let dict = Dictionary::with_words(["dragon"], &config(DictionaryMode::WholeWord, false));
        assert!(dict.matches("7dragon7"));
        assert!(!dict.matches("dragonfly"));
    }

    #[test]
    fn case_sensitivity_is_configurable() {
        let dict = Dictionary::with_words(["secret"], &config(DictionaryMode::Substring, true));
        assert!(dict.matches("mysecret"));
        assert!(!dict.matches("MySecret"));
    }

    #[test]
    fn short_and_repeated_words_are_skipped() {
        let dict = Dictionary::with_words(["abc", "tiger", "TIGER"], &config(DictionaryMode::Substring, false));
        assert_eq!(dict.len(), 1);
        assert!(!dict.matches("abcxyz"));
    }

    #[test]
    fn embedded_list_is_loaded() {
        let dict = Dictionary::common(&StrengthConfig::default());
        assert!(dict.len() > 200);
        assert!(dict.matches("Password123"));
        assert!(!dict.matches("Ab1!cXyz9Q"));
    }
}
