//! Heuristic English syllable counting.

use async_trait::async_trait;

use crate::domain::errors::AnalysisError;
use crate::domain::ports::SyllableCounter;

/// Counts vowel groups per word, dropping a silent final `e`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicSyllableCounter;

impl HeuristicSyllableCounter {
    pub fn count(text: &str) -> u32 {
        text.split(|c: char| !c.is_ascii_alphabetic() && c != '\'')
            .map(count_word)
            .sum()
    }
}

const fn is_vowel(c: u8) -> bool {
    matches!(c, b'a' | b'e' | b'i' | b'o' | b'u' | b'y')
}

fn count_word(word: &str) -> u32 {
    let letters: Vec<u8> = word
        .bytes()
        .filter(u8::is_ascii_alphabetic)
        .map(|b| b.to_ascii_lowercase())
        .collect();
    if letters.is_empty() {
        return 0;
    }

    let mut groups = 0;
    let mut previous_vowel = false;
    for &c in &letters {
        let vowel = is_vowel(c);
        if vowel && !previous_vowel {
            groups += 1;
        }
        previous_vowel = vowel;
    }

    let silent_e = letters.ends_with(b"e") && !letters.ends_with(b"le") && !letters.ends_with(b"ee");
    if silent_e && groups > 1 {
        groups -= 1;
    }
    groups.max(1)
}

#[async_trait]
impl SyllableCounter for HeuristicSyllableCounter {
    async fn count_syllables(&self, text: &str) -> Result<u32, AnalysisError> {
        Ok(Self::count(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_vowel_groups() {
        assert_eq!(HeuristicSyllableCounter::count("hello world"), 3);
        assert_eq!(HeuristicSyllableCounter::count("beautiful"), 3);
        assert_eq!(HeuristicSyllableCounter::count("rhythm"), 1);
    }

    #[test]
    fn test_silent_e() {
        assert_eq!(HeuristicSyllableCounter::count("make"), 1);
        assert_eq!(HeuristicSyllableCounter::count("the"), 1);
        assert_eq!(HeuristicSyllableCounter::count("table"), 2);
        assert_eq!(HeuristicSyllableCounter::count("agree"), 2);
    }

    #[test]
    fn test_punctuation_and_empty_text() {
        assert_eq!(HeuristicSyllableCounter::count(""), 0);
        assert_eq!(HeuristicSyllableCounter::count("... 42 !"), 0);
        assert_eq!(HeuristicSyllableCounter::count("Well, don't stop."), 3);
    }

    #[tokio::test]
    async fn test_port_implementation() {
        let counter = HeuristicSyllableCounter;
        assert_eq!(counter.count_syllables("Good morning").await.unwrap(), 3);
    }
}
