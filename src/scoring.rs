use std::time::Duration;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

/// The fixed text the user has to reproduce, split into words once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferencePhrase {
    words: Vec<String>,
}

impl ReferencePhrase {
    pub fn new(text: &str) -> Self {
        Self {
            words: text.split_whitespace().map(str::to_owned).collect(),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Words joined back with single spaces, as the phrase is displayed.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

impl From<&str> for ReferencePhrase {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

/// Outcome of one completed test.
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct TestResult {
    pub wpm: f64,
    pub accuracy: f64,
    pub correct_words: usize,
    pub correct_chars: usize,
    pub total_chars: usize,
}

/// Scores `typed` against `reference`.
///
/// Only the words overlapping the reference are considered; every character
/// of a reference word in that overlap counts towards the total whether or
/// not it was typed. WPM is normalised to `duration`, not to elapsed time.
pub fn score(reference: &ReferencePhrase, typed: &str, duration: Duration) -> TestResult {
    let mut correct_words = 0;
    let mut correct_chars = 0;
    let mut total_chars = 0;

    for (typed_word, ref_word) in typed.split_whitespace().zip(reference.words()) {
        let mut typed_chars = typed_word.chars();
        for ref_char in ref_word.chars() {
            total_chars += 1;
            if typed_chars.next() == Some(ref_char) {
                correct_chars += 1;
            }
        }

        if typed_word == ref_word {
            correct_words += 1;
        }
    }

    let minutes = duration.as_secs_f64() / 60.0;
    let wpm = if minutes > 0.0 {
        correct_words as f64 / minutes
    } else {
        0.0
    };

    let accuracy = if total_chars > 0 {
        (correct_chars as f64 / total_chars as f64) * 100.0
    } else {
        0.0
    };

    TestResult {
        wpm,
        accuracy,
        correct_words,
        correct_chars,
        total_chars,
    }
}

/// Per-word correctness of what has been typed so far, for live highlighting.
/// Words past the end of the reference are always incorrect.
pub fn word_outcomes(reference: &ReferencePhrase, typed: &str) -> Vec<Outcome> {
    typed
        .split_whitespace()
        .enumerate()
        .map(|(i, word)| match reference.words().get(i) {
            Some(expected) if expected == word => Outcome::Correct,
            _ => Outcome::Incorrect,
        })
        .collect()
}
