//! Heuristic detection of randomly generated text.
//!
//! Four independent signals are tried in order; any one of them flags the input.
//! Natural prose keeps its vowel ratio near 0.35–0.45, rarely stacks five
//! consonants, capitalizes sparingly, and is dense in common English digraphs.

use crate::config::GibberishThresholds;

const COMMON_DIGRAPHS: [&str; 20] = [
    "th", "he", "in", "er", "an", "re", "on", "at", "en", "nd", "ti", "es", "or", "te", "of",
    "ed", "is", "it", "al", "ar",
];

pub fn is_gibberish(text: &str) -> bool {
    is_gibberish_with(text, &GibberishThresholds::default())
}

pub fn is_gibberish_with(text: &str, t: &GibberishThresholds) -> bool {
    let significant = text
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_ascii_digit())
        .count();
    if significant < t.min_chars {
        return false;
    }

    let letters: Vec<char> = text.chars().filter(|c| c.is_ascii_alphabetic()).collect();

    vowel_ratio_out_of_bounds(&letters, t)
        || longest_consonant_run(text) >= t.consonant_run_limit
        || erratic_case(&letters, t)
        || lacks_common_digraphs(&letters, t)
}

fn is_vowel(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u')
}

fn vowel_ratio_out_of_bounds(letters: &[char], t: &GibberishThresholds) -> bool {
    if letters.is_empty() {
        return false;
    }
    let vowels = letters.iter().filter(|c| is_vowel(**c)).count();
    let ratio = vowels as f64 / letters.len() as f64;
    ratio < t.vowel_ratio_min || ratio > t.vowel_ratio_max
}

/// Length of the longest run of consecutive ASCII consonants. Anything else breaks a run.
pub fn longest_consonant_run(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c.is_ascii_alphabetic() && !is_vowel(c) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn erratic_case(letters: &[char], t: &GibberishThresholds) -> bool {
    if letters.len() < t.case_check_min_letters {
        return false;
    }
    let changes = letters
        .windows(2)
        .filter(|w| w[0].is_ascii_uppercase() != w[1].is_ascii_uppercase())
        .count();
    changes as f64 > letters.len() as f64 * t.max_case_change_ratio
}

fn lacks_common_digraphs(letters: &[char], t: &GibberishThresholds) -> bool {
    if letters.len() < t.digraph_check_min_letters {
        return false;
    }
    let lower: String = letters.iter().map(|c| c.to_ascii_lowercase()).collect();
    let present = COMMON_DIGRAPHS
        .iter()
        .filter(|d| lower.contains(*d))
        .count();
    let required = (letters.len() / 5).min(2);
    present < required
}
