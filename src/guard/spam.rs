use regex::Regex;
use std::sync::LazyLock;

use crate::config::GibberishThresholds;

use super::gibberish;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)https?://[^\s]+").unwrap());

const MAX_LINKS: usize = 3;
const SHOUTING_MIN_LEN: usize = 50;
const MAX_REPEATED_RUN: usize = 10;

/// A single spam heuristic. Rules are evaluated in the order of `SpamRule::ORDERED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpamRule {
    GibberishName,
    GibberishSubject,
    GibberishMessage,
    TooManyLinks,
    SpamPhrase,
    ShoutingMessage,
    RepeatedCharacters,
}

impl SpamRule {
    pub const ORDERED: [SpamRule; 7] = [
        SpamRule::GibberishName,
        SpamRule::GibberishSubject,
        SpamRule::GibberishMessage,
        SpamRule::TooManyLinks,
        SpamRule::SpamPhrase,
        SpamRule::ShoutingMessage,
        SpamRule::RepeatedCharacters,
    ];

    pub fn reason(self) -> &'static str {
        match self {
            SpamRule::GibberishName => "Please enter a valid name.",
            SpamRule::GibberishSubject => "Please enter a meaningful subject.",
            SpamRule::GibberishMessage => "Please enter a meaningful message.",
            SpamRule::TooManyLinks => "Your message contains too many links.",
            SpamRule::SpamPhrase => "Your message contains content that looks like spam.",
            SpamRule::ShoutingMessage => "Please do not write your message in all capital letters.",
            SpamRule::RepeatedCharacters => "Your message contains excessive repeated characters.",
        }
    }
}

pub struct SpamInput<'a> {
    pub name: &'a str,
    pub subject: &'a str,
    pub message: &'a str,
}

impl SpamInput<'_> {
    fn body(&self) -> String {
        format!("{} {}", self.subject, self.message)
    }
}

pub struct SpamFilter {
    phrases: Option<Regex>,
    gibberish: GibberishThresholds,
}

impl SpamFilter {
    pub fn new(phrases: &[String], gibberish: GibberishThresholds) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = phrases
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .map(regex::escape)
            .collect();

        let phrases = if alternatives.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"(?i)\b(?:{})\b", alternatives.join("|")))?)
        };

        Ok(Self { phrases, gibberish })
    }

    pub fn first_match(&self, input: &SpamInput<'_>) -> Option<SpamRule> {
        SpamRule::ORDERED
            .into_iter()
            .find(|rule| self.matches(*rule, input))
    }

    pub fn matches(&self, rule: SpamRule, input: &SpamInput<'_>) -> bool {
        match rule {
            SpamRule::GibberishName => gibberish::is_gibberish_with(input.name, &self.gibberish),
            SpamRule::GibberishSubject => {
                gibberish::is_gibberish_with(input.subject, &self.gibberish)
            }
            SpamRule::GibberishMessage => {
                input.message.chars().count() < self.gibberish.max_message_len
                    && gibberish::is_gibberish_with(input.message, &self.gibberish)
            }
            SpamRule::TooManyLinks => URL_RE.find_iter(&input.body()).count() > MAX_LINKS,
            SpamRule::SpamPhrase => self
                .phrases
                .as_ref()
                .is_some_and(|re| re.is_match(&input.body())),
            SpamRule::ShoutingMessage => is_shouting(input.message),
            SpamRule::RepeatedCharacters => longest_repeat(&input.body()) > MAX_REPEATED_RUN,
        }
    }
}

fn is_shouting(message: &str) -> bool {
    message.chars().count() > SHOUTING_MIN_LEN
        && message.chars().any(|c| c.is_alphabetic())
        && message == message.to_uppercase()
}

/// Length of the longest run of one repeated character.
pub fn longest_repeat(text: &str) -> usize {
    let mut longest = 0;
    let mut current = 0;
    let mut prev = None;
    for c in text.chars() {
        if Some(c) == prev {
            current += 1;
        } else {
            current = 1;
            prev = Some(c);
        }
        longest = longest.max(current);
    }
    longest
}
