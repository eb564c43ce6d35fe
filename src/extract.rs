// Keyword and number extraction from free-form answers.
//
// Every extractor returns exactly one value or fails. Ambiguity is decided on
// the set of distinct keywords found, so "yes yes" is fine while "yes no"
// (or even "yes yup") is rejected.

use crate::model::{Age, Decision, Sex, MAX_AGE, MIN_AGE};
use regex::{Regex, RegexBuilder};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

pub const SEX_NORM: &[(&str, Sex)] = &[
    ("male", Sex::Male),
    ("m", Sex::Male),
    ("man", Sex::Male),
    ("boy", Sex::Male),
    ("female", Sex::Female),
    ("f", Sex::Female),
    ("woman", Sex::Female),
    ("girl", Sex::Female),
];

pub const ANSWER_NORM: &[(&str, Decision)] = &[
    ("yes", Decision::Present),
    ("y", Decision::Present),
    ("yup", Decision::Present),
    ("definitely", Decision::Present),
    ("sure", Decision::Present),
    ("surely", Decision::Present),
    ("present", Decision::Present),
    ("no", Decision::Absent),
    ("n", Decision::Absent),
    ("nah", Decision::Absent),
    ("nope", Decision::Absent),
    ("absent", Decision::Absent),
    ("?", Decision::Unknown),
    ("skip", Decision::Unknown),
    ("unknown", Decision::Unknown),
    ("dont know", Decision::Unknown),
    ("don't know", Decision::Unknown),
];

/// What an extractor was looking for. Only used to word error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Decision,
    Sex,
    Age,
}

impl Subject {
    fn ambiguity(self) -> &'static str {
        match self {
            Subject::Decision => "The decision seemed ambiguous.",
            Subject::Sex => "I understood multiple sexes.",
            Subject::Age => "I understood multiple ages.",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Decision => f.write_str("decision"),
            Subject::Sex => f.write_str("sex"),
            Subject::Age => f.write_str("age"),
        }
    }
}

/// Recoverable failure to read a value out of the user's answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("No {0} found.")]
    NoMatch(Subject),

    #[error("{}", .0.ambiguity())]
    Ambiguous(Subject),

    #[error("{}", out_of_range_message(.0))]
    OutOfRange(u64),
}

fn out_of_range_message(years: &u64) -> String {
    if *years < u64::from(MIN_AGE) {
        format!("Ages below {MIN_AGE} are not yet supported.")
    } else {
        format!("Maximum possible age is {MAX_AGE}.")
    }
}

fn keyword_regex<'a>(keywords: impl IntoIterator<Item = &'a str>) -> Option<Regex> {
    let pattern = keywords
        .into_iter()
        .map(|k| format!(r"\b{}\b", regex::escape(k)))
        .collect::<Vec<_>>()
        .join("|");
    if pattern.is_empty() {
        return None;
    }
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .expect("escaped keywords always form a valid pattern");
    Some(re)
}

/// All whole-word, case-insensitive occurrences of `keywords` in `text`, in
/// the order they appear. Keywords are matched literally.
pub fn extract_keywords<'a>(
    text: &str,
    keywords: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    match keyword_regex(keywords) {
        Some(re) => re.find_iter(text).map(|m| m.as_str().to_string()).collect(),
        None => Vec::new(),
    }
}

fn extract_one<T: Copy>(
    text: &str,
    mapping: &[(&str, T)],
    subject: Subject,
) -> Result<T, ExtractError> {
    let found: BTreeSet<String> = extract_keywords(text, mapping.iter().map(|(k, _)| *k))
        .into_iter()
        .map(|k| k.to_lowercase())
        .collect();
    let mut found = found.into_iter();
    match (found.next(), found.next()) {
        (None, _) => Err(ExtractError::NoMatch(subject)),
        (Some(_), Some(_)) => Err(ExtractError::Ambiguous(subject)),
        (Some(keyword), None) => mapping
            .iter()
            .find(|(k, _)| k.to_lowercase() == keyword)
            .map(|(_, v)| *v)
            .ok_or(ExtractError::NoMatch(subject)),
    }
}

pub fn extract_decision(
    text: &str,
    mapping: &[(&str, Decision)],
) -> Result<Decision, ExtractError> {
    extract_one(text, mapping, Subject::Decision)
}

pub fn extract_sex(text: &str, mapping: &[(&str, Sex)]) -> Result<Sex, ExtractError> {
    extract_one(text, mapping, Subject::Sex)
}

/// The single whole number mentioned in `text`.
pub fn extract_age(text: &str) -> Result<u64, ExtractError> {
    let re = Regex::new(r"\b[0-9]+\b").expect("static pattern");
    let numbers: BTreeSet<&str> = re.find_iter(text).map(|m| m.as_str()).collect();
    let mut numbers = numbers.into_iter();
    match (numbers.next(), numbers.next()) {
        (None, _) => Err(ExtractError::NoMatch(Subject::Age)),
        (Some(_), Some(_)) => Err(ExtractError::Ambiguous(Subject::Age)),
        // Only digits were matched, so parsing can only overflow.
        (Some(number), None) => Ok(number.parse().unwrap_or(u64::MAX)),
    }
}

/// Extract an age and check it against the supported range.
pub fn read_age(text: &str) -> Result<Age, ExtractError> {
    let years = extract_age(text)?;
    Age::new(years).ok_or(ExtractError::OutOfRange(years))
}
