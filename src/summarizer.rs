//! Frequency-based extractive summarization of free text.
//!
//! Sentences are weighted by how many sentences share their tokens, and the
//! top ones are returned verbatim. There is no model; the same input always
//! yields the same list in the same order.

use ahash::AHashMap;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

pub const MAX_KEY_POINTS: usize = 5;
pub const WEEKLY_TOP_POINTS: usize = 10;
/// Tokens shorter than this are ignored.
pub const MIN_TOKEN_LEN: usize = 3;

pub const DEFAULT_STOPWORDS: &[&str] = &[
    "the", "and", "to", "of", "in", "a", "for", "is", "on", "that", "with", "as", "by", "it", "at",
    "be", "are", "or", "an", "from", "this", "we", "you", "your", "our", "was", "were", "has", "have",
    "had", "not", "but", "can", "will", "may", "should", "could", "would", "i", "he", "she", "they",
    "them", "their", "there", "here", "been", "into", "over", "per", "via", "about", "than", "then",
];

static DEFAULT_STOPWORD_SET: Lazy<StopWords> = Lazy::new(|| StopWords::new(DEFAULT_STOPWORDS));

static RE_SENTENCE_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());
static RE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9_]+").unwrap());

/// Immutable stop-word table.
#[derive(Debug, Clone)]
pub struct StopWords(HashSet<&'static str>);

impl StopWords {
    pub fn new(words: &[&'static str]) -> Self {
        StopWords(words.iter().copied().collect())
    }

    pub fn builtin() -> &'static StopWords {
        &DEFAULT_STOPWORD_SET
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceRecord {
    pub position: usize,
    pub text: String,
    /// May contain repeats.
    pub tokens: Vec<String>,
}

/// Split on `.`, `!` or `?` followed by whitespace. The punctuation stays with
/// its sentence; empty fragments are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = text.trim();
    let mut out = Vec::new();
    let mut start = 0;
    for m in RE_SENTENCE_END.find_iter(text) {
        // punctuation is one ASCII byte
        push_fragment(&mut out, &text[start..m.start() + 1]);
        start = m.end();
    }
    push_fragment(&mut out, &text[start..]);
    out
}

fn push_fragment(out: &mut Vec<String>, fragment: &str) {
    let fragment = fragment.trim();
    if !fragment.is_empty() {
        out.push(fragment.to_string());
    }
}

/// Lower-cased word tokens with stop-words and short tokens removed.
pub fn tokenize(sentence: &str, stop_words: &StopWords) -> Vec<String> {
    RE_TOKEN
        .find_iter(sentence)
        .map(|m| m.as_str().to_ascii_lowercase())
        .filter(|t| t.len() >= MIN_TOKEN_LEN && !stop_words.contains(t))
        .collect()
}

#[derive(Debug, Clone, Copy)]
pub struct ExtractiveSummarizer<'a> {
    stop_words: &'a StopWords,
    max_points: usize,
}

impl Default for ExtractiveSummarizer<'static> {
    fn default() -> Self {
        Self::new(StopWords::builtin())
    }
}

impl<'a> ExtractiveSummarizer<'a> {
    pub fn new(stop_words: &'a StopWords) -> Self {
        Self { stop_words, max_points: MAX_KEY_POINTS }
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points;
        self
    }

    pub fn sentences<S: AsRef<str>>(&self, messages: &[S]) -> Vec<SentenceRecord> {
        messages
            .iter()
            .flat_map(|m| split_sentences(m.as_ref()))
            .enumerate()
            .map(|(position, text)| {
                let tokens = tokenize(&text, self.stop_words);
                SentenceRecord { position, text, tokens }
            })
            .collect()
    }

    /// Score per sentence: the sum of its tokens' document frequencies, where
    /// a token's frequency is the number of sentences containing it.
    pub fn scores(&self, records: &[SentenceRecord]) -> Vec<usize> {
        let mut doc_freq: AHashMap<&str, usize> = AHashMap::new();
        for r in records {
            for t in r.tokens.iter().map(String::as_str).unique() {
                *doc_freq.entry(t).or_insert(0) += 1;
            }
        }
        records
            .iter()
            .map(|r| r.tokens.iter().map(|t| doc_freq.get(t.as_str()).copied().unwrap_or(0)).sum())
            .collect()
    }

    /// Up to `max_points` sentences, highest score first. Equal scores keep
    /// their input order; case-insensitive repeats of an already selected
    /// sentence are skipped.
    pub fn summarize<S: AsRef<str>>(&self, messages: &[S]) -> Vec<String> {
        let records = self.sentences(messages);
        let scores = self.scores(&records);
        let mut ranked: Vec<usize> = (0..records.len()).collect();
        ranked.sort_by(|a, b| scores[*b].cmp(&scores[*a]));

        let mut seen: HashSet<String> = HashSet::new();
        let mut points = Vec::new();
        for idx in ranked {
            if points.len() >= self.max_points {
                break;
            }
            let text = &records[idx].text;
            if seen.insert(text.to_lowercase()) {
                points.push(text.clone());
            }
        }
        points
    }
}

/// Summarize with the built-in stop-words and the default point limit.
pub fn summarize<S: AsRef<str>>(messages: &[S]) -> Vec<String> {
    ExtractiveSummarizer::default().summarize(messages)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedPoint {
    pub text: String,
    pub count: usize,
}

/// Rank points by how many times they occur across `groups` (one group per
/// day), highest count first and alphabetical among equal counts.
pub fn rank_by_occurrence<G, S>(groups: G, limit: usize) -> Vec<RankedPoint>
where
    G: IntoIterator,
    G::Item: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for group in groups {
        for point in group {
            *counts.entry(point.as_ref().to_string()).or_insert(0) += 1;
        }
    }
    counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .take(limit)
        .map(|(text, count)| RankedPoint { text, count })
        .collect()
}
