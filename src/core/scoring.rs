//! Lexical relevance scoring for a single (query, candidate) pair.
//!
//! Signals are accumulated in order: exact phrase, term proximity, then a
//! per-term cascade of substring, fuzzy (Levenshtein) and stem matching.
//! Every query term must be covered by the title or the description,
//! otherwise the candidate is rejected outright. Candidates that pass get
//! coverage bonuses on top.

use std::collections::HashSet;

const EXACT_TITLE_POINTS: f64 = 100.0;
const EXACT_DESCRIPTION_POINTS: f64 = 80.0;

/// Maximum word distance between adjacent terms that still earns a bonus.
const PROXIMITY_WINDOW: usize = 3;
const PROXIMITY_TITLE_WEIGHT: f64 = 2.0;
const PROXIMITY_DESCRIPTION_WEIGHT: f64 = 1.5;

/// Upper bound on the edit distance accepted as a typo.
const MAX_FUZZY_DISTANCE: usize = 2;
const FUZZY_DISTANCE_RATIO: f64 = 0.3;

/// Words shorter than this are never stemmed.
const MIN_STEM_LENGTH: usize = 4;

/// Suffix rewrite rules, first match wins.
const STEM_RULES: &[(&str, &str)] = &[
    ("ies", "y"),
    ("ied", "y"),
    ("ying", ""),
    ("ing", ""),
    ("ly", ""),
    ("ed", ""),
    ("s", ""),
    ("er", ""),
    ("est", ""),
];

const MAX_MATCH_DETAILS: usize = 3;

/// Result of scoring one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutcome {
    pub score: f64,
    pub match_details: Vec<String>,
    pub matches_all_terms: bool,
}

impl MatchOutcome {
    fn rejected() -> Self {
        Self {
            score: 0.0,
            match_details: Vec::new(),
            matches_all_terms: false,
        }
    }

    /// Whether the candidate belongs in the result set.
    pub fn is_match(&self) -> bool {
        self.score > 0.0 && self.matches_all_terms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Description,
}

impl Field {
    fn label(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
        }
    }
}

/// How a single term was found in a field.
#[derive(Debug, Clone, PartialEq)]
enum TermHit {
    Substring { frequency: f64 },
    Fuzzy { word: String },
    Stem { word: String },
}

impl TermHit {
    fn points(&self, field: Field) -> f64 {
        match (self, field) {
            (TermHit::Substring { frequency }, Field::Title) => 20.0 + 10.0 * frequency,
            (TermHit::Substring { frequency }, Field::Description) => 15.0 + 8.0 * frequency,
            (TermHit::Fuzzy { .. }, Field::Title) => 15.0,
            (TermHit::Fuzzy { .. }, Field::Description) => 12.0,
            (TermHit::Stem { .. }, Field::Title) => 12.0,
            (TermHit::Stem { .. }, Field::Description) => 10.0,
        }
    }

    fn describe(&self, term: &str, field: Field) -> String {
        match self {
            TermHit::Substring { .. } => format!("\"{}\" in {}", term, field.label()),
            TermHit::Fuzzy { word } => {
                format!("\"{}\" ~ \"{}\" (typo) in {}", term, word, field.label())
            }
            TermHit::Stem { word } => {
                format!("\"{}\" ~ \"{}\" (word form) in {}", term, word, field.label())
            }
        }
    }
}

/// Score a candidate against a query.
///
/// `terms` should come from [`crate::core::terms::split_terms`] applied to
/// `raw_query`.
pub fn score(title: &str, description: &str, raw_query: &str, terms: &[String]) -> MatchOutcome {
    let title_lower = title.to_lowercase();
    let description_lower = description.to_lowercase();
    let query_lower = raw_query.trim().to_lowercase();
    let title_words = words(&title_lower);
    let description_words = words(&description_lower);

    let mut score = 0.0;
    let mut details = Vec::new();
    let mut title_matches: HashSet<&str> = HashSet::new();
    let mut description_matches: HashSet<&str> = HashSet::new();

    // 1. Exact phrase. Covers every term on its own.
    if !query_lower.is_empty() {
        if title_lower.contains(&query_lower) {
            score += EXACT_TITLE_POINTS;
            title_matches.extend(terms.iter().map(String::as_str));
            details.push("Exact match in title".to_string());
        }
        if description_lower.contains(&query_lower) {
            score += EXACT_DESCRIPTION_POINTS;
            description_matches.extend(terms.iter().map(String::as_str));
            details.push("Exact match in description".to_string());
        }
    }

    // 2. Adjacent terms close to each other.
    for pair in terms.windows(2) {
        let (first, second) = (&pair[0], &pair[1]);
        if let Some(bonus) = proximity_bonus(&title_words, first, second) {
            score += bonus * PROXIMITY_TITLE_WEIGHT;
            details.push(format!("\"{} {}\" close together in title", first, second));
        }
        if let Some(bonus) = proximity_bonus(&description_words, first, second) {
            score += bonus * PROXIMITY_DESCRIPTION_WEIGHT;
            details.push(format!(
                "\"{} {}\" close together in description",
                first, second
            ));
        }
    }

    // 3. Per-term cascade for terms the exact phrase didn't cover.
    for term in terms {
        let term = term.as_str();
        if title_matches.contains(term) || description_matches.contains(term) {
            continue;
        }

        if let Some(hit) = match_term(term, &title_lower, &title_words) {
            score += hit.points(Field::Title);
            details.push(hit.describe(term, Field::Title));
            title_matches.insert(term);
        }
        if let Some(hit) = match_term(term, &description_lower, &description_words) {
            score += hit.points(Field::Description);
            details.push(hit.describe(term, Field::Description));
            description_matches.insert(term);
        }
    }

    // 4. AND-gate.
    let covers_all = terms
        .iter()
        .all(|t| title_matches.contains(t.as_str()) || description_matches.contains(t.as_str()));
    if !covers_all {
        return MatchOutcome::rejected();
    }

    // 5. Coverage bonuses.
    let title_count = title_matches.len() as f64;
    let description_count = description_matches.len() as f64;
    let total = title_count + description_count;
    score += 10.0 * total;
    if !terms.is_empty() {
        score += 50.0 * (total / (terms.len() as f64 * 2.0));
    }
    score += 25.0 * title_count;
    score += 10.0 * description_count;

    details.truncate(MAX_MATCH_DETAILS);

    MatchOutcome {
        score,
        match_details: details,
        matches_all_terms: true,
    }
}

/// Run the substring -> fuzzy -> stem cascade for one term in one field.
fn match_term(term: &str, text: &str, text_words: &[&str]) -> Option<TermHit> {
    if text.contains(term) {
        return Some(TermHit::Substring {
            frequency: term_frequency(term, text_words),
        });
    }

    if let Some(word) = text_words.iter().find(|w| is_fuzzy_match(term, w)) {
        return Some(TermHit::Fuzzy {
            word: word.to_string(),
        });
    }

    let term_stem = stem(term);
    if term_stem.is_empty() {
        return None;
    }
    text_words
        .iter()
        .find(|w| stem(w) == term_stem)
        .map(|w| TermHit::Stem {
            word: w.to_string(),
        })
}

/// Share of words that contain the term.
fn term_frequency(term: &str, text_words: &[&str]) -> f64 {
    if text_words.is_empty() {
        return 0.0;
    }
    let hits = text_words.iter().filter(|w| w.contains(term)).count();
    hits as f64 / text_words.len() as f64
}

/// Edit-distance threshold for a pair of strings.
pub fn fuzzy_threshold(a: &str, b: &str) -> usize {
    let longest = a.chars().count().max(b.chars().count());
    let scaled = (FUZZY_DISTANCE_RATIO * longest as f64).floor() as usize;
    MAX_FUZZY_DISTANCE.min(scaled)
}

pub fn is_fuzzy_match(term: &str, word: &str) -> bool {
    strsim::levenshtein(term, word) <= fuzzy_threshold(term, word)
}

/// Naive suffix-stripping stemmer.
pub fn stem(word: &str) -> String {
    if word.chars().count() < MIN_STEM_LENGTH {
        return word.to_string();
    }
    for (suffix, replacement) in STEM_RULES {
        if let Some(base) = word.strip_suffix(suffix) {
            return format!("{}{}", base, replacement);
        }
    }
    word.to_string()
}

/// Bonus for two terms appearing near each other, if within the window.
fn proximity_bonus(text_words: &[&str], first: &str, second: &str) -> Option<f64> {
    let first_pos = text_words.iter().position(|w| w.contains(first))?;
    let second_pos = text_words.iter().position(|w| w.contains(second))?;
    let distance = first_pos.abs_diff(second_pos);
    if distance > PROXIMITY_WINDOW {
        return None;
    }
    Some((10.0 - 2.0 * distance as f64).max(0.0))
}

/// Split lowercased text into words, trimming surrounding punctuation.
fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '_'))
        .filter(|w| !w.is_empty())
        .collect()
}
