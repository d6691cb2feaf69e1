//! Review sentiment scoring.
//!
//! Two interchangeable backends sit behind [`Scorer`]:
//!
//! - [`LexiconScorer`]: valence-lexicon scoring with negation, booster words,
//!   capitalisation and punctuation emphasis, normalised to a compound score in [-1, 1].
//!   Ships a compact built-in lexicon; a full lexicon in `term<TAB>score` format can be
//!   loaded from disk.
//! - [`KeywordScorer`]: `(positive - negative) / (tokens + 1)` over fixed word sets.
//!
//! [`Classifier`] turns either score into a [`Sentiment`] label with the shared
//! `±0.05` thresholds.

use super::keywords::word_tokens;
use crate::amazon::models::Sentiment;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// A polarity scoring backend.
pub trait Scorer: Send + Sync {
    /// Backend name, recorded in diagnostics.
    fn name(&self) -> &'static str;

    /// Polarity score; positive means favourable.
    fn score(&self, text: &str) -> f64;
}

/// Which backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentBackend {
    /// Lexicon when one is available, keyword counting otherwise
    #[default]
    Auto,
    Lexicon,
    Keyword,
}

impl std::str::FromStr for SentimentBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(SentimentBackend::Auto),
            "lexicon" | "vader" => Ok(SentimentBackend::Lexicon),
            "keyword" | "keywords" => Ok(SentimentBackend::Keyword),
            _ => Err(format!("Unknown sentiment backend: {}. Use: auto, lexicon, keyword", s)),
        }
    }
}

impl fmt::Display for SentimentBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentBackend::Auto => write!(f, "auto"),
            SentimentBackend::Lexicon => write!(f, "lexicon"),
            SentimentBackend::Keyword => write!(f, "keyword"),
        }
    }
}

/// Labels review texts with a polarity score and a three-way sentiment.
pub struct Classifier {
    scorer: Box<dyn Scorer>,
}

impl Classifier {
    pub fn new(scorer: Box<dyn Scorer>) -> Self {
        Self { scorer }
    }

    /// Built-in lexicon backend.
    pub fn lexicon() -> Self {
        Self::new(Box::new(LexiconScorer::builtin()))
    }

    /// Keyword-counting backend.
    pub fn keyword() -> Self {
        Self::new(Box::new(KeywordScorer))
    }

    /// Picks a backend from configuration.
    ///
    /// With `Auto`, a lexicon file that fails to load degrades to keyword scoring;
    /// with `Lexicon` it is an error.
    pub fn from_settings(backend: SentimentBackend, lexicon_path: Option<&Path>) -> Result<Self> {
        match (backend, lexicon_path) {
            (SentimentBackend::Keyword, _) => Ok(Self::keyword()),
            (SentimentBackend::Lexicon, Some(path)) => {
                Ok(Self::new(Box::new(LexiconScorer::builtin().with_file(path)?)))
            }
            (SentimentBackend::Auto, Some(path)) => match LexiconScorer::builtin().with_file(path) {
                Ok(scorer) => Ok(Self::new(Box::new(scorer))),
                Err(err) => {
                    warn!("{:#}. Falling back to keyword sentiment.", err);
                    Ok(Self::keyword())
                }
            },
            (_, None) => Ok(Self::lexicon()),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.scorer.name()
    }

    /// Scores a text and labels it: `>= 0.05` positive, `<= -0.05` negative.
    pub fn classify(&self, text: &str) -> (f64, Sentiment) {
        let polarity = self.scorer.score(text);
        (polarity, Sentiment::from_polarity(polarity))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::lexicon()
    }
}

// ---------------------------------------------------------------------------
// Keyword backend
// ---------------------------------------------------------------------------

const POSITIVE_WORDS: &[&str] =
    &["good", "great", "excellent", "best", "love", "lovely", "nice", "happy", "fantastic", "amazing"];

const NEGATIVE_WORDS: &[&str] =
    &["bad", "worst", "disappointed", "disappointing", "poor", "terrible", "awful", "hate"];

/// Counts fixed positive and negative words.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordScorer;

impl Scorer for KeywordScorer {
    fn name(&self) -> &'static str {
        "keyword"
    }

    fn score(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let words: Vec<&str> = word_tokens(&lower).collect();
        let pos = words.iter().filter(|w| POSITIVE_WORDS.contains(w)).count() as f64;
        let neg = words.iter().filter(|w| NEGATIVE_WORDS.contains(w)).count() as f64;
        (pos - neg) / (words.len() as f64 + 1.0)
    }
}

// ---------------------------------------------------------------------------
// Lexicon backend
// ---------------------------------------------------------------------------

/// Added to a booster's scalar, or a word's valence, for emphasis.
const B_INCR: f64 = 0.293;
const B_DECR: f64 = -0.293;
/// Extra valence for an ALL-CAPS word in otherwise mixed-case text.
const C_INCR: f64 = 0.733;
/// Multiplier applied to negated valences.
const N_SCALAR: f64 = -0.74;
/// Normalisation constant for the compound score.
const ALPHA: f64 = 15.0;

/// Compact valence table covering common product-review vocabulary.
const BUILTIN_LEXICON: &[(&str, f64)] = &[
    ("amazing", 2.8), ("awesome", 3.1), ("beautiful", 2.9), ("best", 3.2), ("better", 1.9),
    ("brilliant", 2.8), ("comfortable", 1.5), ("cool", 1.3), ("easy", 1.9), ("enjoy", 2.2),
    ("enjoyed", 2.3), ("excellent", 2.7), ("fabulous", 2.4), ("fantastic", 2.6), ("fine", 0.8),
    ("fun", 2.3), ("glad", 2.0), ("good", 1.9), ("great", 3.1), ("happy", 2.7),
    ("helpful", 1.9), ("impressed", 2.1), ("impressive", 2.3), ("like", 1.5), ("liked", 1.8),
    ("love", 3.2), ("loved", 2.9), ("lovely", 2.8), ("loves", 2.7), ("nice", 1.8),
    ("ok", 0.9), ("okay", 0.9), ("perfect", 2.7), ("perfectly", 3.2), ("pleasant", 2.3),
    ("pleased", 1.9), ("recommend", 1.5), ("recommended", 1.9), ("reliable", 0.9),
    ("satisfied", 1.8), ("smooth", 1.0), ("solid", 0.6), ("super", 2.9), ("superb", 3.1),
    ("useful", 1.9), ("value", 0.8), ("win", 2.8), ("wonderful", 2.7), ("worth", 0.9),
    ("annoying", -1.7), ("awful", -2.0), ("bad", -2.5), ("boring", -1.3), ("broke", -1.8),
    ("broken", -2.1), ("cheap", -0.5), ("damaged", -2.2), ("dead", -3.3), ("defective", -2.0),
    ("difficult", -1.5), ("disappointed", -1.9), ("disappointing", -2.2), ("fail", -2.5),
    ("failed", -2.3), ("fails", -2.2), ("fake", -2.1), ("faulty", -1.8), ("garbage", -1.8),
    ("hate", -2.7), ("hated", -3.2), ("horrible", -2.5), ("issue", -0.9), ("issues", -0.9),
    ("lacking", -1.3), ("mediocre", -1.0), ("pathetic", -2.7), ("poor", -2.1),
    ("problem", -1.7), ("problems", -1.7), ("regret", -1.8), ("sad", -2.1), ("scam", -2.6),
    ("terrible", -2.1), ("uncomfortable", -1.6), ("unhappy", -1.8), ("useless", -1.8),
    ("waste", -1.8), ("wasted", -2.2), ("weak", -1.9), ("worse", -2.1), ("worst", -3.1),
    ("wrong", -2.1),
];

const BOOSTERS_UP: &[&str] = &[
    "absolutely", "amazingly", "completely", "considerably", "decidedly", "deeply",
    "enormously", "entirely", "especially", "exceptionally", "extremely", "greatly", "highly",
    "hugely", "incredibly", "intensely", "particularly", "purely", "quite", "really",
    "remarkably", "so", "substantially", "thoroughly", "totally", "tremendously",
    "unbelievably", "unusually", "utterly", "very", "most", "more",
];

const BOOSTERS_DOWN: &[&str] = &[
    "almost", "barely", "hardly", "less", "little", "marginally", "occasionally", "partly",
    "scarcely", "slightly", "somewhat", "sort",
];

const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nothing", "nowhere", "neither", "nor", "without", "cannot",
    "aint", "cant", "dont", "didnt", "doesnt", "isnt", "wasnt", "werent", "wont", "wouldnt",
    "couldnt", "shouldnt", "hasnt", "havent", "hadnt",
];

/// Valence-lexicon scorer producing a compound score in [-1, 1].
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    lexicon: HashMap<String, f64>,
    boosters_up: HashSet<&'static str>,
    boosters_down: HashSet<&'static str>,
}

impl LexiconScorer {
    /// Scorer over the built-in lexicon.
    pub fn builtin() -> Self {
        Self {
            lexicon: BUILTIN_LEXICON.iter().map(|(w, v)| (w.to_string(), *v)).collect(),
            boosters_up: BOOSTERS_UP.iter().copied().collect(),
            boosters_down: BOOSTERS_DOWN.iter().copied().collect(),
        }
    }

    /// Extends (and overrides) the lexicon with entries from a `term<TAB>score` file.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon file: {}", path.display()))?;

        let entries = parse_lexicon(&content);
        if entries.is_empty() {
            bail!("Lexicon file has no valid entries: {}", path.display());
        }

        debug!("Loaded {} lexicon entries from {}", entries.len(), path.display());
        self.lexicon.extend(entries);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.lexicon.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lexicon.is_empty()
    }

    /// Scalar contributed by a preceding booster word, signed to match `valence`.
    fn booster_scalar(&self, word: &str, valence: f64, emphasised: bool) -> f64 {
        let mut scalar = if self.boosters_up.contains(word) {
            B_INCR
        } else if self.boosters_down.contains(word) {
            B_DECR
        } else {
            return 0.0;
        };

        if valence < 0.0 {
            scalar = -scalar;
        }
        if emphasised {
            scalar += if valence > 0.0 { C_INCR } else { -C_INCR };
        }
        scalar
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Scorer for LexiconScorer {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    fn score(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return 0.0;
        }

        let lower: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        let cap_differential = has_cap_differential(&tokens);
        let mut sentiments = Vec::with_capacity(tokens.len());

        for (i, word) in lower.iter().enumerate() {
            let is_booster =
                self.boosters_up.contains(word.as_str()) || self.boosters_down.contains(word.as_str());
            let valence = match self.lexicon.get(word) {
                Some(v) if !is_booster => *v,
                _ => {
                    sentiments.push(0.0);
                    continue;
                }
            };

            let mut valence = valence;
            if cap_differential && is_all_caps(tokens[i]) {
                valence += if valence > 0.0 { C_INCR } else { -C_INCR };
            }

            for distance in 1..=i.min(3) {
                let prev = &lower[i - distance];
                if self.lexicon.contains_key(prev) {
                    continue;
                }

                let emphasised = cap_differential && is_all_caps(tokens[i - distance]);
                let mut scalar = self.booster_scalar(prev, valence, emphasised);
                match distance {
                    2 => scalar *= 0.95,
                    3 => scalar *= 0.9,
                    _ => {}
                }
                valence += scalar;

                if is_negation(prev) {
                    valence *= N_SCALAR;
                }
            }

            sentiments.push(valence);
        }

        apply_but_rule(&lower, &mut sentiments);

        let mut sum: f64 = sentiments.iter().sum();
        if sum != 0.0 {
            let emphasis = punctuation_emphasis(text);
            sum += if sum > 0.0 { emphasis } else { -emphasis };
        }

        normalize(sum)
    }
}

/// Parses `term<TAB>score[<TAB>...]` lines, skipping anything malformed.
fn parse_lexicon(content: &str) -> Vec<(String, f64)> {
    content
        .lines()
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let term = parts.next()?.trim();
            let score = parts.next()?.trim().parse().ok()?;
            if term.is_empty() {
                return None;
            }
            Some((term.to_lowercase(), score))
        })
        .collect()
}

/// Whitespace tokens with surrounding punctuation removed; single characters dropped.
fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
        .filter(|t| t.chars().count() > 1)
        .collect()
}

fn is_all_caps(token: &str) -> bool {
    token.chars().any(|c| c.is_alphabetic()) && token == token.to_uppercase()
}

/// True when some, but not all, tokens are ALL CAPS.
fn has_cap_differential(tokens: &[&str]) -> bool {
    let caps = tokens.iter().filter(|t| is_all_caps(t)).count();
    caps > 0 && caps < tokens.len()
}

fn is_negation(word: &str) -> bool {
    let bare: String = word.chars().filter(|c| *c != '\'').collect();
    NEGATIONS.contains(&bare.as_str()) || word.ends_with("n't")
}

/// Halves sentiment before "but" and boosts it by half after.
fn apply_but_rule(words: &[String], sentiments: &mut [f64]) {
    let Some(pivot) = words.iter().position(|w| w == "but") else {
        return;
    };
    for (i, s) in sentiments.iter_mut().enumerate() {
        if i < pivot {
            *s *= 0.5;
        } else if i > pivot {
            *s *= 1.5;
        }
    }
}

/// Emphasis from exclamation marks (up to 4) and repeated question marks.
fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4) as f64 * 0.292;
    let questions = text.matches('?').count();
    let question_amp = match questions {
        0 | 1 => 0.0,
        2..=3 => questions as f64 * 0.18,
        _ => 0.96,
    };
    exclamations + question_amp
}

/// Maps a raw valence sum into [-1, 1].
fn normalize(score: f64) -> f64 {
    (score / (score * score + ALPHA).sqrt()).clamp(-1.0, 1.0)
}
