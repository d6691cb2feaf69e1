//! Keyword ranking (TF-IDF) and word frequencies over review texts.

use crate::amazon::models::Review;
use crate::analysis::models::{Keyword, WordCount};
use std::collections::HashMap;

/// Terms in more than this share of documents are dropped.
pub const MAX_DOC_FREQ: f64 = 0.85;
/// Terms must appear in at least this many documents.
pub const MIN_DOC_COUNT: usize = 2;
/// Number of entries in the word-frequency table.
pub const TOP_WORDS: usize = 30;


const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "alone", "along",
    "already", "also", "although", "always", "am", "among", "an", "and", "another", "any",
    "anyhow", "anyone", "anything", "anyway", "anywhere", "are", "around", "as", "at", "back",
    "be", "became", "because", "become", "been", "before", "being", "below", "beside",
    "besides", "between", "beyond", "both", "but", "by", "can", "cannot", "could", "did", "do",
    "does", "doing", "done", "down", "due", "during", "each", "either", "else", "enough",
    "etc", "even", "ever", "every", "everyone", "everything", "few", "first", "for", "from",
    "further", "get", "give", "go", "had", "has", "have", "having", "he", "her", "here",
    "hers", "herself", "him", "himself", "his", "how", "however", "if", "in", "into", "is",
    "it", "its", "itself", "just", "keep", "last", "least", "less", "made", "many", "may",
    "me", "meanwhile", "might", "mine", "more", "moreover", "most", "mostly", "much", "must",
    "my", "myself", "neither", "never", "nevertheless", "next", "no", "nobody", "none", "nor",
    "not", "nothing", "now", "of", "off", "often", "on", "once", "one", "only", "onto", "or",
    "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "per",
    "perhaps", "please", "put", "rather", "re", "same", "see", "seem", "seemed", "seems",
    "several", "she", "should", "since", "so", "some", "someone", "something", "sometimes",
    "still", "such", "than", "that", "the", "their", "them", "themselves", "then", "there",
    "therefore", "these", "they", "this", "those", "though", "through", "thus", "to",
    "together", "too", "toward", "towards", "under", "until", "up", "upon", "us", "very",
    "via", "was", "we", "well", "were", "what", "whatever", "when", "whence", "whenever",
    "where", "whether", "which", "while", "who", "whoever", "whole", "whom", "whose", "why",
    "will", "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

/// Runs of Unicode letters, digits and underscores, so "schön" and "très" stay whole.
pub(crate) fn word_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_')).filter(|t| !t.is_empty())
}

/// Lowercased word tokens of two or more characters with stop words removed.
fn content_tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    word_tokens(&lower)
        .filter(|t| t.chars().count() >= 2)
        .filter(|t| !STOP_WORDS.contains(t))
        .map(String::from)
        .collect()
}

/// Unigrams followed by bigrams of adjacent content tokens.
fn terms(text: &str) -> Vec<String> {
    let tokens = content_tokens(text);
    let bigrams = tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1]));
    tokens.iter().cloned().chain(bigrams).collect()
}

/// Ranks terms by TF-IDF summed over all reviews, highest first.
///
/// Uses smoothed idf `ln((1 + n) / (1 + df)) + 1` and L2-normalised document
/// vectors. Equal scores keep first-seen order.
pub fn top_keywords(reviews: &[Review], top_n: usize) -> Vec<Keyword> {
    let docs: Vec<Vec<String>> = reviews.iter().map(|r| terms(&r.text)).collect();
    let n = docs.len();
    if n == 0 || top_n == 0 {
        return Vec::new();
    }

    // Vocabulary in first-seen order, with document frequencies
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut vocab: Vec<&str> = Vec::new();
    let mut doc_freq: Vec<usize> = Vec::new();
    for doc in &docs {
        let mut seen_here: Vec<usize> = Vec::new();
        for term in doc {
            let id = *index.entry(term.as_str()).or_insert_with(|| {
                vocab.push(term.as_str());
                doc_freq.push(0);
                vocab.len() - 1
            });
            if !seen_here.contains(&id) {
                seen_here.push(id);
                doc_freq[id] += 1;
            }
        }
    }

    let max_docs = MAX_DOC_FREQ * n as f64;
    let idf: Vec<Option<f64>> = doc_freq
        .iter()
        .map(|&df| {
            let kept = df >= MIN_DOC_COUNT && df as f64 <= max_docs;
            kept.then(|| ((1.0 + n as f64) / (1.0 + df as f64)).ln() + 1.0)
        })
        .collect();

    let mut totals = vec![0.0_f64; vocab.len()];
    for doc in &docs {
        let mut weights: Vec<(usize, f64)> = Vec::new();
        for term in doc {
            let id = index[term.as_str()];
            let Some(idf) = idf[id] else { continue };
            match weights.iter_mut().find(|(i, _)| *i == id) {
                Some((_, w)) => *w += idf,
                None => weights.push((id, idf)),
            }
        }

        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            continue;
        }
        for (id, w) in weights {
            totals[id] += w / norm;
        }
    }

    let mut ranked: Vec<(usize, f64)> =
        totals.into_iter().enumerate().filter(|(id, _)| idf[*id].is_some()).collect();
    // Stable sort keeps first-seen order among equal scores
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(id, score)| Keyword { term: vocab[id].to_string(), score })
        .collect()
}

/// Counts lowercase words of three or more characters, most common first.
pub fn word_frequencies(reviews: &[Review], top_n: usize) -> Vec<WordCount> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<WordCount> = Vec::new();

    for review in reviews {
        let lower = review.text.to_lowercase();
        for word in word_tokens(&lower).filter(|w| w.chars().count() >= 3) {
            match index.get(word) {
                Some(&i) => counts[i].count += 1,
                None => {
                    index.insert(word.to_string(), counts.len());
                    counts.push(WordCount { word: word.to_string(), count: 1 });
                }
            }
        }
    }

    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(top_n);
    counts
}

/// Keyword and word-frequency views of one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordReport {
    pub top_keywords: Vec<Keyword>,
    pub word_frequencies: Vec<WordCount>,
}

/// Runs both text aggregations over a sample.
pub fn aggregate(reviews: &[Review], top_n: usize) -> KeywordReport {
    KeywordReport {
        top_keywords: top_keywords(reviews, top_n),
        word_frequencies: word_frequencies(reviews, TOP_WORDS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reviews(texts: &[&str]) -> Vec<Review> {
        texts.iter().map(|t| Review::new(Some(4), *t, None, 0.0)).collect()
    }

    fn sample() -> Vec<Review> {
        reviews(&[
            "Battery life is excellent and the sound quality is great",
            "Sound quality is poor but battery life is fine",
            "Great sound, comfortable fit",
            "The fit is loose and the case feels cheap",
            "Case is sturdy, battery life lasts two days",
        ])
    }

    #[test]
    fn test_terms_skip_stop_words_and_pair_neighbours() {
        assert_eq!(
            terms("The battery is GREAT"),
            vec!["battery".to_string(), "great".to_string(), "battery great".to_string()]
        );
        assert!(terms("a I").is_empty());
    }

    #[test]
    fn test_min_and_max_document_frequency() {
        let keywords = top_keywords(&sample(), 50);
        let names: Vec<&str> = keywords.iter().map(|k| k.term.as_str()).collect();

        // In three of five reviews: kept
        assert!(names.contains(&"battery life"));
        assert!(names.contains(&"sound"));
        // In a single review: below min_df
        assert!(!names.contains(&"excellent"));
        assert!(!names.contains(&"sturdy"));
    }

    #[test]
    fn test_terms_in_nearly_every_review_are_dropped() {
        let keywords = top_keywords(
            &reviews(&["phone good", "phone bad", "phone fine", "phone okay", "phone good"]),
            10,
        );
        let names: Vec<&str> = keywords.iter().map(|k| k.term.as_str()).collect();
        assert!(!names.contains(&"phone"));
        // Equal scores: "good" was seen before "phone good"
        assert_eq!(names, vec!["good", "phone good"]);
    }

    #[test]
    fn test_ranking_is_descending_and_idempotent() {
        let reviews = sample();
        let first = top_keywords(&reviews, 20);
        let second = top_keywords(&reviews, 20);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let keywords = top_keywords(&reviews(&["alpha beta", "alpha beta", "gamma delta"]), 10);
        let names: Vec<&str> = keywords.iter().map(|k| k.term.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "alpha beta"]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(top_keywords(&[], 20).is_empty());
        assert!(top_keywords(&sample(), 0).is_empty());
        assert!(word_frequencies(&[], 30).is_empty());
    }

    #[test]
    fn test_word_frequencies() {
        let counts = word_frequencies(&sample(), 3);
        assert_eq!(counts.len(), 3);
        // "battery", "life", "the" and "sound" all appear three times, in that first-seen order
        assert_eq!(counts[0], WordCount { word: "battery".to_string(), count: 3 });
        assert_eq!(counts[1].word, "life");
        assert_eq!(counts[2].word, "the");
    }

    #[test]
    fn test_word_frequencies_ignore_short_words() {
        let counts = word_frequencies(&reviews(&["it is ok, it is so so"]), 30);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let first = aggregate(&sample(), 5);
        let second = aggregate(&sample(), 5);
        assert_eq!(first, second);
        assert_eq!(first.top_keywords.len(), 5);
        assert_eq!(first.word_frequencies[0].word, "battery");
    }

    #[test]
    fn test_accented_words_stay_whole() {
        let sample = reviews(&[
            "Très bon son, très confortable",
            "Klang ist schön und der Akku hält lange",
            "Schön verarbeitet, très pratique",
        ]);

        let words = word_frequencies(&sample, TOP_WORDS);
        let count = |w: &str| words.iter().find(|c| c.word == w).map(|c| c.count);
        assert_eq!(count("très"), Some(3));
        assert_eq!(count("schön"), Some(2));
        assert_eq!(count("hält"), Some(1));
        assert_eq!(count("sch"), None);

        let keywords = top_keywords(&sample, 10);
        assert!(keywords.iter().any(|k| k.term == "schön"));
        assert!(keywords.iter().all(|k| k.term != "tr"));
    }

    #[test]
    fn test_word_tokens_split_on_punctuation() {
        let tokens: Vec<&str> = word_tokens("naïve-café, déjà_vu!").collect();
        assert_eq!(tokens, vec!["naïve", "café", "déjà_vu"]);
    }
}
