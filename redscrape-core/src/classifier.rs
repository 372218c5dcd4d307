//! Keyword-density classifier.
//!
//! Text is lower-cased, stop words are stripped, and every category keyword is
//! counted as a whole word or phrase. Matches in the title count again twice
//! over. The highest-scoring category wins, ties going to the earlier category
//! in [`Category::SCORED`] order. Confidence is the winning score relative to a
//! tenth of the normalized word count, capped at 1.0.

use regex::Regex;
use tracing::warn;

use crate::types::{Category, ClassificationResult};
use crate::CoreError;

/// Function words removed before matching. No word here may appear in a
/// keyword phrase of [`CategorySet::standard`].
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "am", "in", "at", "by",
    "and", "or", "but", "if", "its", "this", "that", "these", "those", "me", "we", "our",
    "your", "he", "she", "they", "them", "their", "with", "as", "so", "just", "did",
    "which", "who", "about", "into", "then", "there", "here", "have", "has", "had",
];

const TITLE_WEIGHT: usize = 2;
const DENSITY_FACTOR: f64 = 0.1;

/// Ordered category → keyword table. Immutable once built.
#[derive(Debug, Clone)]
pub struct CategorySet {
    entries: Vec<(Category, Vec<String>)>,
}

impl CategorySet {
    /// Builds a table from arbitrary entries. Entries are put in canonical
    /// category order; `GeneralDiscussion` is the fallback and cannot carry
    /// keywords.
    pub fn new(entries: impl IntoIterator<Item = (Category, Vec<String>)>) -> Self {
        let mut entries: Vec<(Category, Vec<String>)> = entries
            .into_iter()
            .filter(|(category, _)| {
                if *category == Category::GeneralDiscussion {
                    warn!("Ignoring keywords for the fallback category");
                    false
                } else {
                    true
                }
            })
            .collect();
        entries.sort_by_key(|(category, _)| canonical_position(*category));
        Self { entries }
    }

    pub fn standard() -> Self {
        fn words(list: &[&str]) -> Vec<String> {
            list.iter().map(|w| w.to_string()).collect()
        }

        Self::new([
            (
                Category::PainPoints,
                words(&[
                    "problem", "problems", "issue", "issues", "broken", "fix", "error", "bug",
                    "crash", "crashes", "fails", "failing", "frustrated", "frustrating",
                    "annoying", "struggling", "stuck", "doesn't work", "not working", "hate",
                    "worst", "pain",
                ]),
            ),
            (
                Category::SolutionRequests,
                words(&[
                    "how to", "how do i", "help", "looking for", "recommend", "recommendation",
                    "recommendations", "suggestions", "advice", "any tips", "best way",
                    "solution", "tutorial", "guide",
                ]),
            ),
            (
                Category::MoneyTalk,
                words(&[
                    "price", "pricing", "cost", "costs", "money", "pay", "paid", "paying",
                    "budget", "expensive", "cheap", "salary", "subscription", "income",
                    "revenue", "afford", "worth it", "dollars",
                ]),
            ),
            (
                Category::HotDiscussions,
                words(&[
                    "unpopular opinion", "controversial", "debate", "thoughts on",
                    "what do you think", "overrated", "underrated", "rant", "hot take",
                    "change my mind", "agree", "disagree",
                ]),
            ),
            (
                Category::SeekingAlternatives,
                words(&[
                    "alternative", "alternatives", "instead of", "replacement", "replace",
                    "switch from", "switching", "switched", "migrate", "migrating",
                    "similar to", "better than", "competitor",
                ]),
            ),
            (
                Category::WorkStudyRelated,
                words(&[
                    "job", "jobs", "work", "career", "interview", "boss", "coworker",
                    "coworkers", "manager", "office", "study", "studying", "exam", "exams",
                    "university", "college", "class", "homework", "degree", "internship",
                    "resume",
                ]),
            ),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &[String])> {
        self.entries
            .iter()
            .map(|(category, keywords)| (*category, keywords.as_slice()))
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::standard()
    }
}

fn canonical_position(category: Category) -> usize {
    Category::SCORED
        .iter()
        .position(|c| *c == category)
        .unwrap_or(Category::SCORED.len())
}

#[derive(Debug)]
struct CompiledKeyword {
    text: String,
    pattern: Regex,
}

#[derive(Debug)]
struct CompiledCategory {
    category: Category,
    keywords: Vec<CompiledKeyword>,
}

/// Per-category scores for one piece of text, in canonical order.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub scores: Vec<(Category, usize)>,
    pub word_count: usize,
}

impl ScoreCard {
    pub fn score(&self, category: Category) -> usize {
        self.scores
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, score)| *score)
            .unwrap_or(0)
    }

    pub fn result(&self) -> ClassificationResult {
        let mut best: Option<(Category, usize)> = None;
        for &(category, score) in &self.scores {
            if score > best.map(|(_, s)| s).unwrap_or(0) {
                best = Some((category, score));
            }
        }

        match best {
            None => ClassificationResult::general(),
            Some((category, score)) => {
                let denominator = (self.word_count as f64 * DENSITY_FACTOR).max(1.0);
                ClassificationResult {
                    category,
                    confidence: (score as f64 / denominator).min(1.0),
                }
            }
        }
    }
}

/// Pure classifier over a compiled [`CategorySet`]. Holds no per-call state
/// and can be shared freely between threads.
#[derive(Debug)]
pub struct KeywordClassifier {
    categories: Vec<CompiledCategory>,
    stop_words: Option<Regex>,
}

impl KeywordClassifier {
    pub fn new(set: &CategorySet, stop_words: &[&str]) -> Result<Self, CoreError> {
        let stop_list: Vec<String> = stop_words
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        let mut categories = Vec::with_capacity(Category::SCORED.len());

        for (category, keywords) in set.iter() {
            let mut compiled = Vec::with_capacity(keywords.len());
            for keyword in keywords {
                let text = keyword.trim().to_lowercase();
                if text.is_empty() {
                    continue;
                }
                if let Some(stop) = text
                    .split_whitespace()
                    .find(|token| stop_list.iter().any(|w| w == token))
                {
                    warn!(
                        "Keyword '{}' contains stop word '{}' and will never match",
                        text, stop
                    );
                }
                compiled.push(CompiledKeyword {
                    pattern: phrase_pattern(&text)?,
                    text,
                });
            }
            categories.push(CompiledCategory {
                category,
                keywords: compiled,
            });
        }

        let stop_words = if stop_list.is_empty() {
            None
        } else {
            let escaped: Vec<String> = stop_list.iter().map(|w| regex::escape(w)).collect();
            let pattern = format!(r"(?i)\b(?:{})\b", escaped.join("|"));
            Some(Regex::new(&pattern).map_err(|e| CoreError::InvalidInput {
                message: format!("invalid stop word list: {}", e),
            })?)
        };

        Ok(Self {
            categories,
            stop_words,
        })
    }

    /// Classifier over the built-in keyword table and stop words.
    pub fn standard() -> Result<Self, CoreError> {
        Self::new(&CategorySet::standard(), DEFAULT_STOP_WORDS)
    }

    pub fn classify(&self, title: &str, body: &str) -> ClassificationResult {
        self.score(title, body).result()
    }

    pub fn score(&self, title: &str, body: &str) -> ScoreCard {
        let title_lower = title.to_lowercase();
        let normalized = self.normalize(&title_lower, body);
        let word_count = normalized.split_whitespace().count();

        let scores = self
            .categories
            .iter()
            .map(|compiled| {
                let score = compiled
                    .keywords
                    .iter()
                    .map(|keyword| {
                        let combined = keyword.pattern.find_iter(&normalized).count();
                        let in_title = keyword.pattern.find_iter(&title_lower).count();
                        combined + TITLE_WEIGHT * in_title
                    })
                    .sum();
                (compiled.category, score)
            })
            .collect();

        ScoreCard { scores, word_count }
    }

    /// Keywords of `category` in the order they were compiled.
    pub fn keywords(&self, category: Category) -> Vec<&str> {
        self.categories
            .iter()
            .filter(|c| c.category == category)
            .flat_map(|c| c.keywords.iter().map(|k| k.text.as_str()))
            .collect()
    }

    fn normalize(&self, title_lower: &str, body: &str) -> String {
        let combined = format!("{} {}", title_lower, body.to_lowercase());
        match &self.stop_words {
            Some(pattern) => pattern.replace_all(&combined, "").into_owned(),
            None => combined,
        }
    }
}

/// Whole-phrase pattern; words of a phrase may be separated by any run of
/// whitespace.
fn phrase_pattern(phrase: &str) -> Result<Regex, CoreError> {
    let body = phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    Regex::new(&format!(r"\b{}\b", body)).map_err(|e| CoreError::InvalidInput {
        message: format!("invalid keyword '{}': {}", phrase, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::standard().unwrap()
    }

    #[test]
    fn test_printer_title_scores() {
        let classifier = classifier();
        let card = classifier.score("How to fix a broken printer", "");

        // fix: 1 + 2*1, broken: 1 + 2*1
        assert_eq!(card.score(Category::PainPoints), 6);
        // how to: 1 + 2*1
        assert_eq!(card.score(Category::SolutionRequests), 3);
        assert_eq!(card.score(Category::MoneyTalk), 0);
        // "how to fix broken printer" once "a" is stripped
        assert_eq!(card.word_count, 5);

        let result = card.result();
        assert_eq!(result.category, Category::PainPoints);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_empty_text_falls_back() {
        let result = classifier().classify("", "");
        assert_eq!(result, ClassificationResult::general());
        assert_eq!(result.category, Category::GeneralDiscussion);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_no_keywords_falls_back() {
        let result = classifier().classify("Look at my cat", "She is sleeping on the couch");
        assert_eq!(result.category, Category::GeneralDiscussion);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_stop_word_stripping_respects_word_boundaries() {
        let set = CategorySet::new([(Category::WorkStudyRelated, vec!["tomorrow".to_string()])]);
        let classifier = KeywordClassifier::new(&set, &["to"]).unwrap();

        let card = classifier.score("", "meeting tomorrow to discuss");
        assert_eq!(card.score(Category::WorkStudyRelated), 1);
        // "to" removed, "tomorrow" intact
        assert_eq!(card.word_count, 3);
    }

    #[test]
    fn test_phrases_survive_stop_word_stripping() {
        let classifier = classifier();
        let card = classifier.score("", "Anyone know how to do this?");
        assert_eq!(card.score(Category::SolutionRequests), 1);
        let card = classifier.score("", "The export doesn't work");
        assert_eq!(card.score(Category::PainPoints), 1);

        for (_, keywords) in CategorySet::standard().iter() {
            for keyword in keywords {
                for token in keyword.split_whitespace() {
                    assert!(
                        !DEFAULT_STOP_WORDS.contains(&token),
                        "'{}' in '{}' is a stop word",
                        token,
                        keyword
                    );
                }
            }
        }
    }

    #[test]
    fn test_normalized_tokens() {
        let classifier = classifier();
        let normalized = classifier.normalize("the printer on my desk", "Is it broken? And they just left");
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        assert_eq!(
            tokens,
            vec!["printer", "on", "my", "desk", "it", "broken?", "left"]
        );

        let card = classifier.score("", "it is on my list for you");
        assert_eq!(card.word_count, 6);
        let card = classifier.score("", "they were with them at the office");
        assert_eq!(card.word_count, 1);
    }

    #[test]
    fn test_stop_words_are_stripped_even_inside_keywords() {
        let set = CategorySet::new([(Category::SolutionRequests, vec!["how to".to_string()])]);
        let classifier = KeywordClassifier::new(&set, &["to"]).unwrap();

        let card = classifier.score("", "how to start");
        assert_eq!(card.score(Category::SolutionRequests), 0);
        assert_eq!(card.word_count, 2);
    }

    #[test]
    fn test_title_matches_weigh_triple() {
        let classifier = classifier();
        let in_title = classifier.score("Salary question", "");
        let in_body = classifier.score("", "Salary question");
        assert_eq!(in_title.score(Category::MoneyTalk), 3);
        assert_eq!(in_body.score(Category::MoneyTalk), 1);
    }

    #[test]
    fn test_tie_goes_to_canonical_order() {
        // "budget" (Money Talk) and "career" (Work/Study) once each in the body.
        let result = classifier().classify("", "budget career");
        assert_eq!(result.category, Category::MoneyTalk);

        let result = classifier().classify("", "career budget");
        assert_eq!(result.category, Category::MoneyTalk);
    }

    #[test]
    fn test_custom_set_is_reordered_canonically() {
        let set = CategorySet::new([
            (Category::WorkStudyRelated, vec!["shared".to_string()]),
            (Category::PainPoints, vec!["shared".to_string()]),
            (Category::GeneralDiscussion, vec!["ignored".to_string()]),
        ]);
        let categories: Vec<_> = set.iter().map(|(c, _)| c).collect();
        assert_eq!(
            categories,
            vec![Category::PainPoints, Category::WorkStudyRelated]
        );

        let classifier = KeywordClassifier::new(&set, &[]).unwrap();
        assert_eq!(classifier.classify("", "shared").category, Category::PainPoints);
        assert_eq!(
            classifier.classify("", "ignored").category,
            Category::GeneralDiscussion
        );
    }

    #[test]
    fn test_confidence_scales_with_density() {
        let classifier = classifier();
        let filler = "lorem ".repeat(40);
        let body = format!("{filler} budget");
        let result = classifier.classify("", &body);

        // 41 words -> denominator 4.1, score 1
        assert_eq!(result.category, Category::MoneyTalk);
        assert!((result.confidence - 1.0 / 4.1).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_is_bounded() {
        let classifier = classifier();
        let samples = [
            ("", ""),
            ("fix fix fix fix", "broken broken bug error crash"),
            ("Thoughts on pricing?", "Is the subscription worth it or should I switch from it"),
            ("a", "the the the"),
            ("Ünïcödé títle", "çà et là"),
        ];

        for (title, body) in samples {
            let result = classifier.classify(title, body);
            assert!(
                (0.0..=1.0).contains(&result.confidence),
                "confidence {} out of range for {:?}",
                result.confidence,
                (title, body)
            );
        }
    }

    #[test]
    fn test_classify_is_idempotent() {
        let classifier = classifier();
        let first = classifier.classify("Best alternative to Notion?", "Looking for something cheaper");
        let second = classifier.classify("Best alternative to Notion?", "Looking for something cheaper");
        assert_eq!(first, second);
    }

    #[test]
    fn test_multi_word_phrase_tolerates_extra_whitespace() {
        let classifier = classifier();
        let card = classifier.score("", "looking   for a new laptop");
        assert_eq!(card.score(Category::SolutionRequests), 1);
    }

    #[test]
    fn test_keyword_is_not_matched_inside_words() {
        let classifier = classifier();
        // "pay" must not match inside "paypal" or "payday".
        let card = classifier.score("", "paypal payday");
        assert_eq!(card.score(Category::MoneyTalk), 0);
    }

    #[test]
    fn test_classifier_keywords_follow_set() {
        let classifier = classifier();
        let keywords = classifier.keywords(Category::SolutionRequests);
        assert_eq!(keywords.first(), Some(&"how to"));
        assert!(classifier.keywords(Category::GeneralDiscussion).is_empty());
    }
}
