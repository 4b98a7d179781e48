//! Relevance scoring between a task description and a trigger description.
//!
//! Any [`Scorer`] is acceptable to the selector as long as a higher score means
//! more relevant. Scores are expected in `[0, 1]`.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::sync::Arc;
use tome_config::{ScoringStrategy, SelectorConfig};

/// Scores how relevant a task is to a trigger description.
pub trait Scorer: Send + Sync {
    /// Strategy name, for logs and CLI output.
    fn name(&self) -> &str;

    /// Relevance of `task` to `trigger`, in `[0, 1]`.
    fn score(&self, task: &str, trigger: &str) -> f32;
}

/// Build the scorer a [`SelectorConfig`] asks for.
pub fn scorer_for(config: &SelectorConfig) -> Arc<dyn Scorer> {
    match config.strategy {
        ScoringStrategy::Lexical => Arc::new(LexicalScorer),
        ScoringStrategy::Hashed => {
            Arc::new(EmbeddingScorer::new(HashingEmbedder::new(config.embedding_dims)))
        }
    }
}

// ── Tokenization ───────────────────────────────────────────────

static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "an", "and", "are", "as", "at", "be", "but", "by", "can", "could", "do",
        "does", "for", "from", "get", "had", "has", "have", "help", "how", "i", "if", "in",
        "into", "is", "it", "its", "let", "like", "me", "my", "need", "of", "on", "or", "our",
        "please", "should", "so", "some", "that", "the", "their", "them", "then", "there",
        "these", "this", "to", "up", "us", "want", "was", "we", "what", "when", "where", "which",
        "while", "who", "why", "will", "with", "would", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Lowercased, stemmed, stopword-free tokens of `text`, deduplicated in order
/// of first appearance.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(w.as_str()))
        .map(|w| stem(&w))
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

/// Light suffix stripping so `publishing`, `publishes` and `publish` agree.
fn stem(word: &str) -> String {
    let len = word.len();
    let mut w = if len > 4 && word.ends_with("ies") {
        format!("{}y", &word[..len - 3])
    } else if len > 5 && word.ends_with("ing") {
        word[..len - 3].to_string()
    } else if len > 4 && word.ends_with("ed") {
        word[..len - 2].to_string()
    } else if len > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..len - 1].to_string()
    } else {
        word.to_string()
    };
    if w.len() > 4 && w.ends_with('e') {
        w.pop();
    }
    w
}

// ── Lexical ────────────────────────────────────────────────────

/// Overlap coefficient of the two token sets: `|T ∩ D| / min(|T|, |D|)`.
///
/// Normalizing by the smaller set keeps short requests from being punished by
/// long trigger descriptions (and vice versa).
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalScorer;

impl Scorer for LexicalScorer {
    fn name(&self) -> &str {
        "lexical"
    }

    fn score(&self, task: &str, trigger: &str) -> f32 {
        let task: HashSet<String> = tokenize(task).into_iter().collect();
        let trigger: HashSet<String> = tokenize(trigger).into_iter().collect();
        let smaller = task.len().min(trigger.len());
        if smaller == 0 {
            return 0.0;
        }
        task.intersection(&trigger).count() as f32 / smaller as f32
    }
}

// ── Embeddings ─────────────────────────────────────────────────

/// Turns text into a fixed-size vector.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Vec<f32>;

    /// The dimensionality of the output embeddings.
    fn dimensions(&self) -> usize;

    fn name(&self) -> &str;
}

/// Feature-hashed bag of words. Stable across processes (FNV-1a, not the
/// randomized std hasher).
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dims: usize,
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl Embedder for HashingEmbedder {
    fn embed(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0; self.dims];
        for token in tokenize(text) {
            let slot = (fnv1a(token.as_bytes()) % self.dims as u64) as usize;
            v[slot] += 1.0;
        }
        v
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        "hashed"
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}

/// Cosine similarity of the two embeddings, clamped to `[0, 1]`.
pub struct EmbeddingScorer<E> {
    embedder: E,
}

impl<E: Embedder> EmbeddingScorer<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}

impl<E: Embedder> Scorer for EmbeddingScorer<E> {
    fn name(&self) -> &str {
        self.embedder.name()
    }

    fn score(&self, task: &str, trigger: &str) -> f32 {
        let a = self.embedder.embed(task);
        let b = self.embedder.embed(trigger);
        cosine_similarity(&a, &b).clamp(0.0, 1.0)
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_stopwords_and_stems() {
        assert_eq!(
            tokenize("I want to containerize and publish my build"),
            vec!["containeriz", "publish", "build"]
        );
        assert_eq!(
            tokenize("composing and publishing environments"),
            vec!["compos", "publish", "environment"]
        );
    }

    #[test]
    fn tokenize_splits_on_punctuation_and_dedupes() {
        assert_eq!(tokenize("nix-expressions, Nix expression!"), vec!["nix", "expression"]);
    }

    #[test]
    fn tokenize_empty_and_stopword_only() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t\n").is_empty());
        assert!(tokenize("how do I do it?").is_empty());
    }

    #[test]
    fn stem_variants_agree() {
        assert_eq!(stem("publishing"), stem("publish"));
        assert_eq!(stem("publishes"), stem("publish"));
        assert_eq!(stem("packages"), "packag");
        assert_eq!(stem("packaging"), "packag");
        assert_eq!(stem("dependencies"), "dependency");
        assert_eq!(stem("class"), "class");
        assert_eq!(stem("nix"), "nix");
    }

    #[test]
    fn lexical_overlap_coefficient() {
        let s = LexicalScorer;
        assert_eq!(s.score("build", "packaging and build steps"), 1.0);
        let partial = s.score("containerize and publish my build", "packaging and build steps");
        assert!((partial - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(s.score("weather forecast", "packaging and build steps"), 0.0);
        assert_eq!(s.score("", "packaging and build steps"), 0.0);
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn hashing_embedder_is_deterministic() {
        let a = HashingEmbedder::new(64).embed("publish an environment");
        let b = HashingEmbedder::new(64).embed("publish an environment");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(a.iter().sum::<f32>(), 2.0);
    }

    #[test]
    fn hashed_scorer_prefers_related_text() {
        let s = EmbeddingScorer::new(HashingEmbedder::default());
        let trigger = "composing and publishing environments";
        assert!((s.score(trigger, trigger) - 1.0).abs() < 1e-6);
        let related = s.score("publish my environment", trigger);
        let unrelated = s.score("rotate kubernetes secrets", trigger);
        assert!(related > unrelated);
        assert_eq!(s.name(), "hashed");
    }

    #[test]
    fn scorer_for_config() {
        let mut config = SelectorConfig::default();
        assert_eq!(scorer_for(&config).name(), "lexical");
        config.strategy = ScoringStrategy::Hashed;
        assert_eq!(scorer_for(&config).name(), "hashed");
    }
}
