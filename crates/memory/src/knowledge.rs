//! Knowledge store and retriever.
//!
//! Facts are embedded once at startup through the injected [`Embedder`] and
//! kept alongside a unit-length copy of each vector. Retrieval embeds the
//! query with the same embedder and ranks facts by dot product, which is
//! cosine similarity on unit vectors.
//!
//! Optionally the computed embeddings are cached as JSON so restarts with a
//! remote or local model do not re-embed the whole file.

use crate::vector;
use parley_core::embedding::{Embedder, Embedding};
use parley_core::error::{EmbeddingError, KnowledgeError};
use parley_core::knowledge::{Fact, ScoredFact};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of facts returned per query.
pub const DEFAULT_K: usize = 3;

/// An immutable set of embedded facts. Shared read-only between sessions.
pub struct KnowledgeStore {
    facts: Vec<Fact>,
    unit_vectors: Vec<Embedding>,
    embedder: Arc<dyn Embedder>,
}

/// On-disk form of the index cache.
#[derive(Debug, Serialize, Deserialize)]
struct IndexCache {
    embedder: String,
    dimension: usize,
    facts: Vec<Fact>,
}

/// Trim lines and drop blank ones.
fn clean_lines<I, S>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .map(|l| l.as_ref().trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

impl KnowledgeStore {
    /// Build a store from fact lines, embedding each one.
    ///
    /// Blank lines are skipped and whitespace is trimmed; ids are assigned in
    /// order of the kept lines. An empty input gives an empty store.
    pub async fn load<I, S>(lines: I, embedder: Arc<dyn Embedder>) -> Result<Self, KnowledgeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let texts = clean_lines(lines);
        let facts = Self::embed_facts(texts, embedder.as_ref()).await?;
        Ok(Self::from_facts(facts, embedder))
    }

    /// Like [`KnowledgeStore::load`], reusing `cache` when it matches the
    /// embedder and the fact texts, and rewriting it otherwise.
    pub async fn load_cached<I, S>(
        lines: I,
        embedder: Arc<dyn Embedder>,
        cache: &Path,
    ) -> Result<Self, KnowledgeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let texts = clean_lines(lines);

        match read_cache(cache) {
            Ok(Some(cached)) if cached.matches(embedder.name(), &texts) => {
                info!(path = %cache.display(), facts = cached.facts.len(), "Reusing index cache");
                return Ok(Self::from_facts(cached.facts, embedder));
            }
            Ok(Some(_)) => {
                debug!(path = %cache.display(), "Index cache is stale, re-embedding");
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Ignoring index cache"),
        }

        let facts = Self::embed_facts(texts, embedder.as_ref()).await?;
        let store = Self::from_facts(facts, embedder);

        if let Err(e) = store.write_cache(cache) {
            warn!(error = %e, "Failed to write index cache");
        }
        Ok(store)
    }

    /// Read a knowledge file (one fact per line) and build the store.
    ///
    /// Unlike [`KnowledgeStore::load`], a file without facts is an error.
    pub async fn from_file(
        path: &Path,
        embedder: Arc<dyn Embedder>,
        cache: Option<&Path>,
    ) -> Result<Self, KnowledgeError> {
        if !path.exists() {
            return Err(KnowledgeError::Missing {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| KnowledgeError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if content.lines().all(|l| l.trim().is_empty()) {
            return Err(KnowledgeError::Empty {
                path: path.to_path_buf(),
            });
        }

        let store = match cache {
            Some(cache) => Self::load_cached(content.lines(), embedder, cache).await?,
            None => Self::load(content.lines(), embedder).await?,
        };

        info!(
            path = %path.display(),
            facts = store.len(),
            embedder = store.embedder_name(),
            "Knowledge base loaded"
        );
        Ok(store)
    }

    async fn embed_facts(
        texts: Vec<String>,
        embedder: &dyn Embedder,
    ) -> Result<Vec<Fact>, KnowledgeError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let vectors = embedder.embed(&texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            }
            .into());
        }

        let expected = embedder
            .dimension()
            .unwrap_or_else(|| vectors.first().map_or(0, Vec::len));
        if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: bad.len(),
            }
            .into());
        }

        Ok(texts
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(id, (text, embedding))| Fact { id, text, embedding })
            .collect())
    }

    fn from_facts(facts: Vec<Fact>, embedder: Arc<dyn Embedder>) -> Self {
        let unit_vectors = facts
            .iter()
            .map(|f| {
                let mut v = f.embedding.clone();
                vector::normalize(&mut v);
                v
            })
            .collect();

        Self {
            facts,
            unit_vectors,
            embedder,
        }
    }

    /// Return the `k` facts most similar to `query`, best first.
    ///
    /// Ties keep insertion order. An empty store returns nothing without
    /// calling the embedder.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredFact>, EmbeddingError> {
        if self.facts.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut query_vector = self.embedder.embed_one(query).await?;
        if let Some(expected) = self.dimension() {
            if query_vector.len() != expected {
                return Err(EmbeddingError::DimensionMismatch {
                    expected,
                    actual: query_vector.len(),
                });
            }
        }
        vector::normalize(&mut query_vector);

        let candidates: Vec<&[f32]> = self.unit_vectors.iter().map(Vec::as_slice).collect();
        let ranked = vector::rank(&candidates, &query_vector, k);

        debug!(query, k, returned = ranked.len(), "Retrieved facts");

        Ok(ranked
            .into_iter()
            .map(|(i, score)| ScoredFact {
                fact: self.facts[i].clone(),
                score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// All facts in id order.
    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Vector dimension, or `None` for an empty store.
    pub fn dimension(&self) -> Option<usize> {
        self.facts.first().map(|f| f.embedding.len())
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    fn write_cache(&self, path: &Path) -> Result<(), KnowledgeError> {
        let cache_err = |reason: String| KnowledgeError::Cache {
            path: path.to_path_buf(),
            reason,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| cache_err(e.to_string()))?;
        }

        let cache = IndexCache {
            embedder: self.embedder_name().to_string(),
            dimension: self.dimension().unwrap_or(0),
            facts: self.facts.clone(),
        };
        let json = serde_json::to_string(&cache).map_err(|e| cache_err(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| cache_err(e.to_string()))?;

        debug!(path = %path.display(), "Index cache written");
        Ok(())
    }
}

impl IndexCache {
    fn matches(&self, embedder: &str, texts: &[String]) -> bool {
        self.embedder == embedder
            && self.facts.len() == texts.len()
            && self.facts.iter().zip(texts).all(|(f, t)| &f.text == t)
            && self.facts.iter().all(|f| f.embedding.len() == self.dimension)
    }
}

/// `Ok(None)` when there is no cache file yet.
fn read_cache(path: &Path) -> Result<Option<IndexCache>, KnowledgeError> {
    if !path.exists() {
        return Ok(None);
    }
    let cache_err = |reason: String| KnowledgeError::Cache {
        path: PathBuf::from(path),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|e| cache_err(e.to_string()))?;
    let cache = serde_json::from_str(&content).map_err(|e| cache_err(e.to_string()))?;
    Ok(Some(cache))
}
