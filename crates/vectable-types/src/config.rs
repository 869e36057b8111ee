//! Store configuration: embedding dimension, search options, and the
//! on-disk `vectable.toml` layout.

use serde::{Deserialize, Serialize};

use crate::schema::Schema;

/// Worker count used when none is configured.
pub const DEFAULT_WORKERS: usize = 50;

/// Outlier cutoff used by [`FilterOptions::default`].
pub const DEFAULT_STD_DEVIATIONS: f64 = 1.5;

/// Fixed embedding length for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorConfig {
    pub length: usize,
}

impl VectorConfig {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

/// Similarity measure. Every method scores higher for more similar vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMethod {
    #[default]
    Cosine,
    Euclidean,
    DotProduct,
}

impl std::str::FromStr for SimilarityMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "cosine" => Ok(SimilarityMethod::Cosine),
            "euclidean" => Ok(SimilarityMethod::Euclidean),
            "dot_product" | "dot" => Ok(SimilarityMethod::DotProduct),
            other => Err(format!("unknown similarity method '{other}'")),
        }
    }
}

impl std::fmt::Display for SimilarityMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityMethod::Cosine => write!(f, "cosine"),
            SimilarityMethod::Euclidean => write!(f, "euclidean"),
            SimilarityMethod::DotProduct => write!(f, "dot_product"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SimilarityOptions {
    #[serde(default)]
    pub method: SimilarityMethod,
    /// Concurrent scorers. `None` or zero means [`DEFAULT_WORKERS`].
    #[serde(default)]
    pub workers: Option<usize>,
}

impl SimilarityOptions {
    pub fn new(method: SimilarityMethod, workers: usize) -> Self {
        Self {
            method,
            workers: Some(workers),
        }
    }

    pub fn worker_count(&self) -> usize {
        match self.workers {
            Some(n) if n > 0 => n,
            _ => DEFAULT_WORKERS,
        }
    }
}

/// Ranking options for a similarity query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    #[serde(flatten)]
    pub similarity: SimilarityOptions,
    /// Keep only scores at least this many standard deviations above the
    /// mean. Zero disables the cutoff.
    #[serde(default = "default_std_deviations")]
    pub std_deviations: f64,
    /// Maximum results. Zero means unbounded.
    #[serde(default)]
    pub limit: usize,
}

fn default_std_deviations() -> f64 {
    DEFAULT_STD_DEVIATIONS
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            similarity: SimilarityOptions::default(),
            std_deviations: default_std_deviations(),
            limit: 0,
        }
    }
}

/// Contents of `vectable.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub database_url: String,
    pub vector: VectorConfig,
    pub schema: Schema,
    #[serde(default)]
    pub search: FilterOptions,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_options_default_values() {
        let options = FilterOptions::default();
        assert_eq!(options.std_deviations, 1.5);
        assert_eq!(options.limit, 0);
        assert_eq!(options.similarity.method, SimilarityMethod::Cosine);
        assert_eq!(options.similarity.worker_count(), DEFAULT_WORKERS);
    }

    #[test]
    fn test_worker_count_zero_falls_back() {
        let options = SimilarityOptions::new(SimilarityMethod::DotProduct, 0);
        assert_eq!(options.worker_count(), DEFAULT_WORKERS);
        assert_eq!(
            SimilarityOptions::new(SimilarityMethod::DotProduct, 4).worker_count(),
            4
        );
    }

    #[test]
    fn test_similarity_method_parse() {
        assert_eq!(
            "dot-product".parse::<SimilarityMethod>().unwrap(),
            SimilarityMethod::DotProduct
        );
        assert_eq!(
            "Euclidean".parse::<SimilarityMethod>().unwrap(),
            SimilarityMethod::Euclidean
        );
        assert!("manhattan".parse::<SimilarityMethod>().is_err());
    }

    #[test]
    fn test_store_config_from_toml() {
        let config: StoreConfig = toml::from_str(
            r#"
database_url = "sqlite://vectors.db?mode=rwc"

[vector]
length = 3

[schema]
name = "documents"
columns = [{ name = "user", type = "TEXT" }]

[search]
method = "euclidean"
workers = 8
limit = 5
"#,
        )
        .unwrap();
        assert_eq!(config.vector.length, 3);
        assert_eq!(config.schema.name, "documents");
        assert_eq!(config.search.similarity.method, SimilarityMethod::Euclidean);
        assert_eq!(config.search.similarity.worker_count(), 8);
        assert_eq!(config.search.std_deviations, 1.5);
        assert_eq!(config.search.limit, 5);
    }

    #[test]
    fn test_store_config_search_section_optional() {
        let config: StoreConfig = toml::from_str(
            r#"
database_url = "sqlite::memory:"
vector = { length = 2 }
schema = { name = "t" }
"#,
        )
        .unwrap();
        assert_eq!(config.search, FilterOptions::default());
    }
}
