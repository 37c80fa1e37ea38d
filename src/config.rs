//! Sweep configuration, read from TOML.
//!
//! ```toml
//! output = "Results"
//! seed = 42
//! alpha = [0.01, 0.05]
//! window = 5
//! negative = [5, 10]
//!
//! [word2vec]
//! vector_size = 100
//! min_count = 5
//!
//! [[transformers]]
//! root = "intfloat"
//! name = "e5-small-v2"
//! parameters = 33400000
//! ```

use std::path::{Path, PathBuf};

use ahash::AHashSet;
use serde::{de::Error as _, Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    models::word2vec::{Word2VecConfig, DEFAULT_ALPHA, DEFAULT_NEGATIVE, DEFAULT_WINDOW},
};

/// One value or a list of values to sweep over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Axis<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Clone> Axis<T> {
    pub fn values(&self) -> Vec<T> {
        match self {
            Axis::One(v) => vec![v.clone()],
            Axis::Many(vs) => vs.clone(),
        }
    }
}

/// A pretrained encoder living under `{models_dir}/{root}/{name}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerSpec {
    pub root: String,
    pub name: String,
    /// reported size; counted from the weights when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// vector width reported while the encoder is not loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<usize>,
}

impl TransformerSpec {
    pub fn new(root: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
            parameters: None,
            max_length: None,
            dimension: None,
        }
    }

    pub fn e5_small() -> Self {
        Self {
            parameters: Some(33_400_000),
            ..Self::new("intfloat", "e5-small-v2")
        }
    }

    pub fn mini_lm() -> Self {
        Self::new("sentence-transformers", "all-MiniLM-L6-v2")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// root of every output file
    pub output: PathBuf,
    pub seed: u64,
    pub alpha: Axis<f64>,
    pub window: Axis<usize>,
    pub negative: Axis<usize>,
    pub word2vec: Word2VecConfig,
    pub transformers: Vec<TransformerSpec>,
    /// directory holding the pretrained encoder folders
    pub models_dir: PathBuf,
    pub naive_bayes: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("Results"),
            seed: 42,
            alpha: Axis::One(DEFAULT_ALPHA),
            window: Axis::One(DEFAULT_WINDOW),
            negative: Axis::One(DEFAULT_NEGATIVE),
            word2vec: Word2VecConfig::default(),
            transformers: vec![TransformerSpec::e5_small(), TransformerSpec::mini_lm()],
            models_dir: PathBuf::from("."),
            naive_bayes: true,
        }
    }
}

impl SweepConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_toml(&text)
    }

    /// Transformer names are leaderboard keys and output file names, so
    /// each may appear only once.
    pub fn validate(&self) -> Result<()> {
        let mut seen = AHashSet::new();
        for spec in &self.transformers {
            if !seen.insert(spec.name.as_str()) {
                return Err(Error::Config(toml::de::Error::custom(format!(
                    "transformer name '{}' is configured more than once",
                    spec.name
                ))));
            }
        }
        Ok(())
    }
}
