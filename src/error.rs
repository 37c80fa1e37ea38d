use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the evaluation pipeline.
///
/// Degraded situations (unfit models, failed loads, missing corpus
/// directories) are logged and never reach this type. What remains are
/// filesystem failures, malformed configuration and faults inside the
/// numeric backends.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("model serialization error: {0}")]
    Serialization(#[from] serde_cbor::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// Encoder or tokenizer fault. There is no recovery for a broken backend.
    #[error("backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The classifier expects one kind of sentence vector and the model produced another.
    #[error("classifier expects {expected} input, model produced {actual}")]
    InputMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("cannot split {documents} document(s) into train and test sets")]
    EmptySplit { documents: usize },

    #[error("corpus has {corpus} documents but {labels} labels were given")]
    LengthMismatch { corpus: usize, labels: usize },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn backend<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Backend {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<candle_core::Error> for Error {
    fn from(e: candle_core::Error) -> Self {
        Error::backend("candle", e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
