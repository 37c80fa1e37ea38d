//! BERT-family encoders on candle, read from local model directories.

use std::path::{Path, PathBuf};

use candle_core::{safetensors::MmapedSafetensors, DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde::Deserialize;
use tokenizers::{Tokenizer, TruncationParams};
use tracing::debug;

use crate::{
    error::{Error, Result},
    models::transformer::{masked_mean_pool, EncoderProvider, SentenceEncoder},
};

const CONFIG_FILE: &str = "config.json";
const TOKENIZER_FILE: &str = "tokenizer.json";
const WEIGHTS_FILE: &str = "model.safetensors";

/// Loads `{models_dir}/{root}/{name}/` on the CPU
#[derive(Debug, Clone)]
pub struct CandleProvider {
    models_dir: PathBuf,
}

impl CandleProvider {
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    pub fn model_dir(&self, root: &str, name: &str) -> PathBuf {
        self.models_dir.join(root).join(name)
    }
}

impl EncoderProvider for CandleProvider {
    fn load(&self, root: &str, name: &str, max_length: usize) -> Result<Box<dyn SentenceEncoder>> {
        let encoder = BertEncoder::from_dir(&self.model_dir(root, name), max_length)?;
        Ok(Box::new(encoder))
    }
}

/// Fields of `config.json` read besides the BERT config itself
#[derive(Debug, Deserialize)]
struct EncoderShape {
    hidden_size: usize,
}

pub struct BertEncoder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    hidden_size: usize,
    parameters: u64,
}

fn tokenizer_error(message: String, source: tokenizers::Error) -> Error {
    Error::Backend {
        message,
        source: Some(source),
    }
}

impl BertEncoder {
    /// Read config, tokenizer and weights from `dir`.
    /// Inputs longer than `max_length` tokens are truncated.
    pub fn from_dir(dir: &Path, max_length: usize) -> Result<Self> {
        let device = Device::Cpu;
        let config_path = dir.join(CONFIG_FILE);
        let weights_path = dir.join(WEIGHTS_FILE);

        let config_str = std::fs::read_to_string(&config_path).map_err(|e| Error::io(&config_path, e))?;
        let config: BertConfig = serde_json::from_str(&config_str)
            .map_err(|e| Error::backend(format!("invalid {}", config_path.display()), e))?;
        let shape: EncoderShape = serde_json::from_str(&config_str)
            .map_err(|e| Error::backend(format!("invalid {}", config_path.display()), e))?;

        let tokenizer_path = dir.join(TOKENIZER_FILE);
        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| tokenizer_error(format!("cannot read {}", tokenizer_path.display()), e))?;
        tokenizer
            .with_padding(None)
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| tokenizer_error("invalid truncation".to_string(), e))?;

        // SAFETY: the weights file is memory-mapped and must not change while the encoder lives
        let weights = unsafe { MmapedSafetensors::new(&weights_path)? };
        let parameters = parameter_count(&weights);
        let vb = VarBuilder::from_backend(Box::new(weights), DType::F32, device.clone());
        let model = BertModel::load(vb, &config)?;
        debug!(dir = %dir.display(), parameters, "bert weights mapped");

        Ok(Self {
            model,
            tokenizer,
            device,
            hidden_size: shape.hidden_size,
            parameters,
        })
    }
}

/// Total element count of every tensor, read from the safetensors header
fn parameter_count(weights: &MmapedSafetensors) -> u64 {
    weights
        .tensors()
        .iter()
        .map(|(_, view)| view.shape().iter().product::<usize>() as u64)
        .sum()
}

impl SentenceEncoder for BertEncoder {
    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| tokenizer_error("tokenization failed".to_string(), e))?;
        let ids = encoding.get_ids();
        let mask = encoding.get_attention_mask();
        let len = ids.len();

        let input_ids = Tensor::from_slice(ids, (1, len), &self.device)?;
        let type_ids = Tensor::from_slice(encoding.get_type_ids(), (1, len), &self.device)?;
        let attention = Tensor::from_slice(mask, (1, len), &self.device)?;

        // [1, len, hidden]
        let output = self.model.forward(&input_ids, &type_ids, Some(&attention))?;
        let hidden = output
            .squeeze(0)?
            .to_dtype(DType::F32)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        Ok(masked_mean_pool(&hidden, self.hidden_size, mask))
    }

    fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    fn parameter_count(&self) -> u64 {
        self.parameters
    }
}
