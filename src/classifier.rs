pub use candle_core::Device;
use candle_core::{DType, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::modernbert::ModernBertForSequenceClassification;
use std::io;
use std::path::{Path, PathBuf};
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};

use crate::error::{Error, Result};
use crate::labels::LabelMap;
use crate::model::config;
use crate::predict::Classify;

/// A ModernBERT sequence classifier loaded from a local model directory
/// holding `config.json`, `tokenizer.json` and `model.safetensors`.
pub struct ModernBertClassifier {
    model: ModernBertForSequenceClassification,
    tokenizer: Tokenizer,
    device: Device,
}

impl ModernBertClassifier {
    pub fn load<P: AsRef<Path>>(path: P, labels: &LabelMap, device: Device) -> Result<Self> {
        let mut dir = PathBuf::from(path.as_ref());
        if !dir.is_dir() {
            return Err(Error::io(
                dir,
                io::Error::new(io::ErrorKind::NotFound, "model directory not found"),
            ));
        }

        dir.push("config.json");
        let config = config::load(&dir, labels)?;
        dir.pop();

        dir.push("tokenizer.json");
        require_file(&dir)?;
        let mut tokenizer = Tokenizer::from_file(&dir)?;
        tokenizer
            .with_padding(Some(PaddingParams {
                strategy: tokenizers::PaddingStrategy::BatchLongest,
                pad_id: config.pad_token_id,
                ..Default::default()
            }))
            .with_truncation(Some(TruncationParams {
                max_length: config.max_position_embeddings,
                ..Default::default()
            }))?;
        dir.pop();

        dir.push("model.safetensors");
        require_file(&dir)?;
        // SAFETY: the weights file is mapped read-only and not modified while
        // the process runs.
        let model_builder =
            unsafe { VarBuilder::from_mmaped_safetensors(&[&dir], DType::F32, &device) }?;
        dir.pop();

        let model = ModernBertForSequenceClassification::load(model_builder, &config)?;
        log::info!(
            "loaded classifier from {} ({} labels, max {} tokens)",
            dir.display(),
            labels.len(),
            config.max_position_embeddings
        );

        Ok(Self {
            model,
            tokenizer,
            device,
        })
    }
}

impl Classify for ModernBertClassifier {
    fn logits(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self.tokenizer.encode(text, true)?;
        let input_ids = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let attention_mask =
            Tensor::new(encoding.get_attention_mask(), &self.device)?.unsqueeze(0)?;
        let xs = self.model.forward(&input_ids, &attention_mask)?;
        Ok(xs.squeeze(0)?.to_dtype(DType::F32)?.to_vec1()?)
    }
}

fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(Error::io(
            path,
            io::Error::new(io::ErrorKind::NotFound, "model file not found"),
        ))
    }
}
