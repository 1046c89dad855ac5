use std::fs;
use std::path::Path;

use candle_transformers::models::modernbert::Config as ModernBertConfig;
use serde::de::Error as _;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::labels::LabelMap;

const DEFAULT_POOLING: &str = "cls";

/// Reads a model `config.json` with its label tables replaced by `labels`.
pub fn load<P: AsRef<Path>>(path: P, labels: &LabelMap) -> Result<ModernBertConfig> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let raw: Value = serde_json::from_str(&src)?;
    Ok(serde_json::from_value(with_labels(raw, labels)?)?)
}

/// Overrides `id2label`/`label2id` so the classifier head is sized for the
/// loaded label set, and fills in the pooling mode when the config omits it.
pub fn with_labels(mut raw: Value, labels: &LabelMap) -> Result<Value> {
    let fields = raw
        .as_object_mut()
        .ok_or_else(|| serde_json::Error::custom("model config is not a JSON object"))?;
    fields.insert("id2label".to_owned(), labels.id2label_json());
    fields.insert("label2id".to_owned(), labels.label2id_json());
    fields
        .entry("classifier_pooling")
        .or_insert_with(|| Value::String(DEFAULT_POOLING.to_owned()));
    Ok(raw)
}
