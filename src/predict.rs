use crate::error::{Error, Result};
use crate::labels::LabelMap;

/// Number of labels rendered for each submission.
pub const TOP_K: usize = 3;

/// Produces one raw score per class for a piece of text.
pub trait Classify: Send + Sync {
    fn logits(&self, text: &str) -> Result<Vec<f32>>;
}

/// Indices of the `k` highest scores, best first.
///
/// Equal scores keep ascending index order. Scores are compared with
/// `f32::total_cmp`, so a positive NaN ranks above every number.
pub fn top_k(scores: &[f32], k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..scores.len()).collect();
    // stable: ties stay in index order
    indices.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    indices.truncate(k);
    indices
}

pub struct Predictor {
    classifier: Box<dyn Classify>,
    labels: LabelMap,
}

impl Predictor {
    pub fn new(classifier: Box<dyn Classify>, labels: LabelMap) -> Self {
        Self { classifier, labels }
    }

    /// The `TOP_K` most likely labels for `text`, best first.
    pub fn predict(&self, text: &str) -> Result<Vec<String>> {
        let logits = self.classifier.logits(text)?;
        if logits.len() != self.labels.len() {
            return Err(Error::Inference(format!(
                "model produced {} scores for {} labels",
                logits.len(),
                self.labels.len()
            )));
        }

        top_k(&logits, TOP_K)
            .into_iter()
            .map(|id| {
                self.labels
                    .label(id)
                    .map(str::to_owned)
                    .ok_or_else(|| Error::Inference(format!("no label for class {id}")))
            })
            .collect()
    }
}
