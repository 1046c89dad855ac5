//! Label maps loaded from `id2label` / `label2id` JSON files.
//!
//! Both files are plain JSON objects:
//!
//! ```text
//! id2label.txt  {"0": "billing", "1": "outage", "2": "refund"}
//! label2id.txt  {"billing": "0", "outage": 1, "refund": "2"}
//! ```
//!
//! Ids must cover `0..n` exactly, and the two maps must be inverses of each
//! other. Anything else is rejected when the process starts.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelId {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelMap {
    labels: Vec<String>,
    ids: HashMap<String, usize>,
}

impl LabelMap {
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(id2label: P, label2id: Q) -> Result<Self> {
        let (id2label, label2id) = (id2label.as_ref(), label2id.as_ref());
        let id2label_src = fs::read_to_string(id2label).map_err(|e| Error::io(id2label, e))?;
        let label2id_src = fs::read_to_string(label2id).map_err(|e| Error::io(label2id, e))?;
        Self::parse(id2label, &id2label_src, label2id, &label2id_src)
    }

    #[cfg(test)]
    pub fn from_json(id2label_src: &str, label2id_src: &str) -> Result<Self> {
        Self::parse(
            Path::new("id2label"),
            id2label_src,
            Path::new("label2id"),
            label2id_src,
        )
    }

    fn parse(
        id2label: &Path,
        id2label_src: &str,
        label2id: &Path,
        label2id_src: &str,
    ) -> Result<Self> {
        let labels = parse_id2label(id2label, id2label_src)?;
        let ids = parse_label2id(label2id, label2id_src)?;

        if ids.len() != labels.len() {
            return Err(Error::label_map(
                label2id,
                format!(
                    "has {} entries but {} has {}",
                    ids.len(),
                    id2label.display(),
                    labels.len()
                ),
            ));
        }
        for (id, label) in labels.iter().enumerate() {
            match ids.get(label) {
                Some(&found) if found == id => {}
                Some(&found) => {
                    return Err(Error::label_map(
                        label2id,
                        format!("label {label:?} maps to {found}, expected {id}"),
                    ))
                }
                None => {
                    return Err(Error::label_map(
                        label2id,
                        format!("label {label:?} is missing"),
                    ))
                }
            }
        }

        Ok(Self { labels, ids })
    }

    pub fn label(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    #[cfg(test)]
    pub fn id(&self, label: &str) -> Option<usize> {
        self.ids.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    /// `{"0": "label", ...}` in the shape a model `config.json` expects.
    pub fn id2label_json(&self) -> Value {
        let map: Map<String, Value> = self
            .labels
            .iter()
            .enumerate()
            .map(|(id, label)| (id.to_string(), Value::String(label.clone())))
            .collect();
        Value::Object(map)
    }

    /// `{"label": "0", ...}` in the shape a model `config.json` expects.
    pub fn label2id_json(&self) -> Value {
        let map: Map<String, Value> = self
            .ids
            .iter()
            .map(|(label, id)| (label.clone(), Value::String(id.to_string())))
            .collect();
        Value::Object(map)
    }
}

fn parse_id2label(path: &Path, src: &str) -> Result<Vec<String>> {
    let raw: HashMap<String, String> =
        serde_json::from_str(src).map_err(|e| Error::label_map(path, e.to_string()))?;
    if raw.is_empty() {
        return Err(Error::label_map(path, "no labels defined"));
    }

    let count = raw.len();
    let mut slots: Vec<Option<String>> = vec![None; count];
    for (key, label) in raw {
        let id: usize = key.parse().map_err(|_| {
            Error::label_map(path, format!("id {key:?} is not a non-negative integer"))
        })?;
        let slot = slots
            .get_mut(id)
            .ok_or_else(|| Error::label_map(path, format!("id {id} is outside 0..{count}")))?;
        if slot.is_some() {
            return Err(Error::label_map(path, format!("id {id} is defined twice")));
        }
        *slot = Some(label);
    }

    let labels: Vec<String> = slots.into_iter().flatten().collect();
    let mut seen = HashMap::with_capacity(labels.len());
    for (id, label) in labels.iter().enumerate() {
        if let Some(first) = seen.insert(label.as_str(), id) {
            return Err(Error::label_map(
                path,
                format!("label {label:?} is used by ids {first} and {id}"),
            ));
        }
    }
    Ok(labels)
}

fn parse_label2id(path: &Path, src: &str) -> Result<HashMap<String, usize>> {
    let raw: HashMap<String, LabelId> =
        serde_json::from_str(src).map_err(|e| Error::label_map(path, e.to_string()))?;
    raw.into_iter()
        .map(|(label, id)| {
            let id = match id {
                LabelId::Number(n) => usize::try_from(n).ok(),
                LabelId::Text(s) => s.parse().ok(),
            }
            .ok_or_else(|| {
                Error::label_map(
                    path,
                    format!("id for label {label:?} is not a non-negative integer"),
                )
            })?;
            Ok::<_, Error>((label, id))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ID2LABEL: &str = r#"{"0": "billing", "1": "outage", "2": "refund", "3": "other"}"#;
    const LABEL2ID: &str = r#"{"billing": "0", "outage": "1", "refund": "2", "other": "3"}"#;

    fn reason(err: Error) -> String {
        match err {
            Error::LabelMap { reason, .. } => reason,
            other => panic!("expected a label map error, got {other}"),
        }
    }

    #[test]
    fn maps_are_inverse() {
        let map = LabelMap::from_json(ID2LABEL, LABEL2ID).unwrap();
        assert_eq!(map.len(), 4);
        for id in 0..map.len() {
            let label = map.label(id).unwrap();
            assert_eq!(map.id(label), Some(id));
        }
        for label in map.labels() {
            assert_eq!(map.label(map.id(label).unwrap()), Some(label));
        }
        assert_eq!(map.label(4), None);
        assert_eq!(map.id("unknown"), None);
    }

    #[test]
    fn integer_ids_in_label2id() {
        let map =
            LabelMap::from_json(r#"{"0": "a", "1": "b"}"#, r#"{"a": 0, "b": "1"}"#).unwrap();
        assert_eq!(map.id("a"), Some(0));
        assert_eq!(map.id("b"), Some(1));
    }

    #[test]
    fn config_json_shapes() {
        let map = LabelMap::from_json(r#"{"0": "a", "1": "b"}"#, r#"{"a": 0, "b": 1}"#).unwrap();
        assert_eq!(map.id2label_json(), serde_json::json!({"0": "a", "1": "b"}));
        assert_eq!(map.label2id_json(), serde_json::json!({"a": "0", "b": "1"}));
    }

    #[test]
    fn rejects_malformed_json() {
        // Python-style literal, not JSON.
        let err = LabelMap::from_json("{0: 'a'}", r#"{"a": 0}"#).unwrap_err();
        assert!(matches!(err, Error::LabelMap { .. }));
        let err = LabelMap::from_json(r#"{"0": 5}"#, r#"{"a": 0}"#).unwrap_err();
        assert!(matches!(err, Error::LabelMap { .. }));
    }

    #[test]
    fn rejects_bad_ids() {
        let err = LabelMap::from_json(r#"{"zero": "a"}"#, r#"{"a": 0}"#).unwrap_err();
        assert!(reason(err).contains("not a non-negative integer"));

        let err = LabelMap::from_json(r#"{"0": "a", "2": "b"}"#, r#"{"a": 0, "b": 2}"#)
            .unwrap_err();
        assert!(reason(err).contains("outside 0..2"));

        let err = LabelMap::from_json(r#"{"0": "a", "00": "b"}"#, r#"{"a": 0, "b": 0}"#)
            .unwrap_err();
        assert!(reason(err).contains("defined twice"));

        let err = LabelMap::from_json(r#"{"0": "a"}"#, r#"{"a": "-1"}"#).unwrap_err();
        assert!(reason(err).contains("not a non-negative integer"));
    }

    #[test]
    fn rejects_empty() {
        let err = LabelMap::from_json("{}", "{}").unwrap_err();
        assert_eq!(reason(err), "no labels defined");
    }

    #[test]
    fn rejects_non_inverse_maps() {
        let err = LabelMap::from_json(r#"{"0": "a", "1": "b"}"#, r#"{"a": 1, "b": 0}"#)
            .unwrap_err();
        assert_eq!(reason(err), "label \"a\" maps to 1, expected 0");

        let err = LabelMap::from_json(r#"{"0": "a", "1": "b"}"#, r#"{"a": 0, "c": 1}"#)
            .unwrap_err();
        assert_eq!(reason(err), "label \"b\" is missing");

        let err = LabelMap::from_json(r#"{"0": "a", "1": "b"}"#, r#"{"a": 0}"#).unwrap_err();
        assert!(reason(err).contains("has 1 entries"));
    }

    #[test]
    fn rejects_duplicate_labels() {
        let err = LabelMap::from_json(r#"{"0": "a", "1": "a"}"#, r#"{"a": 0}"#).unwrap_err();
        assert_eq!(reason(err), "label \"a\" is used by ids 0 and 1");
    }

    #[test]
    fn loads_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let id2label = dir.path().join("id2label.txt");
        let label2id = dir.path().join("label2id.txt");
        fs::write(&id2label, ID2LABEL).unwrap();
        fs::write(&label2id, LABEL2ID).unwrap();

        let map = LabelMap::load(&id2label, &label2id).unwrap();
        assert_eq!(map, LabelMap::from_json(ID2LABEL, LABEL2ID).unwrap());
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let id2label = dir.path().join("id2label.txt");
        fs::write(&id2label, ID2LABEL).unwrap();
        let missing = dir.path().join("label2id.txt");

        match LabelMap::load(&id2label, &missing).unwrap_err() {
            Error::Io { path, .. } => assert_eq!(path, missing),
            other => panic!("expected an IO error, got {other}"),
        }
    }

    #[test]
    fn error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let id2label = dir.path().join("id2label.txt");
        let label2id = dir.path().join("label2id.txt");
        fs::write(&id2label, "not json").unwrap();
        fs::write(&label2id, LABEL2ID).unwrap();

        let err = LabelMap::load(&id2label, &label2id).unwrap_err();
        assert!(err.to_string().contains("id2label.txt"));
    }
}
