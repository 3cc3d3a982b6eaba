//! Top-level shapes of a decoded tensor container

use crate::{Error, Result};
use candle_core::pickle::Object;
use ndarray::{ArrayD, IxDyn};
use std::path::Path;
use tracing::warn;

/// What a tensor container holds at its root
#[derive(Debug, Clone, PartialEq)]
pub enum VectorPayload {
    /// A reduce call, normally a tensor rebuild resolved against the archive storages
    Tensor(Object),
    /// A list or tuple; the latent is its first element
    Sequence(Vec<Object>),
    /// A mapping, entries in serialized order
    Keyed(Vec<(String, Object)>),
    /// Anything else, coerced to numbers if possible
    Other(Object),
}

impl VectorPayload {
    pub fn classify(root: Object) -> Self {
        match root {
            tensor @ Object::Reduce { .. } => VectorPayload::Tensor(tensor),
            Object::List(items) | Object::Tuple(items) => VectorPayload::Sequence(items),
            Object::Dict(entries) => VectorPayload::Keyed(
                entries.into_iter().map(|(k, v)| (key_name(k), v)).collect(),
            ),
            other => VectorPayload::Other(other),
        }
    }

    /// Pick the single value that carries the latent
    ///
    /// For mappings, `preferred_key` wins when given; otherwise the first
    /// serialized entry is used.
    pub fn select(self, preferred_key: Option<&str>, path: &Path) -> Result<Object> {
        match self {
            VectorPayload::Tensor(t) => Ok(t),
            VectorPayload::Sequence(items) => items
                .into_iter()
                .next()
                .ok_or_else(|| Error::decode(path, "empty sequence")),
            VectorPayload::Keyed(entries) => {
                if let Some(key) = preferred_key {
                    if entries.is_empty() {
                        return Err(Error::EmptyMapping(path.to_path_buf()));
                    }
                    return entries
                        .into_iter()
                        .find(|(k, _)| k == key)
                        .map(|(_, v)| v)
                        .ok_or_else(|| {
                            Error::decode(path, format!("key {:?} not in mapping", key))
                        });
                }
                if entries.len() > 1 {
                    warn!(
                        path = %path.display(),
                        key = %entries[0].0,
                        entries = entries.len(),
                        "Mapping has several entries, using the first"
                    );
                }
                match entries.into_iter().next() {
                    Some((_, v)) => Ok(v),
                    None => Err(Error::EmptyMapping(path.to_path_buf())),
                }
            }
            VectorPayload::Other(v) => Ok(v),
        }
    }
}

fn key_name(key: Object) -> String {
    match key {
        Object::Unicode(s) => s,
        Object::Int(i) => i.to_string(),
        other => format!("{:?}", other),
    }
}

/// Turn nested numbers into an array; `None` if anything is not numeric
/// or the nesting is ragged
pub fn coerce_numeric(obj: &Object) -> Option<ArrayD<f64>> {
    let mut shape = Vec::new();
    let mut values = Vec::new();
    collect(obj, 0, &mut shape, &mut values)?;
    ArrayD::from_shape_vec(IxDyn(&shape), values).ok()
}

fn collect(obj: &Object, depth: usize, shape: &mut Vec<usize>, out: &mut Vec<f64>) -> Option<()> {
    match obj {
        Object::Int(v) => scalar(f64::from(*v), depth, shape, out),
        Object::Float(v) => scalar(*v, depth, shape, out),
        Object::Bool(v) => scalar(if *v { 1.0 } else { 0.0 }, depth, shape, out),
        Object::List(items) | Object::Tuple(items) => {
            if depth == shape.len() {
                // first time at this depth fixes its extent
                shape.push(items.len());
            } else if shape.get(depth) != Some(&items.len()) {
                return None;
            }
            items.iter().try_for_each(|item| collect(item, depth + 1, shape, out))
        }
        _ => None,
    }
}

fn scalar(v: f64, depth: usize, shape: &[usize], out: &mut Vec<f64>) -> Option<()> {
    // a number where a deeper list was seen before is ragged
    if depth != shape.len() {
        return None;
    }
    out.push(v);
    Some(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{parse, PickleWriter};
    use std::path::PathBuf;

    fn path() -> PathBuf {
        PathBuf::from("latent.pt")
    }

    fn tensor(key: &str) -> Object {
        let mut w = PickleWriter::new();
        w.tensor(key, &[512]);
        parse(&w.finish())
    }

    /// Storage entry a selected tensor points at
    fn storage_of(obj: Object) -> String {
        obj.into_tensor_info(Object::Unicode("latent".into()), Path::new("archive/data"))
            .unwrap()
            .unwrap()
            .path
    }

    #[test]
    fn test_classify_variants() {
        assert!(matches!(VectorPayload::classify(tensor("0")), VectorPayload::Tensor(_)));
        assert!(matches!(
            VectorPayload::classify(Object::Tuple(vec![])),
            VectorPayload::Sequence(_)
        ));
        assert!(matches!(
            VectorPayload::classify(Object::Dict(vec![(Object::Int(3), Object::None)])),
            VectorPayload::Keyed(ref e) if e[0].0 == "3"
        ));
        assert!(matches!(VectorPayload::classify(Object::Float(1.0)), VectorPayload::Other(_)));
    }

    #[test]
    fn test_sequence_takes_first() {
        let payload = VectorPayload::Sequence(vec![tensor("a"), tensor("b")]);
        let selected = payload.select(None, &path()).unwrap();
        assert_eq!(storage_of(selected), "archive/data/a");
    }

    #[test]
    fn test_empty_sequence_is_decode_error() {
        let err = VectorPayload::Sequence(vec![]).select(None, &path()).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_keyed_uses_first_serialized_entry() {
        let payload = VectorPayload::Keyed(vec![
            ("w".to_string(), tensor("first")),
            ("noise".to_string(), tensor("second")),
        ]);
        let selected = payload.select(None, &path()).unwrap();
        assert_eq!(storage_of(selected), "archive/data/first");
    }

    #[test]
    fn test_keyed_prefers_configured_key() {
        let payload = VectorPayload::Keyed(vec![
            ("noise".to_string(), tensor("first")),
            ("latent".to_string(), tensor("second")),
        ]);
        let selected = payload.clone().select(Some("latent"), &path()).unwrap();
        assert_eq!(storage_of(selected), "archive/data/second");

        let err = payload.select(Some("missing"), &path()).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_empty_mapping() {
        for key in [None, Some("latent")] {
            let err = VectorPayload::Keyed(vec![]).select(key, &path()).unwrap_err();
            assert!(matches!(err, Error::EmptyMapping(_)));
        }
    }

    #[test]
    fn test_coerce_nested_lists() {
        let obj = Object::List(vec![
            Object::List(vec![Object::Float(1.0), Object::Int(2)]),
            Object::Tuple(vec![Object::Int(-3), Object::Bool(true)]),
        ]);
        let array = coerce_numeric(&obj).unwrap();
        assert_eq!(array.shape(), &[2, 2]);
        assert_eq!(array.iter().copied().collect::<Vec<_>>(), vec![1.0, 2.0, -3.0, 1.0]);
    }

    #[test]
    fn test_coerce_scalar_is_zero_dimensional() {
        let array = coerce_numeric(&Object::Float(0.1)).unwrap();
        assert_eq!(array.ndim(), 0);
        assert_eq!(array.iter().next(), Some(&0.1));
    }

    #[test]
    fn test_coerce_rejects_ragged_and_non_numeric() {
        let ragged = Object::List(vec![
            Object::List(vec![Object::Int(1)]),
            Object::List(vec![Object::Int(1), Object::Int(2)]),
        ]);
        assert!(coerce_numeric(&ragged).is_none());

        let mixed = Object::List(vec![Object::Int(1), Object::List(vec![])]);
        assert!(coerce_numeric(&mixed).is_none());

        assert!(coerce_numeric(&Object::Unicode("w".into())).is_none());
        assert!(coerce_numeric(&tensor("0")).is_none());
    }
}
