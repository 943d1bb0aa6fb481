//! Batch collation - padding variable-length example tensors into batches.
//!
//! The collator pads every sequential field along its time axis to the batch
//! maximum (0.0 for float fields, 0 for integer fields) and emits a
//! `<name>_lengths` vector alongside. Non-sequential fields (speaker
//! embeddings, speaker/language ids) are stacked as-is and get no lengths
//! entry.

use std::collections::BTreeMap;

use ndarray::{s, Array1, Array2, Array3};

use crate::error::{TaskError, TaskResult};

/// One per-example tensor. The leading axis is time for sequential fields.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTensor {
    /// 1-D float sequence (e.g. raw singing waveform, pitch track).
    Float1(Array1<f32>),
    /// 2-D float sequence, time x dim (e.g. acoustic features).
    Float2(Array2<f32>),
    /// 1-D integer sequence (e.g. token ids, discrete tokens).
    Int1(Array1<i64>),
}

impl FieldTensor {
    fn len(&self) -> usize {
        match self {
            FieldTensor::Float1(a) => a.len(),
            FieldTensor::Float2(a) => a.nrows(),
            FieldTensor::Int1(a) => a.len(),
        }
    }
}

/// One batched tensor with a leading batch axis.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchTensor {
    /// batch x time float.
    Float2(Array2<f32>),
    /// batch x time x dim float.
    Float3(Array3<f32>),
    /// batch x time integer.
    Int2(Array2<i64>),
    /// batch integer vector (lengths, ids).
    Int1(Array1<i64>),
}

/// One example: a corpus utterance id plus its named tensors.
#[derive(Debug, Clone)]
pub struct Example {
    pub uid: String,
    pub fields: BTreeMap<String, FieldTensor>,
}

/// A collated batch.
#[derive(Debug, Clone)]
pub struct Batch {
    pub uids: Vec<String>,
    pub tensors: BTreeMap<String, BatchTensor>,
}

/// Fixed collation strategy shared by every SVS data loader.
#[derive(Debug, Clone)]
pub struct CollateFn {
    float_pad: f32,
    int_pad: i64,
    not_sequence: Vec<String>,
}

impl CollateFn {
    pub fn new(float_pad: f32, int_pad: i64, not_sequence: &[&str]) -> Self {
        Self {
            float_pad,
            int_pad,
            not_sequence: not_sequence.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Names of the fields that are stacked without padding.
    pub fn not_sequence(&self) -> &[String] {
        &self.not_sequence
    }

    /// Collate a non-empty set of examples into one batch.
    ///
    /// Every example must carry the same field names with matching dtypes;
    /// non-sequential fields must additionally agree on shape.
    pub fn collate(&self, examples: &[Example]) -> TaskResult<Batch> {
        if examples.is_empty() {
            return Err(TaskError::config("cannot collate an empty batch"));
        }
        let keys: Vec<String> = examples[0].fields.keys().cloned().collect();
        for example in examples {
            if example.fields.keys().cloned().collect::<Vec<_>>() != keys {
                return Err(TaskError::inconsistent(format!(
                    "example '{}' has mismatched fields",
                    example.uid
                )));
            }
        }

        let uids = examples.iter().map(|e| e.uid.clone()).collect();
        let mut tensors = BTreeMap::new();
        for key in &keys {
            let columns: Vec<&FieldTensor> =
                examples.iter().map(|e| &e.fields[key]).collect();
            if self.not_sequence.contains(key) {
                tensors.insert(key.clone(), self.stack(key, &columns)?);
            } else {
                let lengths: Array1<i64> =
                    columns.iter().map(|t| t.len() as i64).collect();
                tensors.insert(key.clone(), self.pad(key, &columns)?);
                tensors.insert(format!("{}_lengths", key), BatchTensor::Int1(lengths));
            }
        }
        Ok(Batch { uids, tensors })
    }

    fn pad(&self, key: &str, columns: &[&FieldTensor]) -> TaskResult<BatchTensor> {
        let batch = columns.len();
        let max_len = columns.iter().map(|t| t.len()).max().unwrap_or(0);
        match columns[0] {
            FieldTensor::Float1(_) => {
                let mut out = Array2::from_elem((batch, max_len), self.float_pad);
                for (i, tensor) in columns.iter().enumerate() {
                    let FieldTensor::Float1(a) = *tensor else {
                        return Err(dtype_mismatch(key));
                    };
                    out.slice_mut(s![i, ..a.len()]).assign(a);
                }
                Ok(BatchTensor::Float2(out))
            }
            FieldTensor::Float2(first) => {
                let dim = first.ncols();
                let mut out = Array3::from_elem((batch, max_len, dim), self.float_pad);
                for (i, tensor) in columns.iter().enumerate() {
                    let FieldTensor::Float2(a) = *tensor else {
                        return Err(dtype_mismatch(key));
                    };
                    if a.ncols() != dim {
                        return Err(TaskError::inconsistent(format!(
                            "field '{}' has inconsistent feature dims ({} vs {})",
                            key,
                            a.ncols(),
                            dim
                        )));
                    }
                    out.slice_mut(s![i, ..a.nrows(), ..]).assign(a);
                }
                Ok(BatchTensor::Float3(out))
            }
            FieldTensor::Int1(_) => {
                let mut out = Array2::from_elem((batch, max_len), self.int_pad);
                for (i, tensor) in columns.iter().enumerate() {
                    let FieldTensor::Int1(a) = *tensor else {
                        return Err(dtype_mismatch(key));
                    };
                    out.slice_mut(s![i, ..a.len()]).assign(a);
                }
                Ok(BatchTensor::Int2(out))
            }
        }
    }

    // Non-sequential fields are stacked; their shapes must already agree.
    fn stack(&self, key: &str, columns: &[&FieldTensor]) -> TaskResult<BatchTensor> {
        let len = columns[0].len();
        for tensor in columns {
            if tensor.len() != len {
                return Err(TaskError::inconsistent(format!(
                    "non-sequence field '{}' has varying shapes",
                    key
                )));
            }
        }
        match columns[0] {
            FieldTensor::Float1(_) => {
                let mut out = Array2::from_elem((columns.len(), len), self.float_pad);
                for (i, tensor) in columns.iter().enumerate() {
                    let FieldTensor::Float1(a) = *tensor else {
                        return Err(dtype_mismatch(key));
                    };
                    out.slice_mut(s![i, ..]).assign(a);
                }
                Ok(BatchTensor::Float2(out))
            }
            FieldTensor::Int1(_) => {
                let mut out = Array2::from_elem((columns.len(), len), self.int_pad);
                for (i, tensor) in columns.iter().enumerate() {
                    let FieldTensor::Int1(a) = *tensor else {
                        return Err(dtype_mismatch(key));
                    };
                    out.slice_mut(s![i, ..]).assign(a);
                }
                Ok(BatchTensor::Int2(out))
            }
            FieldTensor::Float2(_) => Err(TaskError::config(format!(
                "non-sequence field '{}' must be 1-D",
                key
            ))),
        }
    }
}

fn dtype_mismatch(key: &str) -> TaskError {
    TaskError::inconsistent(format!("field '{}' mixes dtypes across examples", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn collate_fn() -> CollateFn {
        CollateFn::new(0.0, 0, &["spembs", "sids", "lids"])
    }

    fn example(uid: &str, fields: Vec<(&str, FieldTensor)>) -> Example {
        Example {
            uid: uid.to_string(),
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    #[test]
    fn test_int_padding_and_lengths() {
        let batch = collate_fn()
            .collate(&[
                example("utt1", vec![("text", FieldTensor::Int1(array![1, 2, 3]))]),
                example("utt2", vec![("text", FieldTensor::Int1(array![4]))]),
            ])
            .unwrap();

        assert_eq!(batch.uids, vec!["utt1", "utt2"]);
        assert_eq!(
            batch.tensors["text"],
            BatchTensor::Int2(array![[1, 2, 3], [4, 0, 0]])
        );
        assert_eq!(
            batch.tensors["text_lengths"],
            BatchTensor::Int1(array![3, 1])
        );
    }

    #[test]
    fn test_float_feature_padding() {
        let batch = collate_fn()
            .collate(&[
                example(
                    "utt1",
                    vec![("feats", FieldTensor::Float2(array![[1.0, 2.0], [3.0, 4.0]]))],
                ),
                example(
                    "utt2",
                    vec![("feats", FieldTensor::Float2(array![[5.0, 6.0]]))],
                ),
            ])
            .unwrap();

        assert_eq!(
            batch.tensors["feats"],
            BatchTensor::Float3(array![
                [[1.0, 2.0], [3.0, 4.0]],
                [[5.0, 6.0], [0.0, 0.0]]
            ])
        );
    }

    #[test]
    fn test_not_sequence_fields_skip_padding() {
        let batch = collate_fn()
            .collate(&[
                example(
                    "utt1",
                    vec![("spembs", FieldTensor::Float1(array![0.1, 0.2]))],
                ),
                example(
                    "utt2",
                    vec![("spembs", FieldTensor::Float1(array![0.3, 0.4]))],
                ),
            ])
            .unwrap();

        assert_eq!(
            batch.tensors["spembs"],
            BatchTensor::Float2(array![[0.1, 0.2], [0.3, 0.4]])
        );
        assert!(!batch.tensors.contains_key("spembs_lengths"));
    }

    #[test]
    fn test_mismatched_fields_rejected() {
        let result = collate_fn().collate(&[
            example("utt1", vec![("text", FieldTensor::Int1(array![1]))]),
            example("utt2", vec![("label", FieldTensor::Int1(array![1]))]),
        ]);
        assert!(matches!(result, Err(TaskError::Inconsistent(_))));
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert!(collate_fn().collate(&[]).is_err());
    }
}
