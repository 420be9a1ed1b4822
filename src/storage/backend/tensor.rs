use std::collections::HashMap;

use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};

use super::SerializationBackend;
use crate::constants::TENSOR_ENTRY_NAME;
use crate::embedding::Embeddings;
use crate::storage::error::{BackendError, BackendResult};

/// Binary safetensors container with a single `F32` tensor named
/// `embeddings`: shape `[d]` for one vector, `[n, d]` for a batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct TensorBackend;

impl SerializationBackend for TensorBackend {
    fn tag(&self) -> &str {
        "tensor"
    }

    fn extension(&self) -> &str {
        "safetensors"
    }

    fn encode(&self, embeddings: &Embeddings) -> BackendResult<Vec<u8>> {
        let shape = tensor_shape(embeddings)?;
        let bytes: Vec<u8> = embeddings.values().flat_map(f32::to_le_bytes).collect();

        let view = TensorView::new(Dtype::F32, shape, &bytes)?;
        let mut tensors: HashMap<String, TensorView<'_>> = HashMap::new();
        tensors.insert(TENSOR_ENTRY_NAME.to_string(), view);

        Ok(safetensors::serialize(
            &tensors,
            &None::<HashMap<String, String>>,
        )?)
    }

    fn decode(&self, bytes: &[u8]) -> BackendResult<Embeddings> {
        let tensors = SafeTensors::deserialize(bytes)?;
        let view = tensors.tensor(TENSOR_ENTRY_NAME)?;

        if view.dtype() != Dtype::F32 {
            return Err(BackendError::Dtype {
                found: format!("{:?}", view.dtype()),
            });
        }

        let values: Vec<f32> = view
            .data()
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        match *view.shape() {
            [_] => Ok(Embeddings::One(values)),
            [rows, 0] => Ok(Embeddings::Many(vec![Vec::new(); rows])),
            [_, width] => Ok(Embeddings::Many(
                values.chunks_exact(width).map(<[f32]>::to_vec).collect(),
            )),
            ref shape => Err(BackendError::Rank {
                shape: shape.to_vec(),
            }),
        }
    }
}

fn tensor_shape(embeddings: &Embeddings) -> BackendResult<Vec<usize>> {
    match embeddings {
        Embeddings::One(vector) => Ok(vec![vector.len()]),
        Embeddings::Many(rows) => {
            let width = rows.first().map_or(0, Vec::len);
            if let Some((row, actual)) = rows
                .iter()
                .map(Vec::len)
                .enumerate()
                .find(|(_, len)| *len != width)
            {
                return Err(BackendError::Ragged {
                    row,
                    expected: width,
                    actual,
                });
            }
            Ok(vec![rows.len(), width])
        }
    }
}
