// ============================================================
// Layer 4 — Pretrained Embedding Table
// ============================================================
// A dense (vocab_size × embedding_dim) matrix read once from a
// safetensors file that stores it under a single fixed key
// (`glove` by default). The table is never trained: batchers
// share it behind an Arc and copy rows into each batch tensor.
//
// Reference: safetensors crate documentation

use anyhow::{Context, Result};
use safetensors::{tensor::Dtype, SafeTensorError, SafeTensors};
use std::{fs, path::Path};

use crate::data::error::DataError;

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    rows: usize,
    dim:  usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    pub fn new(rows: usize, dim: usize, data: Vec<f32>) -> Result<Self> {
        anyhow::ensure!(
            data.len() == rows * dim,
            "embedding data has {} values, expected {rows} × {dim}",
            data.len()
        );
        Ok(Self { rows, dim, data })
    }

    /// Load the tensor stored under `key`. A missing file is fatal.
    pub fn load(path: impl AsRef<Path>, key: &str) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::Missing { kind: "embedding", path: path.to_path_buf() }.into());
        }
        let bytes = fs::read(path)
            .with_context(|| format!("Cannot read embeddings '{}'", path.display()))?;
        let tensors = SafeTensors::deserialize(&bytes)
            .map_err(|e| anyhow::anyhow!("safetensors parse error in '{}': {e:?}", path.display()))?;

        let view = match tensors.tensor(key) {
            Ok(view) => view,
            Err(SafeTensorError::TensorNotFound(_)) => {
                return Err(DataError::MissingEmbeddingKey {
                    path: path.to_path_buf(),
                    key:  key.to_string(),
                }
                .into())
            }
            Err(e) => anyhow::bail!("Cannot read tensor '{key}' from '{}': {e:?}", path.display()),
        };

        let shape = view.shape().to_vec();
        let layout_error = || DataError::EmbeddingLayout {
            key:   key.to_string(),
            dtype: format!("{:?}", view.dtype()),
            shape: shape.clone(),
        };
        let [rows, dim] = shape[..] else {
            return Err(layout_error().into());
        };

        let data: Vec<f32> = match view.dtype() {
            Dtype::F32 => view
                .data()
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
            Dtype::F64 => view
                .data()
                .chunks_exact(8)
                .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
                .collect(),
            _ => return Err(layout_error().into()),
        };

        tracing::info!("Loaded {rows} × {dim} embeddings from '{}'", path.display());
        Self::new(rows, dim, data)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, id: u32) -> Option<&[f32]> {
        let start = id as usize * self.dim;
        self.data.get(start..start + self.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safetensors::tensor::TensorView;
    use tempfile::TempDir;

    fn write_table(path: &Path, key: &str, rows: usize, dim: usize) -> Vec<f32> {
        let values: Vec<f32> = (0..rows * dim).map(|i| i as f32 * 0.5).collect();
        let bytes: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = TensorView::new(Dtype::F32, vec![rows, dim], &bytes).unwrap();
        let out = safetensors::serialize([(key, view)], None::<std::collections::HashMap<String, String>>).unwrap();
        fs::write(path, out).unwrap();
        values
    }

    #[test]
    fn test_load_rows() {
        let tmp  = TempDir::new().unwrap();
        let path = tmp.path().join("glove.safetensors");
        let values = write_table(&path, "glove", 4, 3);

        let table = EmbeddingMatrix::load(&path, "glove").unwrap();
        assert_eq!((table.rows(), table.dim()), (4, 3));
        assert_eq!(table.row(2).unwrap(), &values[6..9]);
        assert!(table.row(4).is_none());
    }

    #[test]
    fn test_wrong_key_is_fatal() {
        let tmp  = TempDir::new().unwrap();
        let path = tmp.path().join("glove.safetensors");
        write_table(&path, "fasttext", 2, 2);

        let err = EmbeddingMatrix::load(&path, "glove").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::MissingEmbeddingKey { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let err = EmbeddingMatrix::load("/definitely/not/here.safetensors", "glove").unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::Missing { .. })));
    }

    #[test]
    fn test_new_checks_size() {
        assert!(EmbeddingMatrix::new(2, 3, vec![0.0; 5]).is_err());
    }
}
