//! Data-integrity errors raised while loading vocabularies, embeddings and splits.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::label::LabelError;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("{kind} file not found: {path}")]
    Missing { kind: &'static str, path: PathBuf },

    #[error("split '{split}' has mismatched line counts: {premises} premises, {hypotheses} hypotheses, {labels} labels")]
    LineCountMismatch {
        split:      String,
        premises:   usize,
        hypotheses: usize,
        labels:     usize,
    },

    #[error("{path}:{line}: {source}")]
    Label {
        path:   PathBuf,
        line:   usize,
        #[source]
        source: LabelError,
    },

    #[error("vocabulary file {0} is empty")]
    EmptyVocabulary(PathBuf),

    #[error("{path}:{line}: '{token}' is not a token id")]
    BadTokenId { path: PathBuf, line: usize, token: String },

    #[error("{path}:{line}: empty {side} sequence")]
    EmptySequence { path: PathBuf, line: usize, side: &'static str },

    #[error("token id {id} is outside the embedding table ({rows} rows)")]
    IdOutOfRange { id: u32, rows: usize },

    #[error("embedding file {path} has no tensor named '{key}'")]
    MissingEmbeddingKey { path: PathBuf, key: String },

    #[error("embedding tensor '{key}' must be 2-D f32 or f64, found {dtype} with shape {shape:?}")]
    EmbeddingLayout { key: String, dtype: String, shape: Vec<usize> },

    #[error("vocabulary has {vocab} tokens but the embedding table has {rows} rows")]
    VocabEmbeddingMismatch { vocab: usize, rows: usize },
}
