// ============================================================
// Layer 4 — Vocabulary
// ============================================================
// One token per line; the 0-indexed line number is the token id.
// Token ids in the split files were produced against this file,
// so only its size matters here: it must match the number of
// rows in the embedding table.

use anyhow::{Context, Result};
use std::{fs, path::Path};

use crate::data::error::DataError;

#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    tokens: Vec<String>,
}

impl Vocabulary {
    /// Read a vocabulary file. A missing or empty file is fatal.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DataError::Missing { kind: "vocabulary", path: path.to_path_buf() }.into());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read vocabulary '{}'", path.display()))?;
        let vocab = Self::from_tokens(text.lines().map(str::to_string));
        if vocab.is_empty() {
            return Err(DataError::EmptyVocabulary(path.to_path_buf()).into());
        }
        tracing::info!("Loaded vocabulary of {} tokens from '{}'", vocab.len(), path.display());
        Ok(vocab)
    }

    pub fn from_tokens(tokens: impl IntoIterator<Item = String>) -> Self {
        Self { tokens: tokens.into_iter().collect() }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_one_token_per_line() {
        let tmp  = TempDir::new().unwrap();
        let path = tmp.path().join("vocab.dat");
        fs::write(&path, "<pad>\n<sos>\nthe\ncat\n").unwrap();

        let vocab = Vocabulary::load(&path).unwrap();
        assert_eq!(vocab.len(), 4);
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = Vocabulary::load(tmp.path().join("nope.dat")).unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::Missing { .. })));
    }

    #[test]
    fn test_empty_file_is_fatal() {
        let tmp  = TempDir::new().unwrap();
        let path = tmp.path().join("vocab.dat");
        fs::write(&path, "").unwrap();

        let err = Vocabulary::load(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<DataError>(), Some(DataError::EmptyVocabulary(_))));
    }
}
