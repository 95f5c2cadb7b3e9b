// ============================================================
// Layer 4 — Split Loader
// ============================================================
// Loads one split (train / dev / test) from three parallel files
// in the data directory:
//
//   {split}.ids.premise     → "12 7 93 4"     (token ids, one example per line)
//   {split}.ids.hypothesis  → "12 55 4"
//   {split}.goldlabel       → "entailment"
//
// Line i of each file belongs to example i, so the three files
// must have the same number of lines; anything else is a fatal
// data error rather than a silent truncation to the shortest file.
// A sample limit keeps the first N lines.
//
// Reference: Rust Book §9 (Error Handling)
//            Rust Book §12 (Reading a File)

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::error::DataError;
use crate::domain::example::NliExample;
use crate::domain::label::Label;
use crate::domain::traits::ExampleSource;

/// Reads `{split}.*` files from a directory.
/// Implements the ExampleSource trait from Layer 3.
pub struct SplitLoader {
    dir: PathBuf,
}

impl SplitLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn split_path(&self, split: &str, suffix: &str) -> PathBuf {
        self.dir.join(format!("{split}.{suffix}"))
    }
}

impl ExampleSource for SplitLoader {
    fn load_split(&self, split: &str, limit: Option<usize>) -> Result<Vec<NliExample>> {
        let premise_path    = self.split_path(split, "ids.premise");
        let hypothesis_path = self.split_path(split, "ids.hypothesis");
        let label_path      = self.split_path(split, "goldlabel");

        let premises   = read_lines(&premise_path, "premise")?;
        let hypotheses = read_lines(&hypothesis_path, "hypothesis")?;
        let labels     = read_lines(&label_path, "gold label")?;

        if premises.len() != hypotheses.len() || premises.len() != labels.len() {
            return Err(DataError::LineCountMismatch {
                split:      split.to_string(),
                premises:   premises.len(),
                hypotheses: hypotheses.len(),
                labels:     labels.len(),
            }
            .into());
        }

        let n = limit.unwrap_or(premises.len()).min(premises.len());
        let mut examples = Vec::with_capacity(n);

        for i in 0..n {
            let line       = i + 1;
            let premise    = parse_ids(&premises[i], &premise_path, line, "premise")?;
            let hypothesis = parse_ids(&hypotheses[i], &hypothesis_path, line, "hypothesis")?;
            let label: Label = labels[i].parse().map_err(|source| DataError::Label {
                path: label_path.clone(),
                line,
                source,
            })?;
            examples.push(NliExample::new(premise, hypothesis, label));
        }

        tracing::info!(
            "Loaded {} '{}' examples from '{}' ({} available)",
            examples.len(),
            split,
            self.dir.display(),
            premises.len()
        );
        Ok(examples)
    }
}

/// Check that every token id can be looked up in a table of `rows` rows.
pub fn validate_ids(examples: &[NliExample], rows: usize) -> Result<(), DataError> {
    match examples.iter().filter_map(NliExample::max_id).max() {
        Some(id) if id as usize >= rows => Err(DataError::IdOutOfRange { id, rows }),
        _ => Ok(()),
    }
}

fn read_lines(path: &Path, kind: &'static str) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(DataError::Missing { kind, path: path.to_path_buf() }.into());
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

fn parse_ids(line_text: &str, path: &Path, line: usize, side: &'static str) -> Result<Vec<u32>, DataError> {
    let ids = line_text
        .split_whitespace()
        .map(|tok| {
            tok.parse::<u32>().map_err(|_| DataError::BadTokenId {
                path:  path.to_path_buf(),
                line,
                token: tok.to_string(),
            })
        })
        .collect::<Result<Vec<u32>, DataError>>()?;

    // The encoder selects position `len - 1`, so an empty sequence has no output.
    if ids.is_empty() {
        return Err(DataError::EmptySequence { path: path.to_path_buf(), line, side });
    }
    Ok(ids)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_split(dir: &Path, split: &str, premises: &str, hypotheses: &str, labels: &str) {
        fs::write(dir.join(format!("{split}.ids.premise")), premises).unwrap();
        fs::write(dir.join(format!("{split}.ids.hypothesis")), hypotheses).unwrap();
        fs::write(dir.join(format!("{split}.goldlabel")), labels).unwrap();
    }

    fn data_error(err: &anyhow::Error) -> &DataError {
        err.downcast_ref::<DataError>().expect("expected a DataError")
    }

    #[test]
    fn test_loads_parallel_lines() {
        let tmp = TempDir::new().unwrap();
        write_split(tmp.path(), "dev", "4 5 6\n7 8\n", "9\n10 11\n", "neutral\ncontradiction\n");

        let examples = SplitLoader::new(tmp.path()).load_split("dev", None).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[0], NliExample::new(vec![4, 5, 6], vec![9], Label::Neutral));
        assert_eq!(examples[1].label, Label::Contradiction);
    }

    #[test]
    fn test_limit_takes_first_lines() {
        let tmp = TempDir::new().unwrap();
        write_split(tmp.path(), "train", "1\n2\n3\n", "1\n2\n3\n", "entailment\nneutral\ncontradiction\n");

        let examples = SplitLoader::new(tmp.path()).load_split("train", Some(2)).unwrap();
        assert_eq!(examples.len(), 2);
        assert_eq!(examples[1].premise, vec![2]);
    }

    #[test]
    fn test_line_count_mismatch_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write_split(tmp.path(), "dev", "1\n2\n", "1\n2\n", "neutral\n");

        let err = SplitLoader::new(tmp.path()).load_split("dev", Some(1)).unwrap_err();
        assert!(matches!(data_error(&err), DataError::LineCountMismatch { labels: 1, .. }));
    }

    #[test]
    fn test_bad_label_is_fatal() {
        let tmp = TempDir::new().unwrap();
        write_split(tmp.path(), "dev", "1\n2\n", "1\n2\n", "neutral\nunsure\n");

        let err = SplitLoader::new(tmp.path()).load_split("dev", None).unwrap_err();
        assert!(matches!(data_error(&err), DataError::Label { line: 2, .. }));
    }

    #[test]
    fn test_empty_sequence_is_rejected() {
        let tmp = TempDir::new().unwrap();
        write_split(tmp.path(), "dev", "1 2\n\n", "1\n2\n", "neutral\nneutral\n");

        let err = SplitLoader::new(tmp.path()).load_split("dev", None).unwrap_err();
        assert!(matches!(data_error(&err), DataError::EmptySequence { line: 2, side: "premise", .. }));
    }

    #[test]
    fn test_non_numeric_token_is_rejected() {
        let tmp = TempDir::new().unwrap();
        write_split(tmp.path(), "dev", "1 x\n", "1\n", "neutral\n");

        let err = SplitLoader::new(tmp.path()).load_split("dev", None).unwrap_err();
        assert!(matches!(data_error(&err), DataError::BadTokenId { .. }));
    }

    #[test]
    fn test_missing_split_file() {
        let tmp = TempDir::new().unwrap();
        let err = SplitLoader::new(tmp.path()).load_split("test", None).unwrap_err();
        assert!(matches!(data_error(&err), DataError::Missing { .. }));
    }

    #[test]
    fn test_validate_ids_against_table() {
        let examples = vec![NliExample::new(vec![1, 4], vec![2], Label::Neutral)];
        assert!(validate_ids(&examples, 5).is_ok());
        assert!(matches!(validate_ids(&examples, 4), Err(DataError::IdOutOfRange { id: 4, rows: 4 })));
    }
}
