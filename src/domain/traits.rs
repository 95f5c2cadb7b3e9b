// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer loads examples through this trait so
// the split-file loader can be replaced by an in-memory source
// in tests without touching the pipeline.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;

use crate::domain::example::NliExample;

// ─── ExampleSource ────────────────────────────────────────────────────────────
/// Any component that can produce the labelled examples of one split.
///
/// Implementations:
///   - SplitLoader → reads `{split}.ids.premise` / `.ids.hypothesis` / `.goldlabel`
///   - Vec<NliExample> → an already materialised split
pub trait ExampleSource {
    /// Load the examples of `split`, keeping at most `limit` of them
    /// (`None` keeps every line).
    fn load_split(&self, split: &str, limit: Option<usize>) -> Result<Vec<NliExample>>;
}

impl ExampleSource for Vec<NliExample> {
    fn load_split(&self, _split: &str, limit: Option<usize>) -> Result<Vec<NliExample>> {
        let n = limit.unwrap_or(self.len()).min(self.len());
        Ok(self[..n].to_vec())
    }
}
