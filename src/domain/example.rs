// ============================================================
// Layer 3 — NLI Example Domain Type
// ============================================================
// One line of a split: premise ids, hypothesis ids, gold label.
// Ids index the vocabulary and the embedding table.

use serde::{Deserialize, Serialize};

use crate::domain::label::Label;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NliExample {
    pub premise:    Vec<u32>,
    pub hypothesis: Vec<u32>,
    pub label:      Label,
}

impl NliExample {
    pub fn new(premise: Vec<u32>, hypothesis: Vec<u32>, label: Label) -> Self {
        Self { premise, hypothesis, label }
    }

    /// Largest token id on either side, if any.
    pub fn max_id(&self) -> Option<u32> {
        self.premise.iter().chain(self.hypothesis.iter()).copied().max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_id_spans_both_sides() {
        let ex = NliExample::new(vec![4, 2], vec![9, 1], Label::Neutral);
        assert_eq!(ex.max_id(), Some(9));
    }
}
