use burn::data::dataset::Dataset;

use crate::domain::{example::NliExample, label::Label};

/// One loaded split, indexable by Burn's DataLoader.
pub struct NliDataset {
    examples: Vec<NliExample>,
}

impl NliDataset {
    pub fn new(examples: Vec<NliExample>) -> Self { Self { examples } }

    pub fn examples(&self) -> &[NliExample] { &self.examples }

    /// Number of examples per gold class, in label order.
    pub fn label_counts(&self) -> [usize; Label::COUNT] {
        let mut counts = [0; Label::COUNT];
        for ex in &self.examples {
            counts[ex.label.index()] += 1;
        }
        counts
    }
}

impl Dataset<NliExample> for NliDataset {
    fn get(&self, index: usize) -> Option<NliExample> {
        self.examples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.examples.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_counts() {
        let ds = NliDataset::new(vec![
            NliExample::new(vec![1], vec![1], Label::Neutral),
            NliExample::new(vec![1], vec![1], Label::Neutral),
            NliExample::new(vec![1], vec![1], Label::Contradiction),
        ]);
        assert_eq!(ds.label_counts(), [0, 2, 1]);
        assert_eq!(ds.len(), 3);
        assert!(ds.get(3).is_none());
    }
}
