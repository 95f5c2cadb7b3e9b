// ============================================================
// Layer 3 — Confusion Matrix
// ============================================================
// 3×3 count table: rows = gold class, columns = predicted class.
// Accuracy is always derived from the matrix (trace / total) so
// the two numbers in a report can never disagree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::label::Label;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub counts: [[usize; Label::COUNT]; Label::COUNT],
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, gold: Label, predicted: Label) {
        self.counts[gold.index()][predicted.index()] += 1;
    }

    pub fn get(&self, gold: Label, predicted: Label) -> usize {
        self.counts[gold.index()][predicted.index()]
    }

    /// Number of evaluated examples per gold class.
    pub fn row_sums(&self) -> [usize; Label::COUNT] {
        let mut sums = [0; Label::COUNT];
        for (sum, row) in sums.iter_mut().zip(self.counts.iter()) {
            *sum = row.iter().sum();
        }
        sums
    }

    pub fn trace(&self) -> usize {
        (0..Label::COUNT).map(|i| self.counts[i][i]).sum()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Fraction of correct predictions, 0 when the matrix is empty.
    pub fn accuracy(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => self.trace() as f64 / n as f64,
        }
    }
}

/// Table with gold labels down the side, predictions across the top
/// and the number of examples of each gold label in the last column.
impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>15}", "gold \\ pred")?;
        for label in Label::ALL {
            write!(f, "{:>15}", label.as_str())?;
        }
        write!(f, "{:>15}", "total")?;
        let sums = self.row_sums();
        for gold in Label::ALL {
            write!(f, "\n{:>15}", gold.as_str())?;
            for predicted in Label::ALL {
                write!(f, "{:>15}", self.get(gold, predicted))?;
            }
            write!(f, "{:>15}", sums[gold.index()])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (ConfusionMatrix, Vec<(Label, Label)>) {
        let pairs = vec![
            (Label::Entailment, Label::Entailment),
            (Label::Entailment, Label::Neutral),
            (Label::Neutral, Label::Neutral),
            (Label::Contradiction, Label::Entailment),
            (Label::Contradiction, Label::Contradiction),
            (Label::Contradiction, Label::Contradiction),
        ];
        let mut cm = ConfusionMatrix::new();
        for &(g, p) in &pairs {
            cm.record(g, p);
        }
        (cm, pairs)
    }

    #[test]
    fn test_row_sums_are_gold_counts() {
        let (cm, pairs) = sample();
        for label in Label::ALL {
            let gold_count = pairs.iter().filter(|(g, _)| *g == label).count();
            assert_eq!(cm.row_sums()[label.index()], gold_count);
        }
    }

    #[test]
    fn test_trace_over_total_is_accuracy() {
        let (cm, pairs) = sample();
        let correct = pairs.iter().filter(|(g, p)| g == p).count();
        assert_eq!(cm.trace(), correct);
        assert_eq!(cm.total(), pairs.len());
        assert!((cm.accuracy() - correct as f64 / pairs.len() as f64).abs() < 1e-12);
    }

    #[test]
    fn test_cells_are_gold_by_predicted() {
        let (cm, _) = sample();
        assert_eq!(cm.get(Label::Contradiction, Label::Entailment), 1);
        assert_eq!(cm.get(Label::Entailment, Label::Contradiction), 0);
    }

    #[test]
    fn test_empty_matrix_accuracy_is_zero() {
        assert_eq!(ConfusionMatrix::new().accuracy(), 0.0);
    }

    #[test]
    fn test_display_has_header_and_one_row_per_gold_label() {
        let (m, _) = sample();
        let text = m.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("contradiction"));
        assert!(lines[0].trim_end().ends_with("total"));
        // contradiction row: 1 0 2, three gold examples
        assert_eq!(lines[3].split_whitespace().collect::<Vec<_>>(), ["contradiction", "1", "0", "2", "3"]);
    }
}
