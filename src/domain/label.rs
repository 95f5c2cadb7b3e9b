// ============================================================
// Layer 3 — Label Domain Type
// ============================================================
// The three NLI relations and their one-hot encoding.
//
// The ordinal assignment is fixed and shared by the batcher,
// the loss, the evaluator and the confusion matrix:
//
//   entailment    → 0 → [1, 0, 0]
//   neutral       → 1 → [0, 1, 0]
//   contradiction → 2 → [0, 0, 1]
//
// Reference: Rust Book §6 (Enums), §9 (Recoverable Errors)

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to turn text or a score vector into a [`Label`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LabelError {
    #[error("unrecognised gold label '{0}' (expected entailment, neutral or contradiction)")]
    Unknown(String),

    #[error("one-hot vector has width {0}, expected {width}", width = Label::COUNT)]
    Width(usize),

    #[error("class index {0} is out of range")]
    Index(usize),
}

/// Relation between a premise and a hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Entailment,
    Neutral,
    Contradiction,
}

impl Label {
    /// Number of classes the classifier predicts.
    pub const COUNT: usize = 3;

    /// All labels in ordinal order.
    pub const ALL: [Label; Label::COUNT] = [Label::Entailment, Label::Neutral, Label::Contradiction];

    pub fn index(self) -> usize {
        match self {
            Label::Entailment    => 0,
            Label::Neutral       => 1,
            Label::Contradiction => 2,
        }
    }

    pub fn from_index(index: usize) -> Result<Self, LabelError> {
        Self::ALL.get(index).copied().ok_or(LabelError::Index(index))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Entailment    => "entailment",
            Label::Neutral       => "neutral",
            Label::Contradiction => "contradiction",
        }
    }

    pub fn one_hot(self) -> [f32; Label::COUNT] {
        let mut v = [0.0; Label::COUNT];
        v[self.index()] = 1.0;
        v
    }

    /// Decode a score or one-hot vector by argmax.
    /// Ties resolve to the lowest index.
    pub fn from_scores(scores: &[f32]) -> Result<Self, LabelError> {
        if scores.len() != Self::COUNT {
            return Err(LabelError::Width(scores.len()));
        }
        let mut best = 0;
        for (i, &s) in scores.iter().enumerate().skip(1) {
            if s > scores[best] {
                best = i;
            }
        }
        Self::from_index(best)
    }
}

impl FromStr for Label {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "entailment"    => Ok(Label::Entailment),
            "neutral"       => Ok(Label::Neutral),
            "contradiction" => Ok(Label::Contradiction),
            other           => Err(LabelError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_hot_has_single_one() {
        for label in Label::ALL {
            let v = label.one_hot();
            assert_eq!(v.iter().filter(|&&x| x == 1.0).count(), 1);
            assert_eq!(v.iter().filter(|&&x| x == 0.0).count(), 2);
        }
    }

    #[test]
    fn test_string_one_hot_round_trip() {
        for name in ["entailment", "neutral", "contradiction"] {
            let label: Label = name.parse().unwrap();
            let decoded = Label::from_scores(&label.one_hot()).unwrap();
            assert_eq!(decoded, label);
            assert_eq!(decoded.as_str(), name);
        }
    }

    #[test]
    fn test_one_hot_is_injective() {
        let a = Label::Entailment.one_hot();
        let b = Label::Neutral.one_hot();
        let c = Label::Contradiction.one_hot();
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_ne!(a, c);
    }

    #[test]
    fn test_ordinals_match_file_convention() {
        assert_eq!(Label::Entailment.one_hot(), [1.0, 0.0, 0.0]);
        assert_eq!(Label::Neutral.one_hot(), [0.0, 1.0, 0.0]);
        assert_eq!(Label::Contradiction.one_hot(), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_unknown_label_is_an_error() {
        let err = "maybe".parse::<Label>().unwrap_err();
        assert_eq!(err, LabelError::Unknown("maybe".to_string()));
        assert!(err.to_string().contains("maybe"));
    }

    #[test]
    fn test_case_is_significant() {
        assert!("Entailment".parse::<Label>().is_err());
    }

    #[test]
    fn test_argmax_of_scores() {
        assert_eq!(Label::from_scores(&[-1.0, 2.5, 0.3]).unwrap(), Label::Neutral);
        assert_eq!(Label::from_scores(&[0.0, 0.0]), Err(LabelError::Width(2)));
    }

    #[test]
    fn test_from_index_bounds() {
        assert_eq!(Label::from_index(2).unwrap(), Label::Contradiction);
        assert_eq!(Label::from_index(3), Err(LabelError::Index(3)));
    }
}
