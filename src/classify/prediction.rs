use serde::{Deserialize, Serialize};

/// One ranked candidate label produced by a backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: String,
    /// Confidence in [0, 1].
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }

    /// True when the confidence is a finite value in [0, 1].
    pub fn is_well_formed(&self) -> bool {
        self.confidence.is_finite() && (0.0..=1.0).contains(&self.confidence)
    }
}

/// Sort descending by confidence and keep at most `top_k` entries.
///
/// Equal confidences keep their original relative order.
pub fn rank_predictions(mut predictions: Vec<Prediction>, top_k: usize) -> Vec<Prediction> {
    predictions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    predictions.truncate(top_k);
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_bounds() {
        assert!(Prediction::new("paper", 0.0).is_well_formed());
        assert!(Prediction::new("paper", 1.0).is_well_formed());
        assert!(!Prediction::new("paper", 1.01).is_well_formed());
        assert!(!Prediction::new("paper", -0.1).is_well_formed());
        assert!(!Prediction::new("paper", f32::NAN).is_well_formed());
    }

    #[test]
    fn ranking_sorts_descending_and_truncates() {
        let ranked = rank_predictions(
            vec![
                Prediction::new("glass", 0.1),
                Prediction::new("metal", 0.7),
                Prediction::new("paper", 0.2),
            ],
            2,
        );
        assert_eq!(
            ranked,
            vec![Prediction::new("metal", 0.7), Prediction::new("paper", 0.2)]
        );
    }

    #[test]
    fn ranking_is_stable_for_ties() {
        let ranked = rank_predictions(
            vec![Prediction::new("a", 0.5), Prediction::new("b", 0.5)],
            5,
        );
        assert_eq!(ranked[0].label, "a");
        assert_eq!(ranked[1].label, "b");
    }
}
