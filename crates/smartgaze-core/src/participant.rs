//! Participant identity, experimental condition, and the precomputed
//! product-to-score map the session consumes.

use std::collections::BTreeMap;

use rand::prelude::*;
use rand_pcg::Mcg128Xsl64;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Assigned experimental condition: whether the interface surfaces the
/// recommendation badge for the participant's best-scored product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    WithRecommendation,
    WithoutRecommendation,
}

/// Self-reported demographic attributes; all optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub label: String,
    #[serde(default)]
    pub demographics: Demographics,
    pub condition: Condition,
    /// Product id -> SmartScore, immutable once loaded for the session.
    pub scores: BTreeMap<String, f64>,
}

impl Participant {
    pub fn new(
        label: impl Into<String>,
        condition: Condition,
        scores: BTreeMap<String, f64>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            demographics: Demographics::default(),
            condition,
            scores,
        }
    }

    /// The participant's best-scored product; ties resolve to the first id
    /// in lexicographic order.
    pub fn recommended_product(&self) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for (id, score) in &self.scores {
            match best {
                Some((_, s)) if *score <= s => {}
                _ => best = Some((id.as_str(), *score)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// The recommended product as the layout generator should see it:
    /// `None` when the condition hides recommendations, so badge
    /// rectangles are simply absent and no downstream branch is needed.
    pub fn visible_recommendation(&self) -> Option<&str> {
        match self.condition {
            Condition::WithRecommendation => self.recommended_product(),
            Condition::WithoutRecommendation => None,
        }
    }
}

/// Assign a condition, optionally seeded for reproducible counterbalancing.
pub fn assign_condition(seed: Option<u64>) -> Condition {
    let mut rng = match seed {
        Some(seed) => Mcg128Xsl64::seed_from_u64(seed),
        None => Mcg128Xsl64::from_entropy(),
    };
    if rng.gen_bool(0.5) {
        Condition::WithRecommendation
    } else {
        Condition::WithoutRecommendation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn recommendation_is_argmax_with_lexicographic_ties() {
        let p = Participant::new(
            "P01",
            Condition::WithRecommendation,
            scores(&[("b", 0.9), ("a", 0.9), ("c", 0.1)]),
        );
        assert_eq!(p.recommended_product(), Some("a"));
    }

    #[test]
    fn hidden_condition_exposes_no_recommendation() {
        let p = Participant::new(
            "P02",
            Condition::WithoutRecommendation,
            scores(&[("a", 0.5)]),
        );
        assert_eq!(p.recommended_product(), Some("a"));
        assert_eq!(p.visible_recommendation(), None);
    }

    #[test]
    fn empty_scores_yield_no_recommendation() {
        let p = Participant::new("P03", Condition::WithRecommendation, BTreeMap::new());
        assert_eq!(p.recommended_product(), None);
    }

    #[test]
    fn seeded_assignment_is_reproducible() {
        let a = assign_condition(Some(42));
        let b = assign_condition(Some(42));
        assert_eq!(a, b);
    }
}
