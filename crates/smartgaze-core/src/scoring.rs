//! Compatibility scoring: questionnaire answers become preference weights,
//! the product catalog is normalized attribute by attribute, and every
//! product receives a personalized SmartScore (weighted sum over the sum of
//! weights). The ranked output feeds the participant's immutable
//! product-to-score map and the exported ranking tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Raw questionnaire answers, on the original slider scales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireAnswers {
    /// Portion size importance (0-5).
    pub portion: u8,
    /// Healthy-diet importance (1-7).
    pub diet: u8,
    /// Low-salt importance (0-5).
    pub salt: u8,
    /// Low saturated fat importance (0-5).
    pub fat: u8,
    /// Natural/organic ingredients importance (0-5).
    pub natural: u8,
    /// Quick-and-easy preparation importance (0-5).
    pub convenience: u8,
    /// Low price / value importance (0-5).
    pub price: u8,
}

impl QuestionnaireAnswers {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let checks: [(&str, u8, u8, u8); 7] = [
            ("portion", self.portion, 0, 5),
            ("diet", self.diet, 1, 7),
            ("salt", self.salt, 0, 5),
            ("fat", self.fat, 0, 5),
            ("natural", self.natural, 0, 5),
            ("convenience", self.convenience, 0, 5),
            ("price", self.price, 0, 5),
        ];
        for (field, value, min, max) in checks {
            if value < min || value > max {
                return Err(ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: format!("{value} outside [{min}, {max}]"),
                });
            }
        }
        Ok(())
    }

    /// Normalize each answer by its own scale maximum.
    pub fn weights(&self) -> PreferenceWeights {
        PreferenceWeights {
            portion: self.portion as f64 / 5.0,
            diet: self.diet as f64 / 7.0,
            salt: self.salt as f64 / 5.0,
            fat: self.fat as f64 / 5.0,
            natural: self.natural as f64 / 5.0,
            convenience: self.convenience as f64 / 5.0,
            price: self.price as f64 / 5.0,
        }
    }
}

/// Normalized preference weights, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreferenceWeights {
    pub portion: f64,
    pub diet: f64,
    pub salt: f64,
    pub fat: f64,
    pub natural: f64,
    pub convenience: f64,
    pub price: f64,
}

impl PreferenceWeights {
    pub fn sum(&self) -> f64 {
        self.portion
            + self.diet
            + self.salt
            + self.fat
            + self.natural
            + self.convenience
            + self.price
    }
}

/// One catalog entry as loaded from the product sheets. The
/// natural-ingredients and preparation-time columns are free text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAttributes {
    pub name: String,
    pub category: String,
    pub calories: f64,
    pub sodium_mg: f64,
    pub saturated_fat_g: f64,
    pub protein_g: f64,
    pub natural_ingredients: String,
    pub preparation_time: String,
    pub price_usd: f64,
    #[serde(default)]
    pub key_comments: Option<String>,
}

/// A product with its personalized score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    pub name: String,
    pub category: String,
    pub smart_score: f64,
    #[serde(default)]
    pub key_comments: Option<String>,
}

/// Per-category score summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: String,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Minutes extracted from a preparation-time cell. Ready-to-eat entries
/// ("listo...") are zero; otherwise the first integer in the text.
pub fn parse_prep_minutes(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let lowered = lowered.trim();
    if lowered.contains("listo") {
        return 0.0;
    }
    let digits: String = lowered
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0.0)
}

/// 1.0 when the natural-ingredients cell affirms natural/organic content.
pub fn natural_as_binary(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    const KEYWORDS: [&str; 5] = ["sí", "si", "orgánico", "organico", "organic"];
    if KEYWORDS.iter().any(|k| lowered.contains(k)) {
        1.0
    } else {
        0.0
    }
}

/// `(x - min) / (max - min)` per value, with a zero-span guard that maps a
/// constant column to all zeros.
fn normalize_minmax(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    let denom = if span != 0.0 { span } else { 1.0 };
    values.iter().map(|v| (v - min) / denom).collect()
}

/// SmartScore engine: holds one participant's weights and scores catalogs
/// against them.
#[derive(Debug, Clone)]
pub struct SmartScoreEngine {
    weights: PreferenceWeights,
}

impl SmartScoreEngine {
    pub fn new(weights: PreferenceWeights) -> Self {
        Self { weights }
    }

    pub fn from_answers(answers: &QuestionnaireAnswers) -> Self {
        Self::new(answers.weights())
    }

    pub fn weights(&self) -> &PreferenceWeights {
        &self.weights
    }

    /// Score every product in the catalog, ranked by score descending.
    ///
    /// Inverted attributes (sodium, saturated fat, price, preparation
    /// minutes) reward low values; direct attributes (protein for diet,
    /// calories for portion, the natural flag) reward high values.
    pub fn score_catalog(&self, catalog: &[ProductAttributes]) -> Vec<ScoredProduct> {
        if catalog.is_empty() {
            return Vec::new();
        }

        let column = |f: fn(&ProductAttributes) -> f64| -> Vec<f64> {
            catalog.iter().map(f).collect()
        };
        let sodium = normalize_minmax(&column(|p| p.sodium_mg));
        let fat = normalize_minmax(&column(|p| p.saturated_fat_g));
        let price = normalize_minmax(&column(|p| p.price_usd));
        let minutes: Vec<f64> = catalog
            .iter()
            .map(|p| parse_prep_minutes(&p.preparation_time))
            .collect();
        let convenience = normalize_minmax(&minutes);
        let protein = normalize_minmax(&column(|p| p.protein_g));
        let calories = normalize_minmax(&column(|p| p.calories));

        let w = &self.weights;
        let sum_w = if w.sum() != 0.0 { w.sum() } else { 1.0 };

        let mut scored: Vec<ScoredProduct> = catalog
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let score = (w.salt * (1.0 - sodium[i])
                    + w.fat * (1.0 - fat[i])
                    + w.natural * natural_as_binary(&p.natural_ingredients)
                    + w.convenience * (1.0 - convenience[i])
                    + w.price * (1.0 - price[i])
                    + w.portion * calories[i]
                    + w.diet * protein[i])
                    / sum_w;
                ScoredProduct {
                    name: p.name.clone(),
                    category: p.category.clone(),
                    smart_score: score,
                    key_comments: p.key_comments.clone(),
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.smart_score
                .partial_cmp(&a.smart_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });
        scored
    }

    /// The immutable product-to-score map a participant carries into the
    /// session.
    pub fn score_map(&self, catalog: &[ProductAttributes]) -> BTreeMap<String, f64> {
        self.score_catalog(catalog)
            .into_iter()
            .map(|p| (p.name, p.smart_score))
            .collect()
    }
}

/// Best `k` products per category, preserving score order within each
/// category.
pub fn top_per_category(scored: &[ScoredProduct], k: usize) -> Vec<ScoredProduct> {
    let mut taken: BTreeMap<&str, usize> = BTreeMap::new();
    let mut top = Vec::new();
    for product in scored {
        let count = taken.entry(product.category.as_str()).or_insert(0);
        if *count < k {
            *count += 1;
            top.push(product.clone());
        }
    }
    top
}

/// Mean / standard deviation / min / max per category.
pub fn category_stats(scored: &[ScoredProduct]) -> Vec<CategoryStats> {
    let mut by_category: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for product in scored {
        by_category
            .entry(product.category.as_str())
            .or_default()
            .push(product.smart_score);
    }
    by_category
        .into_iter()
        .map(|(category, scores)| {
            let n = scores.len() as f64;
            let mean = scores.iter().sum::<f64>() / n;
            let std_dev = if scores.len() > 1 {
                (scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
            } else {
                0.0
            };
            CategoryStats {
                category: category.to_string(),
                mean,
                std_dev,
                min: scores.iter().copied().fold(f64::INFINITY, f64::min),
                max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                count: scores.len(),
            }
        })
        .collect()
}
