//! Area-of-interest layout generation.
//!
//! Pure geometry: given a presentation layout kind and the products visible
//! on screen, produce the normalized screen regions (0-1 coordinate space)
//! that the attention aggregator tests gaze samples against. Layout
//! proportions live here as named constants; nothing in this module inspects
//! pixel content or mutates state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::modes::ModeKind;

/// Fraction of a product slot covered by the pack shot; the claim text
/// occupies the remainder below it.
const PACK_FRACTION: f64 = 0.6;

/// Recommendation badge size in normalized full-screen units.
const BADGE_WIDTH: f64 = 0.08;
const BADGE_HEIGHT: f64 = 0.08;
/// Inset of the badge from the top-right corner of its slot.
const BADGE_INSET: f64 = 0.02;

/// Width of the left (nutrition) and right (claim) strips in the
/// sequential full-screen layout.
const SEQUENTIAL_STRIP_WIDTH: f64 = 0.25;

/// A normalized screen rectangle. Serialized as the 4-tuple
/// `[x_min, y_min, x_max, y_max]`; construction guarantees
/// `x_min < x_max` and `y_min < y_max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct Rect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Rect {
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        debug_assert!(x_min < x_max && y_min < y_max);
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Inclusive-bounds containment: a sample exactly on an edge hits.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x_min <= x && x <= self.x_max && self.y_min <= y && y <= self.y_max
    }

    pub fn area(&self) -> f64 {
        (self.x_max - self.x_min) * (self.y_max - self.y_min)
    }
}

impl From<[f64; 4]> for Rect {
    fn from(v: [f64; 4]) -> Self {
        Self {
            x_min: v[0],
            y_min: v[1],
            x_max: v[2],
            y_max: v[3],
        }
    }
}

impl From<Rect> for [f64; 4] {
    fn from(r: Rect) -> Self {
        [r.x_min, r.y_min, r.x_max, r.y_max]
    }
}

/// Named screen element a rectangle belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum AoiElement {
    Pack,
    Claim,
    RecommendationBadge,
    NutritionInfo,
}

/// The regions of one screen: product identifier -> element -> rectangle.
/// Generated fresh per screen and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AoiLayout {
    pub screen_id: String,
    pub regions: BTreeMap<String, BTreeMap<AoiElement, Rect>>,
}

impl AoiLayout {
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Iterate all `(product, element, rect)` triples.
    pub fn rects(&self) -> impl Iterator<Item = (&str, AoiElement, &Rect)> {
        self.regions.iter().flat_map(|(product, elements)| {
            elements
                .iter()
                .map(move |(element, rect)| (product.as_str(), *element, rect))
        })
    }
}

/// Generate the AOI layout for one screen.
///
/// `recommended_product` is `Some` only when the participant's condition
/// shows recommendations; the badge rectangle is added for that product's
/// slot and nothing else changes. Fewer products than the layout expects
/// yields empty slots, never an error.
pub fn generate_layout(
    mode: ModeKind,
    visible_products: &[String],
    recommended_product: Option<&str>,
    screen_id: &str,
) -> AoiLayout {
    let mut layout = AoiLayout {
        screen_id: screen_id.to_string(),
        regions: BTreeMap::new(),
    };

    match mode {
        ModeKind::PairedElimination => {
            // Two fixed half-screen slots, left then right.
            let slots = [Rect::new(0.0, 0.0, 0.5, 1.0), Rect::new(0.5, 0.0, 1.0, 1.0)];
            for (product, slot) in visible_products.iter().zip(slots.iter()) {
                layout.regions.insert(
                    product.clone(),
                    slot_regions(*slot, is_recommended(product, recommended_product)),
                );
            }
        }
        ModeKind::Grid => {
            // Row-major 2x2 partition, up to four cells.
            for (i, product) in visible_products.iter().take(4).enumerate() {
                let col = (i % 2) as f64;
                let row = (i / 2) as f64;
                let cell = Rect::new(col * 0.5, row * 0.5, col * 0.5 + 0.5, row * 0.5 + 0.5);
                layout.regions.insert(
                    product.clone(),
                    slot_regions(cell, is_recommended(product, recommended_product)),
                );
            }
        }
        ModeKind::Sequential => {
            // Exactly one product occupies the whole screen.
            if let Some(product) = visible_products.first() {
                let mut elements = BTreeMap::new();
                elements.insert(
                    AoiElement::NutritionInfo,
                    Rect::new(0.0, 0.0, SEQUENTIAL_STRIP_WIDTH, 1.0),
                );
                let pack = Rect::new(
                    SEQUENTIAL_STRIP_WIDTH,
                    0.0,
                    1.0 - SEQUENTIAL_STRIP_WIDTH,
                    1.0,
                );
                elements.insert(AoiElement::Pack, pack);
                elements.insert(
                    AoiElement::Claim,
                    Rect::new(1.0 - SEQUENTIAL_STRIP_WIDTH, 0.0, 1.0, 1.0),
                );
                if is_recommended(product, recommended_product) {
                    elements.insert(AoiElement::RecommendationBadge, badge_in(pack));
                }
                layout.regions.insert(product.clone(), elements);
            }
        }
    }

    layout
}

fn is_recommended(product: &str, recommended: Option<&str>) -> bool {
    recommended.is_some_and(|r| r == product)
}

/// Pack/claim sub-split of one slot, with the badge in the slot's top-right
/// corner when the product is the recommended one.
fn slot_regions(slot: Rect, recommended: bool) -> BTreeMap<AoiElement, Rect> {
    let split_y = slot.y_min + (slot.y_max - slot.y_min) * PACK_FRACTION;
    let mut elements = BTreeMap::new();
    elements.insert(
        AoiElement::Pack,
        Rect::new(slot.x_min, slot.y_min, slot.x_max, split_y),
    );
    elements.insert(
        AoiElement::Claim,
        Rect::new(slot.x_min, split_y, slot.x_max, slot.y_max),
    );
    if recommended {
        elements.insert(AoiElement::RecommendationBadge, badge_in(slot));
    }
    elements
}

fn badge_in(slot: Rect) -> Rect {
    Rect::new(
        slot.x_max - BADGE_INSET - BADGE_WIDTH,
        slot.y_min + BADGE_INSET,
        slot.x_max - BADGE_INSET,
        slot.y_min + BADGE_INSET + BADGE_HEIGHT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn products(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn paired_halves_with_pack_claim_split() {
        let layout = generate_layout(
            ModeKind::PairedElimination,
            &products(&["a", "b"]),
            None,
            "paired/pair_1",
        );
        assert_eq!(layout.regions.len(), 2);
        let a = &layout.regions["a"];
        assert_eq!(a[&AoiElement::Pack], Rect::new(0.0, 0.0, 0.5, 0.6));
        assert_eq!(a[&AoiElement::Claim], Rect::new(0.0, 0.6, 0.5, 1.0));
        let b = &layout.regions["b"];
        assert_eq!(b[&AoiElement::Pack], Rect::new(0.5, 0.0, 1.0, 0.6));
        assert!(!a.contains_key(&AoiElement::RecommendationBadge));
    }

    #[test]
    fn badge_only_for_recommended_visible_product() {
        let layout = generate_layout(
            ModeKind::PairedElimination,
            &products(&["a", "b"]),
            Some("b"),
            "paired/pair_1",
        );
        assert!(!layout.regions["a"].contains_key(&AoiElement::RecommendationBadge));
        assert!(layout.regions["b"].contains_key(&AoiElement::RecommendationBadge));

        // Recommended product off-screen: no badge anywhere.
        let layout = generate_layout(
            ModeKind::PairedElimination,
            &products(&["a", "b"]),
            Some("z"),
            "paired/pair_1",
        );
        assert!(layout.rects().all(|(_, e, _)| e != AoiElement::RecommendationBadge));
    }

    #[test]
    fn grid_partitions_four_cells() {
        let layout = generate_layout(
            ModeKind::Grid,
            &products(&["a", "b", "c", "d"]),
            None,
            "grid",
        );
        assert_eq!(layout.regions.len(), 4);
        assert_eq!(layout.regions["a"][&AoiElement::Pack], Rect::new(0.0, 0.0, 0.5, 0.3));
        assert_eq!(layout.regions["d"][&AoiElement::Claim], Rect::new(0.5, 0.8, 1.0, 1.0));
    }

    #[test]
    fn grid_extra_products_ignored() {
        let layout = generate_layout(
            ModeKind::Grid,
            &products(&["a", "b", "c", "d", "e"]),
            None,
            "grid",
        );
        assert!(!layout.regions.contains_key("e"));
    }

    #[test]
    fn sequential_strips() {
        let layout = generate_layout(ModeKind::Sequential, &products(&["a"]), Some("a"), "seq/a/v1");
        let a = &layout.regions["a"];
        assert_eq!(a[&AoiElement::NutritionInfo], Rect::new(0.0, 0.0, 0.25, 1.0));
        assert_eq!(a[&AoiElement::Pack], Rect::new(0.25, 0.0, 0.75, 1.0));
        assert_eq!(a[&AoiElement::Claim], Rect::new(0.75, 0.0, 1.0, 1.0));
        assert!(a.contains_key(&AoiElement::RecommendationBadge));
    }

    #[test]
    fn degenerate_input_yields_partial_layout() {
        let layout = generate_layout(ModeKind::PairedElimination, &products(&["a"]), None, "s");
        assert_eq!(layout.regions.len(), 1);
        let layout = generate_layout(ModeKind::Sequential, &[], None, "s");
        assert!(layout.is_empty());
    }

    #[test]
    fn boundary_samples_hit() {
        let r = Rect::new(0.0, 0.0, 0.5, 0.6);
        assert!(r.contains(0.5, 0.6));
        assert!(r.contains(0.0, 0.0));
        assert!(!r.contains(0.500001, 0.3));
    }

    #[test]
    fn layout_round_trips_bit_identical() {
        let layout = generate_layout(
            ModeKind::Grid,
            &products(&["a", "b", "c"]),
            Some("c"),
            "grid",
        );
        let json = serde_json::to_string(&layout).unwrap();
        let back: AoiLayout = serde_json::from_str(&json).unwrap();
        assert_eq!(layout, back);
    }

    proptest! {
        #[test]
        fn rect_invariants_hold_for_any_input(
            n in 0usize..6,
            kind in prop_oneof![
                Just(ModeKind::PairedElimination),
                Just(ModeKind::Grid),
                Just(ModeKind::Sequential),
            ],
            recommend in 0usize..7,
        ) {
            let names: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
            let recommended = names.get(recommend).cloned();
            let layout = generate_layout(kind, &names, recommended.as_deref(), "s");
            for (_, _, r) in layout.rects() {
                prop_assert!(r.x_min < r.x_max);
                prop_assert!(r.y_min < r.y_max);
                for v in [r.x_min, r.y_min, r.x_max, r.y_max] {
                    prop_assert!((0.0..=1.0).contains(&v));
                }
            }
        }
    }
}
