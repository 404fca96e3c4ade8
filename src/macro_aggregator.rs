//! Per-ingredient macro rows and recipe-level totals.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use crate::macro_lookup::{MacroClient, MacrosPer100g};
use crate::recipe_schema::IngredientQuantity;

/// Lookups for distinct ingredients are independent; this bounds how many
/// run at once. Rows still come back in input order.
pub const LOOKUP_CONCURRENCY: usize = 4;

const NO_MATCH_NOTE: &str = "No nutrition match";

/// One ingredient's share of the recipe macros, scaled from per-100g values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientMacros {
    pub name: String,
    pub grams: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
    /// Set when the nutrition service had no usable record for the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Recipe-level macro totals. Calories are derived from the summed grams
/// (4 kcal/g protein and carbs, 9 kcal/g fat) rather than sourced from the
/// service, which reports them inconsistently across record types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    #[serde(rename = "Protein (g)")]
    pub protein_g: f64,
    #[serde(rename = "Carbs (g)")]
    pub carbs_g: f64,
    #[serde(rename = "Fat (g)")]
    pub fat_g: f64,
    #[serde(rename = "Fiber (g)")]
    pub fiber_g: f64,
    #[serde(rename = "Calories")]
    pub calories: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Look up every ingredient and produce per-ingredient rows plus totals.
/// Unmatched ingredients contribute zero-macro rows and never abort the pass.
pub async fn aggregate(
    client: &MacroClient,
    items: &[IngredientQuantity],
) -> (Vec<IngredientMacros>, MacroTotals) {
    let rows: Vec<IngredientMacros> = stream::iter(items.iter().cloned())
        .map(|item| async move {
            match client.lookup_per_100g(&item.name).await {
                Some(per100g) => scaled_row(&item, per100g),
                None => unmatched_row(&item),
            }
        })
        .buffered(LOOKUP_CONCURRENCY)
        .collect()
        .await;

    let totals = totals_from_rows(&rows);
    (rows, totals)
}

/// Scale per-100g macros linearly by the ingredient's quantity.
fn scaled_row(item: &IngredientQuantity, per100g: MacrosPer100g) -> IngredientMacros {
    let factor = if item.grams > 0.0 {
        item.grams / 100.0
    } else {
        0.0
    };
    IngredientMacros {
        name: item.name.clone(),
        grams: item.grams,
        protein_g: round2(per100g.protein_g * factor),
        carbs_g: round2(per100g.carbs_g * factor),
        fat_g: round2(per100g.fat_g * factor),
        fiber_g: round2(per100g.fiber_g * factor),
        note: None,
    }
}

fn unmatched_row(item: &IngredientQuantity) -> IngredientMacros {
    IngredientMacros {
        name: item.name.clone(),
        grams: item.grams,
        protein_g: 0.0,
        carbs_g: 0.0,
        fat_g: 0.0,
        fiber_g: 0.0,
        note: Some(NO_MATCH_NOTE.to_string()),
    }
}

fn totals_from_rows(rows: &[IngredientMacros]) -> MacroTotals {
    let protein_g = round2(rows.iter().map(|r| r.protein_g).sum());
    let carbs_g = round2(rows.iter().map(|r| r.carbs_g).sum());
    let fat_g = round2(rows.iter().map(|r| r.fat_g).sum());
    let fiber_g = round2(rows.iter().map(|r| r.fiber_g).sum());
    MacroTotals {
        protein_g,
        carbs_g,
        fat_g,
        fiber_g,
        calories: round2(4.0 * protein_g + 4.0 * carbs_g + 9.0 * fat_g),
    }
}

/// Divide totals across servings, rounding to 2 decimals. Zero servings
/// returns the totals unchanged rather than dividing.
pub fn per_serving(totals: &MacroTotals, servings: u32) -> MacroTotals {
    if servings == 0 {
        return *totals;
    }
    let servings = f64::from(servings);
    MacroTotals {
        protein_g: round2(totals.protein_g / servings),
        carbs_g: round2(totals.carbs_g / servings),
        fat_g: round2(totals.fat_g / servings),
        fiber_g: round2(totals.fiber_g / servings),
        calories: round2(totals.calories / servings),
    }
}
