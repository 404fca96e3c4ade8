//! Post-validation repair and plausibility scoring.
//!
//! Runs after validation succeeds and never rejects: a valid-but-implausible
//! recipe is downgraded into a more plausible one plus a diagnostic report.

use serde::{Deserialize, Serialize};

use crate::recipe_schema::RecipeSpec;

/// Derived plausibility report. Recomputed on every repair pass; only the
/// score is ever surfaced to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub score: u8,
    pub issues: Vec<String>,
}

// Servings are rebalanced when a serving falls outside this band.
const MIN_GRAMS_PER_SERVING: f64 = 100.0;
const MAX_GRAMS_PER_SERVING: f64 = 1000.0;

// Stricter band used only for scoring, after any rebalance.
const SCORE_MIN_GRAMS_PER_SERVING: f64 = 150.0;
const SCORE_MAX_GRAMS_PER_SERVING: f64 = 800.0;

/// Repair a validated recipe against the user's original ingredient list and
/// score its plausibility. Rules apply in a fixed order to a working copy;
/// the report's issues follow that order.
pub fn repair(mut recipe: RecipeSpec, original_ingredients: &[String]) -> (RecipeSpec, QualityReport) {
    let mut score: i32 = 100;
    let mut issues = Vec::new();

    // 1. Every requested ingredient should show up in the recipe.
    let missing = missing_ingredients(&recipe, original_ingredients);
    if !missing.is_empty() {
        issues.push(format!(
            "Missing ingredients: {}. Check the spelling of your ingredient names.",
            missing.join(", ")
        ));
        score -= 20;
    }

    // 2. Rebalance servings when the portion size is implausible. Only one
    // branch fires; the result is not re-checked.
    let total_grams: f64 = recipe.ingredients.iter().map(|i| i.grams).sum();
    if recipe.servings > 0 {
        let grams_per_serving = total_grams / f64::from(recipe.servings);
        if grams_per_serving < MIN_GRAMS_PER_SERVING {
            recipe.servings = rebalanced_servings(total_grams, 200.0);
        } else if grams_per_serving > MAX_GRAMS_PER_SERVING {
            recipe.servings = rebalanced_servings(total_grams, 500.0);
        }
    }

    // 3. Score the (possibly rebalanced) portion size against the stricter band.
    if recipe.servings > 0 {
        let grams_per_serving = total_grams / f64::from(recipe.servings);
        if grams_per_serving < SCORE_MIN_GRAMS_PER_SERVING {
            issues.push("Serving size may be too small".to_string());
            score -= 10;
        } else if grams_per_serving > SCORE_MAX_GRAMS_PER_SERVING {
            issues.push("Serving size may be too large".to_string());
            score -= 10;
        }
    }

    // 4. Clamp outlier quantities. Oversized amounts drop to 300 g and
    // undersized ones rise to 10 g, not to the trigger thresholds themselves.
    for ingredient in &mut recipe.ingredients {
        if ingredient.grams > 500.0 {
            ingredient.grams = ingredient.grams.min(300.0);
        } else if ingredient.grams < 5.0 {
            ingredient.grams = ingredient.grams.max(10.0);
        }
    }

    // 5. Three steps is the floor for a usable set of instructions.
    if recipe.steps.len() < 3 {
        issues.push("Instructions could be more detailed".to_string());
        score -= 15;
    }

    let report = QualityReport {
        score: score.clamp(0, 100) as u8,
        issues,
    };
    (recipe, report)
}

/// Requested ingredients with no case-folded substring match (either
/// direction) among the recipe's ingredient names.
fn missing_ingredients(recipe: &RecipeSpec, original_ingredients: &[String]) -> Vec<String> {
    original_ingredients
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|original| {
            let wanted = original.to_lowercase();
            !recipe.ingredients.iter().any(|ingredient| {
                let have = ingredient.name.to_lowercase();
                have.contains(&wanted) || wanted.contains(&have)
            })
        })
        .map(str::to_string)
        .collect()
}

fn rebalanced_servings(total_grams: f64, grams_per_serving: f64) -> u32 {
    ((total_grams / grams_per_serving).floor() as u32).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe_schema::IngredientQuantity;

    fn recipe(servings: u32, ingredients: &[(&str, f64)], steps: usize) -> RecipeSpec {
        RecipeSpec {
            title: "Test".to_string(),
            servings,
            ingredients: ingredients
                .iter()
                .map(|(name, grams)| IngredientQuantity {
                    name: (*name).to_string(),
                    grams: *grams,
                })
                .collect(),
            steps: (0..steps).map(|i| format!("Step {}", i + 1)).collect(),
            dietary_restriction: Default::default(),
            cuisine_type: None,
            meal_type: None,
            cooking_time: None,
            difficulty_level: None,
        }
    }

    #[test]
    fn plausible_recipe_scores_full_marks() {
        let input = vec!["chicken".to_string(), "rice".to_string()];
        let (repaired, report) = repair(
            recipe(2, &[("chicken breast", 300.0), ("rice", 200.0)], 4),
            &input,
        );
        assert_eq!(report.score, 100);
        assert!(report.issues.is_empty());
        assert_eq!(repaired.servings, 2);
    }

    #[test]
    fn missing_ingredient_deducts_flat_twenty() {
        let input = vec![
            "chicken".to_string(),
            "broccoli".to_string(),
            "quinoa".to_string(),
        ];
        let (_, report) = repair(recipe(2, &[("chicken thigh", 400.0)], 3), &input);
        assert_eq!(report.score, 80);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("broccoli"));
        assert!(report.issues[0].contains("quinoa"));
        assert!(!report.issues[0].contains("chicken,"));
    }

    #[test]
    fn ingredient_match_works_in_both_directions() {
        // Recipe name contained in the request, not just the reverse.
        let input = vec!["free range chicken".to_string()];
        let (_, report) = repair(recipe(1, &[("chicken", 400.0)], 3), &input);
        assert_eq!(report.score, 100);
    }

    #[test]
    fn tiny_servings_are_rebalanced() {
        // 500 g over 10 servings is 50 g each; rebalance to 500/200 = 2.
        let input = vec!["chicken".to_string()];
        let (repaired, _) = repair(recipe(10, &[("chicken", 500.0)], 3), &input);
        assert_eq!(repaired.servings, 2);
    }

    #[test]
    fn huge_servings_are_rebalanced() {
        // 2400 g over 2 servings is 1200 g each; rebalance to 2400/500 = 4.
        let input = vec!["beef".to_string()];
        let (repaired, report) = repair(recipe(2, &[("beef", 480.0), ("beef stock", 1920.0)], 3), &input);
        assert_eq!(repaired.servings, 4);
        // 600 g per rebalanced serving sits inside the scoring band.
        assert!(report.issues.iter().all(|i| !i.contains("Serving size")));
    }

    #[test]
    fn rebalance_never_drops_below_one_serving() {
        let input = vec!["spinach".to_string()];
        // 120 g over 2 servings is 60 g each; 120/200 floors to 0, held at 1.
        let (repaired, _) = repair(recipe(2, &[("spinach", 120.0)], 3), &input);
        assert_eq!(repaired.servings, 1);
    }

    #[test]
    fn large_serving_inside_rebalance_band_is_only_scored() {
        // 900 g in one serving: below the 1000 g rebalance threshold, above
        // the 800 g scoring threshold.
        let input = vec!["chicken".to_string()];
        let (repaired, report) = repair(recipe(1, &[("chicken", 900.0)], 3), &input);
        assert_eq!(repaired.servings, 1);
        assert_eq!(report.score, 90);
        assert_eq!(report.issues, vec!["Serving size may be too large".to_string()]);
    }

    #[test]
    fn small_serving_inside_rebalance_band_is_only_scored() {
        let input = vec!["salad".to_string()];
        let (repaired, report) = repair(recipe(1, &[("salad", 120.0)], 3), &input);
        assert_eq!(repaired.servings, 1);
        assert_eq!(report.score, 90);
        assert_eq!(report.issues, vec!["Serving size may be too small".to_string()]);
    }

    #[test]
    fn oversized_quantities_clamp_to_three_hundred() {
        let input = vec!["chicken".to_string()];
        let (repaired, _) = repair(recipe(3, &[("chicken", 700.0)], 3), &input);
        assert_eq!(repaired.ingredients[0].grams, 300.0);
    }

    #[test]
    fn undersized_quantities_clamp_to_ten() {
        let input = vec!["rice".to_string(), "salt".to_string()];
        let (repaired, _) = repair(recipe(1, &[("rice", 200.0), ("salt", 2.0)], 3), &input);
        assert_eq!(repaired.ingredients[1].grams, 10.0);
    }

    #[test]
    fn boundary_quantities_are_left_alone() {
        let input = vec!["rice".to_string(), "oil".to_string()];
        let (repaired, _) = repair(recipe(2, &[("rice", 500.0), ("oil", 5.0)], 3), &input);
        assert_eq!(repaired.ingredients[0].grams, 500.0);
        assert_eq!(repaired.ingredients[1].grams, 5.0);
    }

    #[test]
    fn sparse_instructions_deduct_fifteen() {
        let input = vec!["eggs".to_string()];
        let (_, report) = repair(recipe(1, &[("eggs", 200.0)], 2), &input);
        assert_eq!(report.score, 85);
        assert!(report
            .issues
            .iter()
            .any(|i| i.contains("more detailed")));
    }

    #[test]
    fn stacked_deductions_accumulate() {
        let input = vec![
            "tofu".to_string(),
            "kale".to_string(),
            "miso".to_string(),
        ];
        let (_, report) = repair(recipe(1, &[("unrelated", 40.0)], 1), &input);
        assert_eq!(report.score, 100 - 20 - 10 - 15);
        assert_eq!(report.issues.len(), 3);
    }
}
