//! Per-100g macro lookup against USDA FoodData Central.
//!
//! Two-step protocol: a search call resolves an ingredient name to an FDC ID,
//! a detail call returns its nutrient list. Every failure mode — no match,
//! transport error, timeout, undecodable body — degrades to `None` so a
//! single bad ingredient never aborts a recipe's macro computation.

use std::env;
use std::time::Duration;

use dotenv::dotenv;
use serde::{Deserialize, Serialize};

pub const FDC_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

// Target nutrient names in the FDC nutrient list.
const NUTRIENT_PROTEIN: &str = "Protein";
const NUTRIENT_CARBS: &str = "Carbohydrate, by difference";
const NUTRIENT_FAT: &str = "Total lipid (fat)";
const NUTRIENT_FIBER: &str = "Fiber, total dietary";

const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const DETAIL_TIMEOUT: Duration = Duration::from_secs(20);

/// Macro nutrients normalized to a 100 g reference quantity, the nutrition
/// service's native unit. Nutrients absent from a food record stay 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacrosPer100g {
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    foods: Vec<SearchFood>,
}

#[derive(Debug, Deserialize)]
struct SearchFood {
    #[serde(rename = "fdcId")]
    fdc_id: u64,
}

#[derive(Debug, Deserialize)]
struct FoodDetailResponse {
    #[serde(rename = "foodNutrients", default)]
    food_nutrients: Vec<FoodNutrient>,
}

#[derive(Debug, Deserialize)]
struct FoodNutrient {
    nutrient: Option<NutrientRef>,
    amount: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NutrientRef {
    #[serde(default)]
    name: String,
}

pub struct MacroClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl MacroClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(FDC_BASE_URL.to_string(), api_key)
    }

    pub fn with_base_url(base_url: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Build a client from an environment variable holding the API key.
    pub fn from_env(api_key_env_var: &str) -> Result<Self, env::VarError> {
        dotenv().ok();
        let api_key = env::var(api_key_env_var)?;
        Ok(Self::new(api_key))
    }

    /// Resolve an ingredient name to per-100g macros, or `None` when the
    /// service has no match or either call fails.
    pub async fn lookup_per_100g(&self, name: &str) -> Option<MacrosPer100g> {
        let fdc_id = self.search_top_match(name).await?;
        self.fetch_per_100g(fdc_id).await
    }

    /// Search with `pageSize=1` and take the top hit's FDC ID.
    async fn search_top_match(&self, query: &str) -> Option<u64> {
        let url = format!("{}/foods/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("query", query),
                ("pageSize", "1"),
                ("api_key", self.api_key.as_str()),
            ])
            .timeout(SEARCH_TIMEOUT)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        let body: SearchResponse = response.json().await.ok()?;
        body.foods.first().map(|food| food.fdc_id)
    }

    /// Fetch a food record and scan its nutrient list for the four macros.
    async fn fetch_per_100g(&self, fdc_id: u64) -> Option<MacrosPer100g> {
        let url = format!("{}/food/{}", self.base_url, fdc_id);
        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .timeout(DETAIL_TIMEOUT)
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        let body: FoodDetailResponse = response.json().await.ok()?;
        Some(macros_from_nutrients(&body.food_nutrients))
    }
}

fn macros_from_nutrients(nutrients: &[FoodNutrient]) -> MacrosPer100g {
    let mut macros = MacrosPer100g::default();
    for entry in nutrients {
        let (Some(nutrient), Some(amount)) = (&entry.nutrient, entry.amount) else {
            continue;
        };
        match nutrient.name.as_str() {
            NUTRIENT_PROTEIN => macros.protein_g = amount,
            NUTRIENT_CARBS => macros.carbs_g = amount,
            NUTRIENT_FAT => macros.fat_g = amount,
            NUTRIENT_FIBER => macros.fiber_g = amount,
            _ => {}
        }
    }
    macros
}
