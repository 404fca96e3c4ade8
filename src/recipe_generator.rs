//! Recipe generation: prompt construction, the model call, and the
//! extract → validate → repair pipeline over its output.

use thiserror::Error;

use crate::api_connection::connection::ApiConnectionError;
use crate::api_connection::endpoints::{ChatCompletionRequest, ChatMessage, Provider};
use crate::json_extract::{self, ExtractionError};
use crate::recipe_corrector::{repair, QualityReport};
use crate::recipe_schema::{
    self, CookingTime, CuisineType, DietaryRestriction, DifficultyLevel, MealType, RecipeSpec,
    ValidationError,
};

pub const GENERATION_MODEL: &str = "meta-llama/llama-3.1-8b-instruct";
pub const GENERATION_TEMPERATURE: f32 = 0.6;
pub const GENERATION_MAX_TOKENS: u32 = 700;

/// A generation failure. Extraction and validation failures abort before any
/// macro lookup is attempted; the caller keeps the input ingredients and may
/// retry.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("model call failed: {0}")]
    Api(#[from] ApiConnectionError),

    #[error("model returned no choices")]
    EmptyResponse,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A repaired recipe together with its plausibility report.
#[derive(Debug, Clone)]
pub struct GeneratedRecipe {
    pub recipe: RecipeSpec,
    pub quality: QualityReport,
}

fn vocabulary(values: &[&'static str]) -> String {
    values
        .iter()
        .map(|v| format!("\"{v}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// System prompt: JSON-only output, the exact enum vocabularies for the five
/// categorical fields, use-only-provided-ingredients, grams always present.
pub fn system_prompt() -> String {
    let dietary = vocabulary(
        &DietaryRestriction::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>(),
    );
    let cuisine = vocabulary(&CuisineType::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>());
    let meal = vocabulary(&MealType::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>());
    let time = vocabulary(&CookingTime::ALL.iter().map(|v| v.as_str()).collect::<Vec<_>>());
    let difficulty = vocabulary(
        &DifficultyLevel::ALL
            .iter()
            .map(|v| v.as_str())
            .collect::<Vec<_>>(),
    );

    format!(
        "You are a nutritionist-chef. Create a healthy, tasty recipe ONLY with the ingredients provided. \
Return STRICT JSON with keys: \"title\" (string), \"servings\" (integer 1-12), \
\"ingredients\" (array of objects {{\"name\": string, \"grams\": number}}), \
\"steps\" (array of strings), \"dietary_restriction\" (one of {dietary}), \
and optionally \"cuisine_type\" (one of {cuisine}), \"meal_type\" (one of {meal}), \
\"cooking_time\" (one of {time}), \"difficulty_level\" (one of {difficulty}). \
All ingredient quantities MUST have grams; estimate sensible amounts. \
Do not add ingredients not provided, except basic salt/pepper which you may exclude from macros. \
\"dietary_restriction\" must never be null or empty; use \"None\" when nothing applies. \
Output VALID JSON only. No extra commentary."
    )
}

pub fn user_prompt(ingredients: &[String]) -> String {
    format!(
        "Ingredients: {}\n\n\
Rules:\n\
1) Use only these ingredients (ignore pantry basics for macros).\n\
2) Provide realistic grams per ingredient so totals are ~400-700g per serving for a meal.\n\
3) Servings must be an integer.\n\
4) Output VALID JSON only. No extra commentary.",
        ingredients.join(", ")
    )
}

/// Split a comma-separated ingredient list, trimming entries and dropping
/// empties.
pub fn parse_ingredient_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ask the model for a recipe and run its output through the pipeline.
pub async fn generate_recipe(
    api_key_env_var: &str,
    ingredients: &[String],
) -> Result<GeneratedRecipe, GenerationError> {
    let provider = Provider::openrouter(api_key_env_var);

    let request = ChatCompletionRequest {
        model: GENERATION_MODEL.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".to_string(),
                content: system_prompt(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: user_prompt(ingredients),
            },
        ],
        temperature: Some(GENERATION_TEMPERATURE),
        max_tokens: Some(GENERATION_MAX_TOKENS),
    };

    let response = provider.call_chat_completion(request).await?;
    let choice = response
        .choices
        .first()
        .ok_or(GenerationError::EmptyResponse)?;

    process_model_output(&choice.message.content, ingredients)
}

/// Extract, validate, and repair a raw model response. Split out from the
/// network call so the pipeline is testable on fixture text.
pub fn process_model_output(
    raw_text: &str,
    ingredients: &[String],
) -> Result<GeneratedRecipe, GenerationError> {
    let value = json_extract::extract(raw_text)?;
    let spec = recipe_schema::validate(&value)?;
    let (recipe, quality) = repair(spec, ingredients);
    Ok(GeneratedRecipe { recipe, quality })
}
