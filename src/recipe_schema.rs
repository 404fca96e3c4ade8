//! Recipe shape, categorical vocabularies, and validation.
//!
//! Validation is a pure transform from an extracted JSON value to a typed
//! [`RecipeSpec`]. Defaulting of the dietary field is a separate
//! normalization step that runs strictly before the type and range checks,
//! because the model is observed to omit or null that field despite
//! instructions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// A single ingredient with its estimated quantity in grams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientQuantity {
    pub name: String,
    pub grams: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DietaryRestriction {
    #[default]
    None,
    Vegetarian,
    Vegan,
    Keto,
    Paleo,
}

impl DietaryRestriction {
    pub const ALL: &'static [DietaryRestriction] = &[
        DietaryRestriction::None,
        DietaryRestriction::Vegetarian,
        DietaryRestriction::Vegan,
        DietaryRestriction::Keto,
        DietaryRestriction::Paleo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DietaryRestriction::None => "None",
            DietaryRestriction::Vegetarian => "Vegetarian",
            DietaryRestriction::Vegan => "Vegan",
            DietaryRestriction::Keto => "Keto",
            DietaryRestriction::Paleo => "Paleo",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CuisineType {
    Italian,
    Asian,
    Mexican,
    Mediterranean,
    American,
    Indian,
    French,
    Thai,
    None,
}

impl CuisineType {
    pub const ALL: &'static [CuisineType] = &[
        CuisineType::Italian,
        CuisineType::Asian,
        CuisineType::Mexican,
        CuisineType::Mediterranean,
        CuisineType::American,
        CuisineType::Indian,
        CuisineType::French,
        CuisineType::Thai,
        CuisineType::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CuisineType::Italian => "Italian",
            CuisineType::Asian => "Asian",
            CuisineType::Mexican => "Mexican",
            CuisineType::Mediterranean => "Mediterranean",
            CuisineType::American => "American",
            CuisineType::Indian => "Indian",
            CuisineType::French => "French",
            CuisineType::Thai => "Thai",
            CuisineType::None => "None",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
    Desserts,
}

impl MealType {
    pub const ALL: &'static [MealType] = &[
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snacks,
        MealType::Desserts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snacks => "Snacks",
            MealType::Desserts => "Desserts",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

/// Cooking time buckets. The wire strings carry the parenthesized hints
/// verbatim; they are part of the vocabulary the model is prompted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CookingTime {
    #[serde(rename = "Quick (15min)")]
    Quick,
    #[serde(rename = "Medium (30min)")]
    Medium,
    #[serde(rename = "Long (60min+)")]
    Long,
}

impl CookingTime {
    pub const ALL: &'static [CookingTime] =
        &[CookingTime::Quick, CookingTime::Medium, CookingTime::Long];

    pub fn as_str(&self) -> &'static str {
        match self {
            CookingTime::Quick => "Quick (15min)",
            CookingTime::Medium => "Medium (30min)",
            CookingTime::Long => "Long (60min+)",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub const ALL: &'static [DifficultyLevel] = &[
        DifficultyLevel::Beginner,
        DifficultyLevel::Intermediate,
        DifficultyLevel::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "Beginner",
            DifficultyLevel::Intermediate => "Intermediate",
            DifficultyLevel::Advanced => "Advanced",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

/// A validated recipe.
///
/// Aliases cover the key spellings different prompt variants produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeSpec {
    pub title: String,
    pub servings: u32,
    #[serde(alias = "ingredients_grams")]
    pub ingredients: Vec<IngredientQuantity>,
    #[serde(alias = "instructions")]
    pub steps: Vec<String>,
    #[serde(default, alias = "dietaryRestriction")]
    pub dietary_restriction: DietaryRestriction,
    #[serde(default, alias = "cuisineType", skip_serializing_if = "Option::is_none")]
    pub cuisine_type: Option<CuisineType>,
    #[serde(default, alias = "mealType", skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
    #[serde(default, alias = "cookingTime", skip_serializing_if = "Option::is_none")]
    pub cooking_time: Option<CookingTime>,
    #[serde(default, alias = "difficultyLevel", skip_serializing_if = "Option::is_none")]
    pub difficulty_level: Option<DifficultyLevel>,
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("recipe JSON has the wrong shape: {0}")]
    Shape(String),

    #[error("field `{field}`: expected {constraint}, got {actual}")]
    Field {
        field: String,
        constraint: String,
        actual: String,
    },
}

impl ValidationError {
    fn field(field: impl Into<String>, constraint: &str, actual: impl ToString) -> Self {
        ValidationError::Field {
            field: field.into(),
            constraint: constraint.to_string(),
            actual: actual.to_string(),
        }
    }
}

const DIETARY_KEYS: &[&str] = &["dietary_restriction", "dietaryRestriction"];

/// Coerce a missing, null, or blank dietary field to `"None"`.
///
/// Returns a normalized copy; the input is left untouched.
pub fn normalize(raw: &Value) -> Value {
    let mut normalized = raw.clone();
    if let Value::Object(obj) = &mut normalized {
        let blank_or_null = |v: &Value| match v {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        };
        let mut present = false;
        for key in DIETARY_KEYS {
            if let Some(v) = obj.get(*key) {
                present = true;
                if blank_or_null(v) {
                    obj.insert((*key).to_string(), Value::String("None".to_string()));
                }
            }
        }
        if !present {
            obj.insert(
                "dietary_restriction".to_string(),
                Value::String("None".to_string()),
            );
        }
    }
    normalized
}

/// Validate an extracted JSON value into a [`RecipeSpec`].
///
/// Pure: the input value is never mutated.
pub fn validate(raw: &Value) -> Result<RecipeSpec, ValidationError> {
    let normalized = normalize(raw);
    let spec: RecipeSpec =
        serde_json::from_value(normalized).map_err(|e| ValidationError::Shape(e.to_string()))?;

    if spec.title.trim().is_empty() {
        return Err(ValidationError::field("title", "a non-empty string", "\"\""));
    }
    if !(1..=12).contains(&spec.servings) {
        return Err(ValidationError::field(
            "servings",
            "an integer between 1 and 12",
            spec.servings,
        ));
    }
    if spec.ingredients.is_empty() {
        return Err(ValidationError::field(
            "ingredients",
            "a non-empty list",
            "[]",
        ));
    }
    for (i, ingredient) in spec.ingredients.iter().enumerate() {
        if ingredient.name.trim().is_empty() {
            return Err(ValidationError::field(
                format!("ingredients[{i}].name"),
                "a non-empty string",
                "\"\"",
            ));
        }
        if !(ingredient.grams >= 0.0) {
            return Err(ValidationError::field(
                format!("ingredients[{i}].grams"),
                "a number >= 0",
                ingredient.grams,
            ));
        }
    }
    for (i, step) in spec.steps.iter().enumerate() {
        if step.trim().is_empty() {
            return Err(ValidationError::field(
                format!("steps[{i}]"),
                "a non-empty string",
                "\"\"",
            ));
        }
    }

    Ok(spec)
}
