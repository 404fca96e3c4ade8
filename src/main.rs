use anyhow::{bail, Context, Result};
use nutrichef::cli::{parse_args, Command};
use nutrichef::macro_aggregator::{aggregate, per_serving, IngredientMacros, MacroTotals};
use nutrichef::macro_lookup::MacroClient;
use nutrichef::recipe_generator::{generate_recipe, parse_ingredient_list, GeneratedRecipe};
use nutrichef::recipe_schema::{
    CookingTime, CuisineType, DietaryRestriction, DifficultyLevel, MealType,
};
use nutrichef::recipe_store::{RecipeFilter, RecipeStore, StoredRecipe};

// Environment variable names for the API keys
const OPENROUTER_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";
const USDA_KEY_ENV_VAR: &str = "USDA_API_KEY";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok(); // Load .env file for API keys

    let cli_args = parse_args();

    let store = RecipeStore::open(&cli_args.database)
        .await
        .with_context(|| format!("Failed to open recipe database {:?}", cli_args.database))?;

    match cli_args.command {
        Command::Generate {
            ingredients,
            no_save,
            tags,
        } => run_generate(&store, &ingredients, no_save, &tags).await,
        Command::List {
            limit,
            offset,
            dietary_restriction,
            cuisine_type,
            meal_type,
            cooking_time,
            difficulty_level,
        } => {
            let filter = build_filter(
                dietary_restriction.as_deref(),
                cuisine_type.as_deref(),
                meal_type.as_deref(),
                cooking_time.as_deref(),
                difficulty_level.as_deref(),
            )?;
            let recipes = if filter_is_empty(&filter) {
                store.list_recipes(limit, offset).await?
            } else {
                store.filter_recipes(&filter).await?
            };
            print_recipe_summaries(&recipes);
            Ok(())
        }
        Command::Show { id } => match store.get_recipe(&id).await? {
            Some(recipe) => {
                print_stored_recipe(&recipe);
                Ok(())
            }
            None => bail!("No recipe with id {id}"),
        },
        Command::Search { query, limit } => {
            let recipes = store.search_recipes(&query, limit).await?;
            print_recipe_summaries(&recipes);
            Ok(())
        }
        Command::Favorites => {
            let recipes = store.favorites().await?;
            print_recipe_summaries(&recipes);
            Ok(())
        }
        Command::Rate { id, rating } => {
            if store.update_rating(&id, rating).await? {
                println!("Rated {id} {rating}/5.");
                Ok(())
            } else {
                bail!("No recipe with id {id}")
            }
        }
        Command::Favorite { id } => {
            if store.toggle_favorite(&id).await? {
                println!("Toggled favorite on {id}.");
                Ok(())
            } else {
                bail!("No recipe with id {id}")
            }
        }
        Command::Delete { id } => {
            if store.delete_recipe(&id).await? {
                println!("Deleted {id}.");
                Ok(())
            } else {
                bail!("No recipe with id {id}")
            }
        }
        Command::History { limit } => {
            for entry in store.recent_history(limit).await? {
                let status = if entry.success { "ok " } else { "FAIL" };
                let detail = entry
                    .error_message
                    .as_deref()
                    .or(entry.recipe_id.as_deref())
                    .unwrap_or("-");
                println!(
                    "{} [{}] {} -> {}",
                    entry.created_at.format("%Y-%m-%d %H:%M"),
                    status,
                    entry.input_ingredients,
                    detail
                );
            }
            Ok(())
        }
        Command::Stats => {
            let stats = store.stats().await?;
            println!("Recipes:       {}", stats.total_recipes);
            println!("Favorites:     {}", stats.favorite_recipes);
            println!("Avg rating:    {:.2}", stats.average_rating);
            println!("Attempts:      {}", stats.total_attempts);
            println!("Success rate:  {:.2}%", stats.success_rate);
            Ok(())
        }
        Command::ClearAll { yes } => {
            if !yes {
                bail!("Refusing to clear without --yes");
            }
            store.clear_all().await?;
            println!("Cleared all recipes and history.");
            Ok(())
        }
    }
}

async fn run_generate(
    store: &RecipeStore,
    ingredients_text: &str,
    no_save: bool,
    tags: &[String],
) -> Result<()> {
    let ingredients = parse_ingredient_list(ingredients_text);
    if ingredients.is_empty() {
        bail!("Please enter at least one ingredient.");
    }

    println!("Asking the chef for a recipe with: {}", ingredients.join(", "));

    let GeneratedRecipe { recipe, quality } =
        match generate_recipe(OPENROUTER_KEY_ENV_VAR, &ingredients).await {
            Ok(generated) => generated,
            Err(e) => {
                // The input ingredients are not discarded; the attempt is
                // recorded and the caller may retry.
                if let Err(log_err) = store
                    .log_generation(ingredients_text, None, false, Some(&e.to_string()))
                    .await
                {
                    eprintln!("Warning: could not record the failed attempt: {log_err}");
                }
                return Err(anyhow::anyhow!("Recipe generation failed: {e}"));
            }
        };

    println!("\n{}", recipe.title);
    println!("Serves {}", recipe.servings);
    print_categories(
        recipe.dietary_restriction,
        recipe.cuisine_type,
        recipe.meal_type,
        recipe.cooking_time,
        recipe.difficulty_level,
    );

    println!("\nIngredients:");
    for ingredient in &recipe.ingredients {
        println!("  {:>6.0} g  {}", ingredient.grams, ingredient.name);
    }

    println!("\nSteps:");
    for (i, step) in recipe.steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }

    println!("\nQuality score: {}/100", quality.score);
    for issue in &quality.issues {
        println!("  - {issue}");
    }

    println!("\nCalculating macros from USDA...");
    let macro_client = MacroClient::from_env(USDA_KEY_ENV_VAR)
        .with_context(|| format!("{USDA_KEY_ENV_VAR} is not set"))?;
    let (rows, totals) = aggregate(&macro_client, &recipe.ingredients).await;
    let serving_totals = per_serving(&totals, recipe.servings);

    print_macro_rows(&rows);
    println!("\nTotal recipe nutrition:");
    print_totals(&totals);
    println!("\nPer serving:");
    print_totals(&serving_totals);

    if no_save {
        return Ok(());
    }

    // A recipe that generated successfully but failed to save is still shown
    // above; persistence problems are warnings, not fatal.
    match store
        .save_recipe(&recipe, &totals, &serving_totals, tags)
        .await
    {
        Ok(id) => {
            println!("\nSaved as {id}");
            if let Err(e) = store
                .log_generation(ingredients_text, Some(&id), true, None)
                .await
            {
                eprintln!("Warning: could not record the generation attempt: {e}");
            }
        }
        Err(e) => {
            eprintln!("Warning: the recipe could not be saved: {e}");
            if let Err(log_err) = store
                .log_generation(
                    ingredients_text,
                    None,
                    false,
                    Some(&format!("save failed: {e}")),
                )
                .await
            {
                eprintln!("Warning: could not record the failed save: {log_err}");
            }
        }
    }

    Ok(())
}

fn build_filter(
    dietary_restriction: Option<&str>,
    cuisine_type: Option<&str>,
    meal_type: Option<&str>,
    cooking_time: Option<&str>,
    difficulty_level: Option<&str>,
) -> Result<RecipeFilter> {
    fn parse<T>(
        raw: Option<&str>,
        name: &str,
        from_str: impl Fn(&str) -> Option<T>,
    ) -> Result<Option<T>> {
        match raw {
            None => Ok(None),
            Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
            Some(s) => from_str(s)
                .map(Some)
                .ok_or_else(|| anyhow::anyhow!("Unknown {name}: {s}")),
        }
    }

    Ok(RecipeFilter {
        dietary_restriction: parse(
            dietary_restriction,
            "dietary restriction",
            DietaryRestriction::from_str,
        )?,
        cuisine_type: parse(cuisine_type, "cuisine type", CuisineType::from_str)?,
        meal_type: parse(meal_type, "meal type", MealType::from_str)?,
        cooking_time: parse(cooking_time, "cooking time", CookingTime::from_str)?,
        difficulty_level: parse(
            difficulty_level,
            "difficulty level",
            DifficultyLevel::from_str,
        )?,
    })
}

fn filter_is_empty(filter: &RecipeFilter) -> bool {
    filter.dietary_restriction.is_none()
        && filter.cuisine_type.is_none()
        && filter.meal_type.is_none()
        && filter.cooking_time.is_none()
        && filter.difficulty_level.is_none()
}

fn print_categories(
    dietary: DietaryRestriction,
    cuisine: Option<CuisineType>,
    meal: Option<MealType>,
    time: Option<CookingTime>,
    difficulty: Option<DifficultyLevel>,
) {
    let mut parts = vec![format!("Dietary: {}", dietary.as_str())];
    if let Some(v) = cuisine {
        parts.push(format!("Cuisine: {}", v.as_str()));
    }
    if let Some(v) = meal {
        parts.push(format!("Meal: {}", v.as_str()));
    }
    if let Some(v) = time {
        parts.push(format!("Time: {}", v.as_str()));
    }
    if let Some(v) = difficulty {
        parts.push(format!("Difficulty: {}", v.as_str()));
    }
    println!("{}", parts.join(" | "));
}

fn print_macro_rows(rows: &[IngredientMacros]) {
    println!(
        "\n{:<28} {:>8} {:>12} {:>10} {:>8} {:>10}  {}",
        "Ingredient", "Grams", "Protein (g)", "Carbs (g)", "Fat (g)", "Fiber (g)", "Note"
    );
    for row in rows {
        println!(
            "{:<28} {:>8.0} {:>12.2} {:>10.2} {:>8.2} {:>10.2}  {}",
            row.name,
            row.grams,
            row.protein_g,
            row.carbs_g,
            row.fat_g,
            row.fiber_g,
            row.note.as_deref().unwrap_or("")
        );
    }
}

fn print_totals(totals: &MacroTotals) {
    println!(
        "  Protein {:.2} g | Carbs {:.2} g | Fat {:.2} g | Fiber {:.2} g | {:.0} kcal",
        totals.protein_g, totals.carbs_g, totals.fat_g, totals.fiber_g, totals.calories
    );
}

fn print_recipe_summaries(recipes: &[StoredRecipe]) {
    if recipes.is_empty() {
        println!("No recipes found.");
        return;
    }
    for recipe in recipes {
        let favorite = if recipe.is_favorite { "*" } else { " " };
        let rating = recipe
            .rating
            .map(|r| format!("{r}/5"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} {}  {}  serves {}  rating {}  {}",
            favorite,
            recipe.id,
            recipe.created_at.format("%Y-%m-%d"),
            recipe.servings,
            rating,
            recipe.title
        );
    }
}

fn print_stored_recipe(recipe: &StoredRecipe) {
    println!("{}", recipe.title);
    println!("id: {}  created: {}", recipe.id, recipe.created_at.format("%Y-%m-%d %H:%M"));
    println!("Serves {}", recipe.servings);
    print_categories(
        recipe.dietary_restriction,
        recipe.cuisine_type,
        recipe.meal_type,
        recipe.cooking_time,
        recipe.difficulty_level,
    );
    if !recipe.tags.is_empty() {
        println!("Tags: {}", recipe.tags.join(", "));
    }

    println!("\nIngredients:");
    for ingredient in &recipe.ingredients {
        println!("  {:>6.0} g  {}", ingredient.grams, ingredient.name);
    }

    println!("\nSteps:");
    for (i, step) in recipe.steps.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }

    println!("\nTotal recipe nutrition:");
    print_totals(&recipe.nutrition_per_recipe);
    println!("Per serving:");
    print_totals(&recipe.nutrition_per_serving);
}
