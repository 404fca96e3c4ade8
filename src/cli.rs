use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the recipe database
    #[arg(long, default_value = "recipes.db")]
    pub database: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a recipe from a comma-separated ingredient list
    Generate {
        /// e.g. "chicken breast, quinoa, spinach, olive oil, garlic"
        ingredients: String,

        /// Do not save the generated recipe
        #[arg(long)]
        no_save: bool,

        /// Tags to attach to the saved recipe
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },

    /// List saved recipes, newest first
    List {
        #[arg(long, default_value_t = 50)]
        limit: i64,

        #[arg(long, default_value_t = 0)]
        offset: i64,

        /// Filter by dietary restriction ("All" matches everything)
        #[arg(long)]
        dietary_restriction: Option<String>,

        /// Filter by cuisine type
        #[arg(long)]
        cuisine_type: Option<String>,

        /// Filter by meal type
        #[arg(long)]
        meal_type: Option<String>,

        /// Filter by cooking time, e.g. "Quick (15min)"
        #[arg(long)]
        cooking_time: Option<String>,

        /// Filter by difficulty level
        #[arg(long)]
        difficulty_level: Option<String>,
    },

    /// Show a saved recipe in full
    Show { id: String },

    /// Search saved recipes by title or ingredient text
    Search {
        query: String,

        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// List favorite recipes
    Favorites,

    /// Rate a recipe from 1 to 5
    Rate { id: String, rating: i64 },

    /// Toggle a recipe's favorite flag
    Favorite { id: String },

    /// Delete a recipe permanently
    Delete { id: String },

    /// Show recent generation attempts
    History {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },

    /// Show database statistics
    Stats,

    /// Delete all recipes and the generation history
    ClearAll {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
