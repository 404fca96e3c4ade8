pub mod api_connection;
pub mod cli;
pub mod json_extract;
pub mod macro_aggregator;
pub mod macro_lookup;
pub mod recipe_corrector;
pub mod recipe_generator;
pub mod recipe_schema;
pub mod recipe_store;
