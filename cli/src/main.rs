mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use crate::commands::{
    cmd_export, cmd_grocery, cmd_import, cmd_macros, cmd_plan_add, cmd_plan_move, cmd_plan_remove,
    cmd_plan_show, cmd_recipe_add, cmd_recipe_delete, cmd_recipe_list, cmd_recipe_show,
    cmd_recipe_update,
};
use crate::config::Config;
use platter_core::service::{PlannerService, SqliteStorage};

#[derive(Parser)]
#[command(
    name = "platter",
    version,
    about = "A weekly meal planner CLI",
    long_about = "Plan recipes into a weekly calendar, then pull a merged\ngrocery list and per-day macro totals out of it."
)]
struct Cli {
    /// Profile name (each profile keeps its own database)
    #[arg(long, global = true)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage recipes
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Manage the weekly plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Show the aggregated grocery list for everything planned
    Grocery {
        /// Output as CSV
        #[arg(long)]
        csv: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show calorie and macro totals for a day
    Macros {
        /// Day (weekday name or date key, e.g. "monday" or "2025-06-15")
        day: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export all recipes and plan entries to a JSON file
    Export {
        /// Output file path
        file: std::path::PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import recipes and plan entries from a JSON export
    Import {
        /// Path to the export file
        file: std::path::PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// Add a recipe
    Add {
        /// Recipe name
        name: String,
        /// Calories per serving
        #[arg(long)]
        calories: Option<f64>,
        /// Protein grams per serving
        #[arg(long)]
        protein: Option<f64>,
        /// Carb grams per serving
        #[arg(long)]
        carbs: Option<f64>,
        /// Fat grams per serving
        #[arg(long)]
        fats: Option<f64>,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Ingredient as "Name:amount[:unit]" (repeatable)
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
        /// Instruction step (repeatable, in order)
        #[arg(long = "step")]
        steps: Vec<String>,
        /// Number of servings
        #[arg(long)]
        servings: Option<i64>,
        /// Prep time (free text, e.g. "25 min")
        #[arg(long)]
        prep_time: Option<String>,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all recipes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show recipe details (ingredients + macros)
    Show {
        /// Recipe name or id
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update a recipe
    Update {
        /// Recipe name or id
        recipe: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New calories per serving
        #[arg(long)]
        calories: Option<f64>,
        /// New protein grams per serving
        #[arg(long)]
        protein: Option<f64>,
        /// New carb grams per serving
        #[arg(long)]
        carbs: Option<f64>,
        /// New fat grams per serving
        #[arg(long)]
        fats: Option<f64>,
        /// Replacement tag (repeatable; replaces the whole tag list)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Replacement ingredient as "Name:amount[:unit]" (repeatable; replaces the whole list)
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe (planned entries for it are kept but skipped in views)
    Delete {
        /// Recipe name or id
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Place a recipe into a day/meal slot
    Add {
        /// Recipe name or id
        recipe: String,
        /// Day (weekday name or date key)
        day: String,
        /// Meal: breakfast, lunch, dinner
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a plan entry to another slot
    Move {
        /// Entry id (prefix ok)
        entry: String,
        /// Day (weekday name or date key)
        day: String,
        /// Meal: breakfast, lunch, dinner
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a plan entry
    Remove {
        /// Entry id (prefix ok)
        entry: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the plan, grouped by day and meal
    Show {
        /// Limit to a single day
        #[arg(long)]
        day: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.profile.as_deref())?;
    let storage = SqliteStorage::open(&config.db_path)?;
    let mut svc = PlannerService::new(Box::new(storage))?;

    match cli.command {
        Commands::Recipe { command } => match command {
            RecipeCommands::Add {
                name,
                calories,
                protein,
                carbs,
                fats,
                tags,
                ingredients,
                steps,
                servings,
                prep_time,
                description,
                json,
            } => cmd_recipe_add(
                &mut svc,
                &name,
                calories,
                protein,
                carbs,
                fats,
                &tags,
                &ingredients,
                &steps,
                servings,
                prep_time,
                description,
                json,
            ),
            RecipeCommands::List { json } => cmd_recipe_list(&svc, json),
            RecipeCommands::Show { recipe, json } => cmd_recipe_show(&svc, &recipe, json),
            RecipeCommands::Update {
                recipe,
                name,
                calories,
                protein,
                carbs,
                fats,
                tags,
                ingredients,
                json,
            } => cmd_recipe_update(
                &mut svc,
                &recipe,
                name,
                calories,
                protein,
                carbs,
                fats,
                &tags,
                &ingredients,
                json,
            ),
            RecipeCommands::Delete { recipe, json } => cmd_recipe_delete(&mut svc, &recipe, json),
        },
        Commands::Plan { command } => match command {
            PlanCommands::Add {
                recipe,
                day,
                meal,
                json,
            } => cmd_plan_add(&mut svc, &recipe, &day, &meal, json),
            PlanCommands::Move {
                entry,
                day,
                meal,
                json,
            } => cmd_plan_move(&mut svc, &entry, &day, &meal, json),
            PlanCommands::Remove { entry, json } => cmd_plan_remove(&mut svc, &entry, json),
            PlanCommands::Show { day, json } => cmd_plan_show(&svc, day, json),
        },
        Commands::Grocery { csv, json } => cmd_grocery(&svc, csv, json),
        Commands::Macros { day, json } => cmd_macros(&svc, &day, json),
        Commands::Export { file, json } => cmd_export(&svc, &file, json),
        Commands::Import { file, json } => cmd_import(&mut svc, &file, json),
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let api_key = if no_auth {
                None
            } else {
                let (key, _new) = config.load_or_create_api_key()?;
                Some(key)
            };
            server::start_server(svc, port, &bind, api_key).await
        }
    }
}
