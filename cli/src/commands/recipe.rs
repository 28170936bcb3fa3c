use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use platter_core::models::{Macros, NewRecipe, RecipeUpdate, validate_new_recipe};
use platter_core::service::PlannerService;

use super::helpers::{parse_ingredient_spec, print_recipe_table};
use super::resolve_recipe_id;

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_recipe_add(
    svc: &mut PlannerService,
    name: &str,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fats: Option<f64>,
    tags: &[String],
    ingredients: &[String],
    steps: &[String],
    servings: Option<i64>,
    prep_time: Option<String>,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let macros = if protein.is_none() && carbs.is_none() && fats.is_none() {
        None
    } else {
        Some(Macros {
            protein,
            carbs,
            fats,
        })
    };

    let new = NewRecipe {
        name: name.to_string(),
        ingredients: ingredients
            .iter()
            .map(|s| parse_ingredient_spec(s))
            .collect::<Result<Vec<_>>>()?,
        calories,
        macros,
        tags: if tags.is_empty() {
            None
        } else {
            Some(tags.to_vec())
        },
        instructions: if steps.is_empty() {
            None
        } else {
            Some(steps.to_vec())
        },
        prep_time,
        servings,
        description,
        image: None,
        color: None,
    };
    validate_new_recipe(&new)?;

    let recipe = svc.add_recipe(new);
    if json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        let id = &recipe.id;
        let count = recipe.ingredients.len();
        println!("Created recipe: {name} ({count} ingredients, id: {id})");
        println!("Plan it with: platter plan add \"{name}\" <day> <meal>");
    }
    Ok(())
}

pub(crate) fn cmd_recipe_list(svc: &PlannerService, json: bool) -> Result<()> {
    let recipes = svc.recipes();

    if json {
        println!("{}", serde_json::to_string_pretty(recipes)?);
        return Ok(());
    }

    if recipes.is_empty() {
        eprintln!("No recipes yet. Add one with: platter recipe add <name>");
        process::exit(2);
    }

    let refs: Vec<_> = recipes.iter().collect();
    print_recipe_table(&refs);
    Ok(())
}

pub(crate) fn cmd_recipe_show(svc: &PlannerService, query: &str, json: bool) -> Result<()> {
    let id = resolve_recipe_id(svc, query)?;
    let recipe = svc.get_recipe(&id).expect("resolved id must exist");

    if json {
        println!("{}", serde_json::to_string_pretty(recipe)?);
        return Ok(());
    }

    let name = &recipe.name;
    println!("=== {name} ===");
    if let Some(desc) = &recipe.description {
        println!("{desc}");
    }
    if let Some(cal) = recipe.calories {
        println!("Calories: {cal:.0} per serving");
    }
    if let Some(m) = &recipe.macros {
        let p = m.protein.unwrap_or(0.0);
        let c = m.carbs.unwrap_or(0.0);
        let f = m.fats.unwrap_or(0.0);
        println!("Macros: P:{p:.0}g C:{c:.0}g F:{f:.0}g");
    }
    if let Some(servings) = recipe.servings {
        println!("Servings: {servings}");
    }
    if let Some(prep) = &recipe.prep_time {
        println!("Prep time: {prep}");
    }
    if let Some(tags) = &recipe.tags {
        println!("Tags: {}", tags.join(", "));
    }
    if let Some(steps) = &recipe.instructions {
        println!("\nInstructions:");
        for (i, step) in steps.iter().enumerate() {
            println!("  {}. {step}", i + 1);
        }
    }

    if recipe.ingredients.is_empty() {
        println!("\n(no ingredients)");
        return Ok(());
    }

    #[derive(Tabled)]
    struct IngredientRow {
        #[tabled(rename = "Ingredient")]
        name: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Unit")]
        unit: String,
    }

    let rows: Vec<IngredientRow> = recipe
        .ingredients
        .iter()
        .map(|ing| IngredientRow {
            name: ing.name.clone(),
            amount: ing.amount.to_string(),
            unit: ing.unit.clone(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("\n{table}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub(crate) fn cmd_recipe_update(
    svc: &mut PlannerService,
    query: &str,
    name: Option<String>,
    calories: Option<f64>,
    protein: Option<f64>,
    carbs: Option<f64>,
    fats: Option<f64>,
    tags: &[String],
    ingredients: &[String],
    json: bool,
) -> Result<()> {
    let id = resolve_recipe_id(svc, query)?;

    let macros_update = if protein.is_none() && carbs.is_none() && fats.is_none() {
        None
    } else {
        // Merge with the existing block so updating one macro keeps the rest.
        let existing = svc
            .get_recipe(&id)
            .and_then(|r| r.macros)
            .unwrap_or_default();
        Some(Some(Macros {
            protein: protein.or(existing.protein),
            carbs: carbs.or(existing.carbs),
            fats: fats.or(existing.fats),
        }))
    };

    let update = RecipeUpdate {
        name,
        ingredients: if ingredients.is_empty() {
            None
        } else {
            Some(
                ingredients
                    .iter()
                    .map(|s| parse_ingredient_spec(s))
                    .collect::<Result<Vec<_>>>()?,
            )
        },
        calories: calories.map(Some),
        macros: macros_update,
        tags: if tags.is_empty() {
            None
        } else {
            Some(Some(tags.to_vec()))
        },
        ..RecipeUpdate::default()
    };

    svc.update_recipe(&id, &update);

    let recipe = svc.get_recipe(&id).expect("resolved id must exist");
    if json {
        println!("{}", serde_json::to_string_pretty(recipe)?);
    } else {
        println!("Updated recipe: {}", recipe.name);
    }
    Ok(())
}

pub(crate) fn cmd_recipe_delete(svc: &mut PlannerService, query: &str, json: bool) -> Result<()> {
    let id = resolve_recipe_id(svc, query)?;
    let name = svc
        .get_recipe(&id)
        .map(|r| r.name.clone())
        .unwrap_or_default();

    svc.delete_recipe(&id);

    if json {
        println!("{}", serde_json::json!({ "deleted": name }));
    } else {
        println!("Deleted recipe: {name}");
        let dangling = svc.plan().iter().filter(|e| e.recipe_id == id).count();
        if dangling > 0 {
            println!(
                "Note: {dangling} plan entr{} still reference it and will be skipped in views",
                if dangling == 1 { "y" } else { "ies" }
            );
        }
    }
    Ok(())
}
