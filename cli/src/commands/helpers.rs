use anyhow::{Context, Result, bail};
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use platter_core::models::{NewIngredient, Recipe};

/// Parse an ingredient argument of the form "Name:amount:unit"
/// (e.g. "Lettuce:100:g"). The unit may be omitted for count-style
/// ingredients ("Egg:2").
pub(crate) fn parse_ingredient_spec(s: &str) -> Result<NewIngredient> {
    let parts: Vec<&str> = s.split(':').collect();
    if parts.len() < 2 || parts.len() > 3 {
        bail!("Invalid ingredient '{s}'. Use 'Name:amount:unit' (e.g. 'Lettuce:100:g')");
    }
    let name = parts[0].trim();
    if name.is_empty() {
        bail!("Invalid ingredient '{s}': name must not be empty");
    }
    let amount: f64 = parts[1]
        .trim()
        .parse()
        .with_context(|| format!("Invalid amount in ingredient '{s}'"))?;
    if amount < 0.0 {
        bail!("Ingredient amount must not be negative");
    }
    let unit = parts.get(2).map_or("", |u| u.trim());
    Ok(NewIngredient {
        name: name.to_string(),
        amount,
        unit: unit.to_string(),
    })
}

pub(crate) fn prompt_choice(count: usize) -> Result<usize> {
    eprint!("\nSelect a recipe (1-{count}): ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    let n: usize = line.trim().parse().context("Invalid number")?;
    if n < 1 || n > count {
        bail!("Selection out of range");
    }
    Ok(n - 1)
}

pub(crate) fn print_recipe_table(recipes: &[&Recipe]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "#")]
        idx: usize,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fats")]
        fats: String,
        #[tabled(rename = "Tags")]
        tags: String,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .enumerate()
        .map(|(i, r)| RecipeRow {
            idx: i + 1,
            name: truncate(&r.name, 35),
            ingredients: r.ingredients.len(),
            calories: r.calories.map_or("-".into(), |v| format!("{v:.0}")),
            protein: r
                .macros
                .and_then(|m| m.protein)
                .map_or("-".into(), |v| format!("{v:.0}g")),
            carbs: r
                .macros
                .and_then(|m| m.carbs)
                .map_or("-".into(), |v| format!("{v:.0}g")),
            fats: r
                .macros
                .and_then(|m| m.fats)
                .map_or("-".into(), |v| format!("{v:.0}g")),
            tags: r
                .tags
                .as_ref()
                .map(|t| truncate(&t.join(", "), 25))
                .unwrap_or_default(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
