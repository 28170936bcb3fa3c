//! Pure derivations over (plan, recipes): the merged grocery list and
//! per-day macro totals. No I/O, no store access, safe to recompute on
//! every input change.

use std::collections::HashMap;

use anyhow::Result;

use crate::models::{AggregatedIngredient, DayTotals, PlanEntry, Recipe};

/// Derive the consolidated shopping list for a plan.
///
/// Ingredients merge when (name, unit) match case-insensitively; amounts sum
/// with no rounding, display casing comes from the first occurrence, and each
/// bucket tracks its contributing recipe names deduplicated in insertion
/// order. Entries whose recipe no longer resolves are skipped silently.
/// Output is sorted ascending by display name, case-insensitively, with a
/// byte-order tie-break to keep the order deterministic.
#[must_use]
pub fn grocery_list(plan: &[PlanEntry], recipes: &[Recipe]) -> Vec<AggregatedIngredient> {
    let mut buckets: Vec<AggregatedIngredient> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for entry in plan {
        let Some(recipe) = recipes.iter().find(|r| r.id == entry.recipe_id) else {
            continue;
        };
        for ing in &recipe.ingredients {
            let key = (ing.name.to_lowercase(), ing.unit.to_lowercase());
            let idx = *index.entry(key).or_insert_with(|| {
                buckets.push(AggregatedIngredient {
                    name: ing.name.clone(),
                    unit: ing.unit.clone(),
                    amount: 0.0,
                    recipes: Vec::new(),
                });
                buckets.len() - 1
            });
            let bucket = &mut buckets[idx];
            bucket.amount += ing.amount;
            if !bucket.recipes.contains(&recipe.name) {
                bucket.recipes.push(recipe.name.clone());
            }
        }
    }

    buckets.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    buckets
}

/// Derive nutrition totals for one day of the plan.
///
/// Macro fields add only when the recipe declares a macros block (absent
/// fields count as 0); calories add whenever the top-level field is present,
/// independent of the macros block. Per-serving figures are summed as-is,
/// with no weighting by servings.
#[must_use]
pub fn day_totals(plan: &[PlanEntry], recipes: &[Recipe], day: &str) -> DayTotals {
    let mut totals = DayTotals::default();

    for entry in plan.iter().filter(|e| e.date == day) {
        let Some(recipe) = recipes.iter().find(|r| r.id == entry.recipe_id) else {
            continue;
        };
        if let Some(macros) = &recipe.macros {
            totals.protein += macros.protein.unwrap_or(0.0);
            totals.carbs += macros.carbs.unwrap_or(0.0);
            totals.fats += macros.fats.unwrap_or(0.0);
        }
        if let Some(calories) = recipe.calories {
            totals.calories += calories;
        }
    }

    totals
}

/// Render an aggregated grocery list as CSV (name, amount, unit, recipes).
pub fn grocery_csv(items: &[AggregatedIngredient]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["name", "amount", "unit", "recipes"])?;
    for item in items {
        writer.write_record([
            item.name.as_str(),
            &item.amount.to_string(),
            item.unit.as_str(),
            &item.recipes.join("; "),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush csv writer: {e}"))?;
    Ok(String::from_utf8(bytes)?)
}
