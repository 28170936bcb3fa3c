use anyhow::{Result, bail};
use std::process;

use platter_core::models::{MealType, Slot, WEEKDAYS, normalize_day};
use platter_core::service::PlannerService;

use super::resolve_recipe_id;

/// Resolve an entry id argument, accepting a unique prefix of the full id.
fn resolve_entry_id(svc: &PlannerService, prefix: &str) -> Result<String> {
    let matches: Vec<&str> = svc
        .plan()
        .iter()
        .map(|e| e.id.as_str())
        .filter(|id| id.starts_with(prefix))
        .collect();
    match matches.len() {
        0 => bail!("No plan entry matching '{prefix}'"),
        1 => Ok(matches[0].to_string()),
        _ => bail!("Ambiguous entry id '{prefix}'; give more characters"),
    }
}

pub(crate) fn cmd_plan_add(
    svc: &mut PlannerService,
    recipe: &str,
    day: &str,
    meal: &str,
    json: bool,
) -> Result<()> {
    let recipe_id = resolve_recipe_id(svc, recipe)?;
    let day = normalize_day(day);
    let meal_type = MealType::parse(meal)?;

    let entry_id = svc.place(&recipe_id, &Slot::new(day.clone(), meal_type));

    if json {
        let entry = svc.plan().iter().find(|e| e.id == entry_id);
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let name = svc
            .get_recipe(&recipe_id)
            .map(|r| r.name.clone())
            .unwrap_or_default();
        let short = &entry_id[..8.min(entry_id.len())];
        println!("Planned {name} for {day} {meal_type} (entry {short})");
    }
    Ok(())
}

pub(crate) fn cmd_plan_move(
    svc: &mut PlannerService,
    entry: &str,
    day: &str,
    meal: &str,
    json: bool,
) -> Result<()> {
    let id = resolve_entry_id(svc, entry)?;
    let day = normalize_day(day);
    let meal_type = MealType::parse(meal)?;

    svc.move_entry(&id, &day, meal_type);

    if json {
        let entry = svc.plan().iter().find(|e| e.id == id);
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!("Moved entry to {day} {meal_type}");
    }
    Ok(())
}

pub(crate) fn cmd_plan_remove(svc: &mut PlannerService, entry: &str, json: bool) -> Result<()> {
    let id = resolve_entry_id(svc, entry)?;
    svc.remove_entry(&id);

    if json {
        println!("{}", serde_json::json!({ "removed": id }));
    } else {
        println!("Removed entry from plan");
    }
    Ok(())
}

pub(crate) fn cmd_plan_show(svc: &PlannerService, day: Option<String>, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(svc.plan())?);
        return Ok(());
    }

    if svc.plan().is_empty() {
        eprintln!("The plan is empty. Add to it with: platter plan add <recipe> <day> <meal>");
        process::exit(2);
    }

    // Weekdays in canonical order first, then any other date keys in the
    // order they appear in the plan.
    let days: Vec<String> = match day {
        Some(d) => vec![normalize_day(&d)],
        None => {
            let mut days: Vec<String> = WEEKDAYS
                .iter()
                .map(|d| (*d).to_string())
                .filter(|d| svc.plan().iter().any(|e| &e.date == d))
                .collect();
            for entry in svc.plan() {
                if !days.contains(&entry.date) {
                    days.push(entry.date.clone());
                }
            }
            days
        }
    };

    let mut skipped = 0usize;
    for day in &days {
        println!("=== {day} ===");
        for meal in [MealType::Breakfast, MealType::Lunch, MealType::Dinner] {
            let slot = Slot::new(day.clone(), meal);
            let entries = svc.entries_for_slot(&slot);
            if entries.is_empty() {
                continue;
            }
            let label = meal.as_str().to_uppercase();
            println!("  {label}");
            for entry in entries {
                // Dangling entries are skipped, as in every derived view.
                let Some(recipe) = svc.get_recipe(&entry.recipe_id) else {
                    skipped += 1;
                    continue;
                };
                let short = &entry.id[..8.min(entry.id.len())];
                let cal = recipe
                    .calories
                    .map(|c| format!(" ({c:.0} kcal)"))
                    .unwrap_or_default();
                println!("    [{short}] {}{cal}", recipe.name);
            }
        }
        println!();
    }

    if skipped > 0 {
        eprintln!("({skipped} entries reference deleted recipes and were not shown)");
    }
    Ok(())
}
