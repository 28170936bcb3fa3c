mod data;
mod grocery;
mod helpers;
mod macros;
mod plan;
mod recipe;

use anyhow::{Result, bail};

use platter_core::service::PlannerService;

use helpers::{print_recipe_table, prompt_choice};

pub(crate) use data::{cmd_export, cmd_import};
pub(crate) use grocery::cmd_grocery;
pub(crate) use macros::cmd_macros;
pub(crate) use plan::{cmd_plan_add, cmd_plan_move, cmd_plan_remove, cmd_plan_show};
pub(crate) use recipe::{
    cmd_recipe_add, cmd_recipe_delete, cmd_recipe_list, cmd_recipe_show, cmd_recipe_update,
};

/// Resolve a recipe argument to its id. Exact name match (case-insensitive)
/// wins; otherwise substring matches are offered, prompting when ambiguous.
pub(super) fn resolve_recipe_id(svc: &PlannerService, query: &str) -> Result<String> {
    if let Some(recipe) = svc.find_recipe_by_name(query) {
        return Ok(recipe.id.clone());
    }

    let lower = query.to_lowercase();
    let matches: Vec<_> = svc
        .recipes()
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&lower))
        .collect();

    match matches.len() {
        0 => bail!("No recipe found for '{query}'"),
        1 => Ok(matches[0].id.clone()),
        n => {
            print_recipe_table(&matches);
            let idx = prompt_choice(n)?;
            Ok(matches[idx].id.clone())
        }
    }
}
