use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use platter_core::aggregate::grocery_csv;
use platter_core::service::PlannerService;

use super::helpers::truncate;

pub(crate) fn cmd_grocery(svc: &PlannerService, csv: bool, json: bool) -> Result<()> {
    let items = svc.grocery_list();

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if csv {
        print!("{}", grocery_csv(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        eprintln!("Nothing to buy: the plan has no resolvable recipes");
        process::exit(2);
    }

    #[derive(Tabled)]
    struct GroceryRow {
        #[tabled(rename = "Ingredient")]
        name: String,
        #[tabled(rename = "Amount")]
        amount: String,
        #[tabled(rename = "Unit")]
        unit: String,
        #[tabled(rename = "Used in")]
        recipes: String,
    }

    let rows: Vec<GroceryRow> = items
        .iter()
        .map(|item| GroceryRow {
            name: item.name.clone(),
            amount: item.amount.to_string(),
            unit: item.unit.clone(),
            recipes: truncate(&item.recipes.join(", "), 40),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..2)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}
