use anyhow::Result;

use platter_core::models::normalize_day;
use platter_core::service::PlannerService;

pub(crate) fn cmd_macros(svc: &PlannerService, day: &str, json: bool) -> Result<()> {
    let day = normalize_day(day);
    let totals = svc.day_totals(&day);

    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
        return Ok(());
    }

    let cal = totals.calories;
    let p = totals.protein;
    let c = totals.carbs;
    let f = totals.fats;
    println!("=== {day} ===");
    println!("  {cal:.0} kcal | P:{p:.0}g C:{c:.0}g F:{f:.0}g");
    Ok(())
}
