use anyhow::{Context, Result};
use std::path::Path;

use platter_core::models::ExportData;
use platter_core::service::PlannerService;

pub(crate) fn cmd_export(svc: &PlannerService, file: &Path, json: bool) -> Result<()> {
    let data = svc.export_all();
    let contents = serde_json::to_string_pretty(&data)?;
    std::fs::write(file, contents)
        .with_context(|| format!("Failed to write {}", file.display()))?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "recipes": data.recipes.len(),
                "plan_entries": data.plan_entries.len(),
                "file": file.display().to_string(),
            })
        );
    } else {
        println!(
            "Exported {} recipes and {} plan entries to {}",
            data.recipes.len(),
            data.plan_entries.len(),
            file.display()
        );
    }
    Ok(())
}

pub(crate) fn cmd_import(svc: &mut PlannerService, file: &Path, json: bool) -> Result<()> {
    let contents = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let data: ExportData =
        serde_json::from_str(&contents).context("Invalid export file format")?;

    svc.import_all(&data)?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "recipes_imported": data.recipes.len(),
                "plan_entries_imported": data.plan_entries.len(),
            })
        );
    } else {
        println!(
            "Imported {} recipes and {} plan entries",
            data.recipes.len(),
            data.plan_entries.len()
        );
    }
    Ok(())
}
