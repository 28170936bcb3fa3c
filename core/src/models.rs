use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Meal slots recognized by the planner, in display order.
pub const MEAL_TYPES: &[&str] = &["breakfast", "lunch", "dinner"];

/// Weekday labels used as the default plan grid, Monday first.
pub const WEEKDAYS: &[&str] = &[
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            _ => bail!(
                "Invalid meal type '{s}'. Must be one of: {}",
                MEAL_TYPES.join(", ")
            ),
        }
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// Per-serving macro grams. Each field is individually optional; consumers
/// read an absent field as 0.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Macros {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub protein: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub carbs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub fats: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub calories: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub macros: Option<Macros>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub instructions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub prep_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub servings: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<String>,
}

/// Ingredient line as supplied by a caller; the store assigns the id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIngredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// Recipe as supplied by a caller; the store assigns the id.
#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub name: String,
    pub ingredients: Vec<NewIngredient>,
    pub calories: Option<f64>,
    pub macros: Option<Macros>,
    pub tags: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    pub prep_time: Option<String>,
    pub servings: Option<i64>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub color: Option<String>,
}

/// Partial recipe update. `ingredients` replaces the whole list when present.
#[derive(Debug, Clone, Default)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub ingredients: Option<Vec<NewIngredient>>,
    pub calories: Option<Option<f64>>,
    pub macros: Option<Option<Macros>>,
    pub tags: Option<Option<Vec<String>>>,
    pub instructions: Option<Option<Vec<String>>>,
    pub prep_time: Option<Option<String>>,
    pub servings: Option<Option<i64>>,
    pub description: Option<Option<String>>,
    pub image: Option<Option<String>>,
    pub color: Option<Option<String>>,
}

/// One placement of a recipe into a day/meal slot.
///
/// `recipe_id` is a weak reference: deleting the recipe leaves the entry in
/// place, and every derived view skips entries that no longer resolve.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    pub id: String,
    pub recipe_id: String,
    pub date: String,
    pub meal_type: MealType,
}

/// The (date, meal) address of a calendar cell. Not stored; a grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    pub date: String,
    pub meal_type: MealType,
}

impl Slot {
    #[must_use]
    pub fn new(date: impl Into<String>, meal_type: MealType) -> Self {
        Self {
            date: date.into(),
            meal_type,
        }
    }
}

/// A merged, summed ingredient line produced by the grocery aggregator.
/// Name and unit keep the casing of the first occurrence; `recipes` lists
/// contributing recipe names deduplicated in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedIngredient {
    pub name: String,
    pub unit: String,
    pub amount: f64,
    pub recipes: Vec<String>,
}

/// Per-day nutrition totals. All fields start at 0 for an empty day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DayTotals {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub calories: f64,
}

// --- Export / Import types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: i64,
    pub exported_at: String,
    pub recipes: Vec<Recipe>,
    pub plan_entries: Vec<PlanEntry>,
}

pub const EXPORT_VERSION: i64 = 1;

// --- Validation (used at the CLI/server edges; the stores themselves
//     enforce nothing beyond type constraints) ---

pub fn validate_new_recipe(recipe: &NewRecipe) -> Result<()> {
    if recipe.name.trim().is_empty() {
        bail!("Recipe name must not be empty");
    }
    if recipe.calories.is_some_and(|v| v < 0.0) {
        bail!("calories must not be negative");
    }
    if let Some(m) = &recipe.macros {
        validate_macros(m)?;
    }
    for ing in &recipe.ingredients {
        validate_ingredient(ing)?;
    }
    Ok(())
}

pub fn validate_ingredient(ing: &NewIngredient) -> Result<()> {
    if ing.name.trim().is_empty() {
        bail!("Ingredient name must not be empty");
    }
    if ing.amount < 0.0 {
        bail!("Ingredient amount must not be negative");
    }
    Ok(())
}

pub fn validate_macros(macros: &Macros) -> Result<()> {
    if macros.protein.is_some_and(|v| v < 0.0) {
        bail!("protein must not be negative");
    }
    if macros.carbs.is_some_and(|v| v < 0.0) {
        bail!("carbs must not be negative");
    }
    if macros.fats.is_some_and(|v| v < 0.0) {
        bail!("fats must not be negative");
    }
    Ok(())
}

/// Validate an imported recipe (same rules as a new one, plus a non-empty id).
pub fn validate_import_recipe(recipe: &Recipe) -> Result<()> {
    if recipe.id.trim().is_empty() {
        bail!("Recipe id must not be empty");
    }
    if recipe.name.trim().is_empty() {
        bail!("Recipe name must not be empty");
    }
    if recipe.calories.is_some_and(|v| v < 0.0) {
        bail!("calories must not be negative");
    }
    if let Some(m) = &recipe.macros {
        validate_macros(m)?;
    }
    for ing in &recipe.ingredients {
        if ing.amount < 0.0 {
            bail!("Ingredient amount must not be negative");
        }
    }
    Ok(())
}

/// Validate an imported plan entry: non-empty ids. The date is an arbitrary
/// key (weekday label or date string), so no format is enforced.
pub fn validate_import_entry(entry: &PlanEntry) -> Result<()> {
    if entry.id.trim().is_empty() {
        bail!("Plan entry id must not be empty");
    }
    if entry.recipe_id.trim().is_empty() {
        bail!("Plan entry recipe_id must not be empty");
    }
    Ok(())
}

/// Normalize a day argument: weekday names (full or three-letter, any case)
/// become their canonical capitalized form; anything else passes through
/// unchanged as an arbitrary date key.
#[must_use]
pub fn normalize_day(day: &str) -> String {
    let lower = day.trim().to_lowercase();
    for canonical in WEEKDAYS {
        if lower == canonical.to_lowercase() || lower == canonical[..3].to_lowercase() {
            return (*canonical).to_string();
        }
    }
    day.trim().to_string()
}
