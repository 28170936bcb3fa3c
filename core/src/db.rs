use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use rusqlite::{Connection, params};

use crate::models::{Ingredient, MealType, PlanEntry, Recipe};

/// SQLite-backed mirror of the in-memory stores. Collections are written as
/// full replaces inside a transaction; the reconciliation discipline is
/// replace-on-load, never field-level merge.
pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS recipes (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    calories REAL,
                    protein REAL,
                    carbs REAL,
                    fats REAL,
                    tags TEXT,
                    instructions TEXT,
                    prep_time TEXT,
                    servings INTEGER,
                    description TEXT,
                    image TEXT,
                    color TEXT,
                    position INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS ingredients (
                    id TEXT PRIMARY KEY,
                    recipe_id TEXT NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                    name TEXT NOT NULL,
                    amount REAL NOT NULL,
                    unit TEXT NOT NULL,
                    position INTEGER NOT NULL
                );

                -- recipe_id is deliberately not a foreign key: deleting a
                -- recipe must leave its placements dangling, not cascade.
                CREATE TABLE IF NOT EXISTS plan_entries (
                    id TEXT PRIMARY KEY,
                    recipe_id TEXT NOT NULL,
                    date TEXT NOT NULL,
                    meal_type TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_ingredients_recipe ON ingredients(recipe_id);
                CREATE INDEX IF NOT EXISTS idx_plan_entries_date ON plan_entries(date);

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    /// Load all recipes in insertion order, ingredients attached.
    pub fn load_recipes(&self) -> Result<Vec<Recipe>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, calories, protein, carbs, fats, tags, instructions,
                    prep_time, servings, description, image, color
             FROM recipes ORDER BY position",
        )?;
        let mut recipes: Vec<Recipe> = stmt
            .query_map([], |row| {
                let protein: Option<f64> = row.get(3)?;
                let carbs: Option<f64> = row.get(4)?;
                let fats: Option<f64> = row.get(5)?;
                let macros = if protein.is_none() && carbs.is_none() && fats.is_none() {
                    None
                } else {
                    Some(crate::models::Macros {
                        protein,
                        carbs,
                        fats,
                    })
                };
                let tags_json: Option<String> = row.get(6)?;
                let instructions_json: Option<String> = row.get(7)?;
                Ok(Recipe {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    ingredients: Vec::new(),
                    calories: row.get(2)?,
                    macros,
                    tags: tags_json
                        .and_then(|t| serde_json::from_str::<Vec<String>>(&t).ok()),
                    instructions: instructions_json
                        .and_then(|t| serde_json::from_str::<Vec<String>>(&t).ok()),
                    prep_time: row.get(8)?,
                    servings: row.get(9)?,
                    description: row.get(10)?,
                    image: row.get(11)?,
                    color: row.get(12)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut ing_stmt = self.conn.prepare(
            "SELECT id, name, amount, unit FROM ingredients
             WHERE recipe_id = ?1 ORDER BY position",
        )?;
        for recipe in &mut recipes {
            recipe.ingredients = ing_stmt
                .query_map(params![recipe.id], |row| {
                    Ok(Ingredient {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        amount: row.get(2)?,
                        unit: row.get(3)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
        }

        Ok(recipes)
    }

    pub fn load_plan(&self) -> Result<Vec<PlanEntry>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, recipe_id, date, meal_type FROM plan_entries ORDER BY created_at")?;
        let entries = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        entries
            .into_iter()
            .map(|(id, recipe_id, date, meal)| {
                Ok(PlanEntry {
                    id,
                    recipe_id,
                    date,
                    meal_type: MealType::parse(&meal)?,
                })
            })
            .collect()
    }

    /// Replace the whole recipe collection.
    pub fn save_recipes(&mut self, recipes: &[Recipe]) -> Result<()> {
        let now = Local::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM ingredients", [])?;
        tx.execute("DELETE FROM recipes", [])?;
        {
            let mut recipe_stmt = tx.prepare(
                "INSERT INTO recipes (id, name, calories, protein, carbs, fats, tags,
                                      instructions, prep_time, servings, description,
                                      image, color, position, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            )?;
            let mut ing_stmt = tx.prepare(
                "INSERT INTO ingredients (id, recipe_id, name, amount, unit, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (pos, recipe) in recipes.iter().enumerate() {
                let tags_json = recipe
                    .tags
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;
                let instructions_json = recipe
                    .instructions
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;
                recipe_stmt.execute(params![
                    recipe.id,
                    recipe.name,
                    recipe.calories,
                    recipe.macros.and_then(|m| m.protein),
                    recipe.macros.and_then(|m| m.carbs),
                    recipe.macros.and_then(|m| m.fats),
                    tags_json,
                    instructions_json,
                    recipe.prep_time,
                    recipe.servings,
                    recipe.description,
                    recipe.image,
                    recipe.color,
                    i64::try_from(pos)?,
                    now,
                ])?;
                for (ing_pos, ing) in recipe.ingredients.iter().enumerate() {
                    ing_stmt.execute(params![
                        ing.id,
                        recipe.id,
                        ing.name,
                        ing.amount,
                        ing.unit,
                        i64::try_from(ing_pos)?,
                    ])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Replace the whole plan collection.
    pub fn save_plan(&mut self, entries: &[PlanEntry]) -> Result<()> {
        let now = Local::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM plan_entries", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO plan_entries (id, recipe_id, date, meal_type, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (pos, entry) in entries.iter().enumerate() {
                // Suffix the timestamp with the position so ORDER BY
                // created_at reproduces insertion order exactly.
                stmt.execute(params![
                    entry.id,
                    entry.recipe_id,
                    entry.date,
                    entry.meal_type.as_str(),
                    format!("{now}#{pos:06}"),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
