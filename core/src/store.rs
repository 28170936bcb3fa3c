use uuid::Uuid;

use crate::models::{MealType, NewRecipe, PlanEntry, Recipe, RecipeUpdate, Slot};

/// Owns the recipe collection. Mutations referencing an unknown id are
/// silent no-ops: the UI only ever issues ids it just obtained from us.
#[derive(Debug, Default)]
pub struct RecipeStore {
    recipes: Vec<Recipe>,
}

impl RecipeStore {
    #[must_use]
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    /// Append a recipe with a fresh id, returning the stored copy.
    pub fn add(&mut self, new: NewRecipe) -> Recipe {
        let recipe = Recipe {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            ingredients: new
                .ingredients
                .into_iter()
                .map(|ing| crate::models::Ingredient {
                    id: Uuid::new_v4().to_string(),
                    name: ing.name,
                    amount: ing.amount,
                    unit: ing.unit,
                })
                .collect(),
            calories: new.calories,
            macros: new.macros,
            tags: new.tags,
            instructions: new.instructions,
            prep_time: new.prep_time,
            servings: new.servings,
            description: new.description,
            image: new.image,
            color: new.color,
        };
        self.recipes.push(recipe.clone());
        recipe
    }

    /// Apply a partial update in place. No-op if the id is absent.
    pub fn update(&mut self, id: &str, update: &RecipeUpdate) {
        let Some(recipe) = self.recipes.iter_mut().find(|r| r.id == id) else {
            return;
        };
        if let Some(name) = &update.name {
            recipe.name = name.clone();
        }
        if let Some(ingredients) = &update.ingredients {
            recipe.ingredients = ingredients
                .iter()
                .map(|ing| crate::models::Ingredient {
                    id: Uuid::new_v4().to_string(),
                    name: ing.name.clone(),
                    amount: ing.amount,
                    unit: ing.unit.clone(),
                })
                .collect();
        }
        if let Some(calories) = &update.calories {
            recipe.calories = *calories;
        }
        if let Some(macros) = &update.macros {
            recipe.macros = *macros;
        }
        if let Some(tags) = &update.tags {
            recipe.tags = tags.clone();
        }
        if let Some(instructions) = &update.instructions {
            recipe.instructions = instructions.clone();
        }
        if let Some(prep_time) = &update.prep_time {
            recipe.prep_time = prep_time.clone();
        }
        if let Some(servings) = &update.servings {
            recipe.servings = *servings;
        }
        if let Some(description) = &update.description {
            recipe.description = description.clone();
        }
        if let Some(image) = &update.image {
            recipe.image = image.clone();
        }
        if let Some(color) = &update.color {
            recipe.color = color.clone();
        }
    }

    /// Remove a recipe. Does not cascade to plan entries: plan history is
    /// preserved and readers null-check the reference instead.
    pub fn delete(&mut self, id: &str) {
        self.recipes.retain(|r| r.id != id);
    }

    /// Recipes in insertion order.
    #[must_use]
    pub fn list(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Resolve an id to a recipe, or `None` for a dangling reference.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Recipe> {
        let lower = name.to_lowercase();
        self.recipes.iter().find(|r| r.name.to_lowercase() == lower)
    }

    /// Refresh boundary: replace the whole collection with storage contents.
    pub fn replace_all(&mut self, recipes: Vec<Recipe>) {
        self.recipes = recipes;
    }
}

/// Owns the weekly plan: an unordered collection of placements. A slot is a
/// multiset; the same recipe may occupy the same slot more than once.
#[derive(Debug, Default)]
pub struct PlanStore {
    entries: Vec<PlanEntry>,
}

impl PlanStore {
    #[must_use]
    pub fn new(entries: Vec<PlanEntry>) -> Self {
        Self { entries }
    }

    /// Add a placement. The caller supplies the (globally unique) entry id;
    /// no dedup by (recipe, date, meal) is performed.
    pub fn add_entry(&mut self, entry: PlanEntry) {
        self.entries.push(entry);
    }

    /// Update the slot fields of the matching entry in place. No-op if the
    /// id is absent.
    pub fn move_entry(&mut self, id: &str, date: &str, meal_type: MealType) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.id == id) {
            entry.date = date.to_string();
            entry.meal_type = meal_type;
        }
    }

    /// Remove a placement. No-op if the id is absent.
    pub fn remove_entry(&mut self, id: &str) {
        self.entries.retain(|e| e.id != id);
    }

    #[must_use]
    pub fn list(&self) -> &[PlanEntry] {
        &self.entries
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries occupying the given slot, in insertion order.
    #[must_use]
    pub fn entries_for_slot(&self, slot: &Slot) -> Vec<&PlanEntry> {
        self.entries
            .iter()
            .filter(|e| e.date == slot.date && e.meal_type == slot.meal_type)
            .collect()
    }

    /// Refresh boundary: replace the whole collection with storage contents.
    pub fn replace_all(&mut self, entries: Vec<PlanEntry>) {
        self.entries = entries;
    }
}
