use anyhow::Result;
use chrono::Local;

use crate::aggregate;
use crate::board::{DragSubject, DropOutcome, DropTarget, PlannerBoard, place_recipe};
use crate::db::Database;
use crate::models::{
    AggregatedIngredient, DayTotals, EXPORT_VERSION, ExportData, MealType, NewRecipe, PlanEntry,
    Recipe, RecipeUpdate, Slot, validate_import_entry, validate_import_recipe,
};
use crate::store::{PlanStore, RecipeStore};

/// Persistent mirror of the planner state.
///
/// The in-memory stores are authoritative for the session; implementations
/// are an eventually-consistent backing copy, reconciled only by a full
/// replace at the load/refresh boundary.
pub trait PlanStorage: Send {
    fn load(&mut self) -> Result<(Vec<Recipe>, Vec<PlanEntry>)>;
    fn save_recipes(&mut self, recipes: &[Recipe]) -> Result<()>;
    fn save_plan(&mut self, entries: &[PlanEntry]) -> Result<()>;
}

/// SQLite-backed storage (the shipped implementation).
pub struct SqliteStorage {
    db: Database,
}

impl SqliteStorage {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        Ok(Self {
            db: Database::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            db: Database::open_in_memory()?,
        })
    }
}

impl PlanStorage for SqliteStorage {
    fn load(&mut self) -> Result<(Vec<Recipe>, Vec<PlanEntry>)> {
        Ok((self.db.load_recipes()?, self.db.load_plan()?))
    }

    fn save_recipes(&mut self, recipes: &[Recipe]) -> Result<()> {
        self.db.save_recipes(recipes)
    }

    fn save_plan(&mut self, entries: &[PlanEntry]) -> Result<()> {
        self.db.save_plan(entries)
    }
}

/// Facade over the stores, the planner board, and persistence.
///
/// Every mutation applies to the in-memory store first and then attempts a
/// write-through save. A failed save is logged and otherwise ignored: local
/// state stays authoritative and may diverge from storage until the next
/// successful save or `refresh`.
pub struct PlannerService {
    recipes: RecipeStore,
    plan: PlanStore,
    board: PlannerBoard,
    storage: Box<dyn PlanStorage>,
}

impl PlannerService {
    pub fn new(mut storage: Box<dyn PlanStorage>) -> Result<Self> {
        let (recipes, entries) = storage.load()?;
        Ok(Self {
            recipes: RecipeStore::new(recipes),
            plan: PlanStore::new(entries),
            board: PlannerBoard::new(),
            storage,
        })
    }

    pub fn new_in_memory() -> Result<Self> {
        Self::new(Box::new(SqliteStorage::open_in_memory()?))
    }

    // --- Recipes ---

    pub fn add_recipe(&mut self, new: NewRecipe) -> Recipe {
        let recipe = self.recipes.add(new);
        self.persist_recipes();
        recipe
    }

    pub fn update_recipe(&mut self, id: &str, update: &RecipeUpdate) {
        self.recipes.update(id, update);
        self.persist_recipes();
    }

    /// Delete a recipe. Plan entries referencing it are left dangling by
    /// design; derived views skip them.
    pub fn delete_recipe(&mut self, id: &str) {
        self.recipes.delete(id);
        self.persist_recipes();
    }

    #[must_use]
    pub fn recipes(&self) -> &[Recipe] {
        self.recipes.list()
    }

    #[must_use]
    pub fn get_recipe(&self, id: &str) -> Option<&Recipe> {
        self.recipes.get(id)
    }

    #[must_use]
    pub fn find_recipe_by_name(&self, name: &str) -> Option<&Recipe> {
        self.recipes.find_by_name(name)
    }

    // --- Plan ---

    #[must_use]
    pub fn plan(&self) -> &[PlanEntry] {
        self.plan.list()
    }

    #[must_use]
    pub fn entries_for_slot(&self, slot: &Slot) -> Vec<&PlanEntry> {
        self.plan.entries_for_slot(slot)
    }

    /// Place a recipe into a slot directly (CLI/REST path), returning the
    /// new entry id.
    pub fn place(&mut self, recipe_id: &str, slot: &Slot) -> String {
        let id = place_recipe(recipe_id, slot, &mut self.plan);
        self.persist_plan();
        id
    }

    pub fn move_entry(&mut self, id: &str, date: &str, meal_type: MealType) {
        self.plan.move_entry(id, date, meal_type);
        self.persist_plan();
    }

    pub fn remove_entry(&mut self, id: &str) {
        self.plan.remove_entry(id);
        self.persist_plan();
    }

    // --- Drag gestures ---

    pub fn drag_start(&mut self, subject: DragSubject) {
        self.board.drag_start(subject);
    }

    pub fn drag_cancel(&mut self) {
        self.board.drag_cancel();
    }

    /// Complete a drag gesture. Persists only when the drop changed the plan.
    pub fn drag_end(&mut self, target: &DropTarget) -> DropOutcome {
        let outcome = self.board.drag_end(target, &mut self.plan);
        if outcome != DropOutcome::NoChange {
            self.persist_plan();
        }
        outcome
    }

    // --- Derived views ---

    #[must_use]
    pub fn grocery_list(&self) -> Vec<AggregatedIngredient> {
        aggregate::grocery_list(self.plan.list(), self.recipes.list())
    }

    #[must_use]
    pub fn day_totals(&self, day: &str) -> DayTotals {
        aggregate::day_totals(self.plan.list(), self.recipes.list(), day)
    }

    // --- Refresh / export / import ---

    /// Reconcile with storage: full replace of both in-memory collections.
    pub fn refresh(&mut self) -> Result<()> {
        let (recipes, entries) = self.storage.load()?;
        self.recipes.replace_all(recipes);
        self.plan.replace_all(entries);
        Ok(())
    }

    #[must_use]
    pub fn export_all(&self) -> ExportData {
        ExportData {
            version: EXPORT_VERSION,
            exported_at: Local::now().to_rfc3339(),
            recipes: self.recipes.list().to_vec(),
            plan_entries: self.plan.list().to_vec(),
        }
    }

    /// Validate and adopt an exported dataset, replacing both collections.
    pub fn import_all(&mut self, data: &ExportData) -> Result<()> {
        for recipe in &data.recipes {
            validate_import_recipe(recipe)?;
        }
        for entry in &data.plan_entries {
            validate_import_entry(entry)?;
        }
        self.recipes.replace_all(data.recipes.clone());
        self.plan.replace_all(data.plan_entries.clone());
        self.persist_recipes();
        self.persist_plan();
        Ok(())
    }

    // --- Persistence (write-through, log-and-stay-local on failure) ---

    fn persist_recipes(&mut self) {
        if let Err(e) = self.storage.save_recipes(self.recipes.list()) {
            eprintln!("Warning: failed to save recipes, keeping local state: {e:#}");
        }
    }

    fn persist_plan(&mut self) {
        if let Err(e) = self.storage.save_plan(self.plan.list()) {
            eprintln!("Warning: failed to save plan, keeping local state: {e:#}");
        }
    }
}
