//! Planner board interaction logic: an explicit state machine over a drag
//! gesture, driven by discrete start/end events so it stays portable across
//! UI toolkits. The plan store is touched exactly once, at gesture end.

use uuid::Uuid;

use crate::models::{PlanEntry, Slot};
use crate::store::PlanStore;

/// What is being dragged. A library recipe has no entry id yet and needs a
/// fresh one on drop; a placed entry carries its own id and is moved, not
/// re-inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragSubject {
    pub recipe_id: String,
    pub entry_id: Option<String>,
}

impl DragSubject {
    /// A recipe dragged out of the library, not yet on the board.
    #[must_use]
    pub fn library(recipe_id: impl Into<String>) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            entry_id: None,
        }
    }

    /// An existing placement being relocated.
    #[must_use]
    pub fn placed(entry_id: impl Into<String>, recipe_id: impl Into<String>) -> Self {
        Self {
            recipe_id: recipe_id.into(),
            entry_id: Some(entry_id.into()),
        }
    }
}

/// Where the gesture ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Slot(Slot),
    RemoveZone,
    Nothing,
}

impl DropTarget {
    /// Collapse possibly-overlapping hit-test results to one target. When a
    /// gesture reports both a slot and the remove zone, the slot wins.
    #[must_use]
    pub fn resolve(slot: Option<Slot>, over_remove_zone: bool) -> Self {
        match (slot, over_remove_zone) {
            (Some(slot), _) => Self::Slot(slot),
            (None, true) => Self::RemoveZone,
            (None, false) => Self::Nothing,
        }
    }
}

/// What a completed gesture did to the plan, so callers can persist only
/// when something changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Inserted(String),
    Moved(String),
    Removed(String),
    NoChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum DragState {
    #[default]
    Idle,
    Dragging(DragSubject),
}

/// Orchestrates drag-and-drop between the recipe library and the plan.
/// Owns no plan state itself; it mutates the store it is handed at drop
/// time, atomically, then returns to idle.
#[derive(Debug, Default)]
pub struct PlannerBoard {
    state: DragState,
}

impl PlannerBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    /// Gesture start: capture the subject. Starting a new drag while one is
    /// active replaces the old subject (the previous gesture never ended, so
    /// it never mutated anything).
    pub fn drag_start(&mut self, subject: DragSubject) {
        self.state = DragState::Dragging(subject);
    }

    /// Gesture cancelled without a drop. Guaranteed no-op on the plan.
    pub fn drag_cancel(&mut self) {
        self.state = DragState::Idle;
    }

    /// Gesture end. Performs at most one store mutation and always returns
    /// the board to idle.
    pub fn drag_end(&mut self, target: &DropTarget, plan: &mut PlanStore) -> DropOutcome {
        let DragState::Dragging(subject) = std::mem::take(&mut self.state) else {
            return DropOutcome::NoChange;
        };

        match target {
            DropTarget::Slot(slot) => Self::drop_on_slot(&subject, slot, plan),
            DropTarget::RemoveZone => Self::drop_on_remove_zone(&subject, plan),
            DropTarget::Nothing => DropOutcome::NoChange,
        }
    }

    fn drop_on_slot(subject: &DragSubject, slot: &Slot, plan: &mut PlanStore) -> DropOutcome {
        match &subject.entry_id {
            Some(entry_id) if plan.contains(entry_id) => {
                plan.move_entry(entry_id, &slot.date, slot.meal_type);
                DropOutcome::Moved(entry_id.clone())
            }
            _ => {
                let entry = PlanEntry {
                    id: Uuid::new_v4().to_string(),
                    recipe_id: subject.recipe_id.clone(),
                    date: slot.date.clone(),
                    meal_type: slot.meal_type,
                };
                let id = entry.id.clone();
                plan.add_entry(entry);
                DropOutcome::Inserted(id)
            }
        }
    }

    fn drop_on_remove_zone(subject: &DragSubject, plan: &mut PlanStore) -> DropOutcome {
        match &subject.entry_id {
            Some(entry_id) if plan.contains(entry_id) => {
                plan.remove_entry(entry_id);
                DropOutcome::Removed(entry_id.clone())
            }
            // Removing something never added is not an error.
            _ => DropOutcome::NoChange,
        }
    }
}

/// Convenience for non-gesture callers (CLI, REST): place a recipe into a
/// slot as a single insert, exactly as a completed library drag would.
#[must_use]
pub fn place_recipe(recipe_id: &str, slot: &Slot, plan: &mut PlanStore) -> String {
    let entry = PlanEntry {
        id: Uuid::new_v4().to_string(),
        recipe_id: recipe_id.to_string(),
        date: slot.date.clone(),
        meal_type: slot.meal_type,
    };
    let id = entry.id.clone();
    plan.add_entry(entry);
    id
}
