use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::models::assignment::Assignment;

#[derive(Default)]
struct CompletionState {
    completed_flats: HashMap<String, HashSet<String>>,
    finished_societies: HashSet<String>,
}

/// Per-society flat completion. Memory only: resets when the app restarts.
#[derive(Default)]
pub struct FlatCompletionTracker {
    state: Mutex<CompletionState>,
}

impl FlatCompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut CompletionState) -> T) -> T {
        let mut guard = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    pub fn mark_flat_completed(&self, society_name: &str, flat_id: &str) {
        self.with_state(|s| {
            s.completed_flats
                .entry(society_name.to_string())
                .or_default()
                .insert(flat_id.to_string());
        });
    }

    pub fn is_flat_completed(&self, society_name: &str, flat_id: &str) -> bool {
        self.with_state(|s| {
            s.completed_flats
                .get(society_name)
                .is_some_and(|flats| flats.contains(flat_id))
        })
    }

    pub fn completed_count(&self, society_name: &str) -> usize {
        self.with_state(|s| s.completed_flats.get(society_name).map_or(0, HashSet::len))
    }

    pub fn mark_society_finished(&self, society_name: &str) {
        self.with_state(|s| {
            s.finished_societies.insert(society_name.to_string());
        });
    }

    pub fn is_society_finished(&self, society_name: &str) -> bool {
        self.with_state(|s| s.finished_societies.contains(society_name))
    }

    /// Called whenever the assignment's flat list gains focus. Returns `true`
    /// only the first time every flat is complete; the society is then marked
    /// finished and later calls return `false`.
    pub fn on_focus(&self, assignment: &Assignment) -> bool {
        self.with_state(|s| {
            let society = &assignment.society_name;
            if s.finished_societies.contains(society) || assignment.flat_numbers.is_empty() {
                return false;
            }
            let all_done = s.completed_flats.get(society).is_some_and(|done| {
                assignment.flat_numbers.iter().all(|flat| done.contains(flat))
            });
            if all_done {
                s.finished_societies.insert(society.clone());
            }
            all_done
        })
    }
}
