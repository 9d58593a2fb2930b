use std::collections::BTreeSet;

use crate::model::JobId;
use crate::view::Projection;

/// Ids the user has ticked. Always a subset of the ids currently in the store,
/// provided [`SelectionSet::reconcile`] runs after every store replacement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionSet {
    ids: BTreeSet<JobId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether `id` is selected afterwards.
    pub fn toggle(&mut self, id: JobId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    /// Selects exactly the rows visible in `projection`; hidden rows are never selected.
    pub fn select_all(&mut self, projection: &Projection) {
        self.ids = projection.ids().cloned().collect();
    }

    /// Header checkbox: clear when every visible row is already selected, otherwise select them all.
    pub fn toggle_all(&mut self, projection: &Projection) {
        if self.covers(projection) {
            self.clear();
        } else {
            self.select_all(projection);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drops every selected id missing from `current`. Returns how many were dropped.
    pub fn reconcile<'a>(&mut self, current: impl IntoIterator<Item = &'a JobId>) -> usize {
        let current: BTreeSet<&JobId> = current.into_iter().collect();
        let before = self.ids.len();
        self.ids.retain(|id| current.contains(id));
        before - self.ids.len()
    }

    /// True when the projection is non-empty and each of its rows is selected.
    pub fn covers(&self, projection: &Projection) -> bool {
        projection.matched > 0 && projection.ids().all(|id| self.ids.contains(id))
    }

    pub fn contains(&self, id: &JobId) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> Vec<JobId> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
