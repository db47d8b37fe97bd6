use crate::model::{PlaceCategory, PlaceRecord, Position};
use crate::places::Round;
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;

/// Presentation-side projection of the latest aggregator output.
///
/// Filtering and selection never mutate the stored round.
#[derive(Debug)]
pub struct PlaceFilterView {
    places: Vec<PlaceRecord>,
    committed_sequence: u64,
    enabled: BTreeSet<PlaceCategory>,
    user_marker: Option<PlaceRecord>,
    selected: Option<Uuid>,
}

impl Default for PlaceFilterView {
    fn default() -> Self {
        Self {
            places: Vec::new(),
            committed_sequence: 0,
            enabled: PlaceCategory::ALL.into_iter().collect(),
            user_marker: None,
            selected: None,
        }
    }
}

impl PlaceFilterView {
    /// Replaces the stored output unless a newer round was already committed.
    pub fn commit(&mut self, round: Round) -> bool {
        if round.sequence <= self.committed_sequence {
            debug!(
                name: "view.round.stale",
                sequence = round.sequence,
                committed = self.committed_sequence,
                "dropping stale place round"
            );
            return false;
        }
        self.committed_sequence = round.sequence;
        self.places = round.places;
        if let Some(id) = self.selected
            && !self.places.iter().any(|p| p.id == id)
        {
            self.selected = None;
        }
        true
    }

    pub fn set_enabled(&mut self, categories: impl IntoIterator<Item = PlaceCategory>) {
        self.enabled = categories.into_iter().collect();
    }

    /// Flips one category and returns whether it is now enabled.
    pub fn toggle(&mut self, category: PlaceCategory) -> bool {
        if self.enabled.remove(&category) {
            false
        } else {
            self.enabled.insert(category);
            true
        }
    }

    pub fn enabled(&self) -> Vec<PlaceCategory> {
        self.enabled.iter().copied().collect()
    }

    pub fn is_enabled(&self, category: PlaceCategory) -> bool {
        self.enabled.contains(&category)
    }

    /// Enabled-category subsequence of the latest output, order preserved.
    pub fn visible_places(&self) -> Vec<PlaceRecord> {
        self.places
            .iter()
            .filter(|p| p.category.is_some_and(|c| self.enabled.contains(&c)))
            .cloned()
            .collect()
    }

    pub fn all_places(&self) -> &[PlaceRecord] {
        &self.places
    }

    /// Visible places plus the user marker, which ignores filters.
    pub fn map_markers(&self) -> Vec<PlaceRecord> {
        self.user_marker
            .iter()
            .cloned()
            .chain(self.visible_places())
            .collect()
    }

    pub fn set_user_position(&mut self, position: Position) {
        self.user_marker = Some(PlaceRecord::user_marker(position));
    }

    /// Points the selection at a stored place. Unknown ids clear it.
    pub fn select(&mut self, id: Uuid) -> Option<&PlaceRecord> {
        let found = self.places.iter().find(|p| p.id == id);
        self.selected = found.map(|p| p.id);
        found
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&PlaceRecord> {
        let id = self.selected?;
        self.places.iter().find(|p| p.id == id)
    }

    pub fn committed_sequence(&self) -> u64 {
        self.committed_sequence
    }
}
