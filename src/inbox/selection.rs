//! Multi-select over the inbox list.

use std::collections::HashSet;

use crate::types::TicketId;

/// Displayed state of the select-all control, relative to the visible rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectAllState {
    None,
    All,
    Indeterminate,
}

/// Selected ticket ids, kept within the current record universe.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected: HashSet<TicketId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn contains(&self, id: &TicketId) -> bool {
        self.selected.contains(id)
    }

    /// Selected ids in a stable order.
    pub fn ids(&self) -> Vec<TicketId> {
        let mut ids: Vec<TicketId> = self.selected.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn select(&mut self, id: TicketId) {
        self.selected.insert(id);
    }

    pub fn toggle(&mut self, id: &TicketId) {
        if !self.selected.remove(id) {
            self.selected.insert(id.clone());
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Drop every selected id that is not in `universe`. Returns the dropped ids.
    pub fn retain_universe<'a>(
        &mut self,
        universe: impl IntoIterator<Item = &'a TicketId>,
    ) -> Vec<TicketId> {
        let universe: HashSet<&TicketId> = universe.into_iter().collect();
        let dropped: Vec<TicketId> = self
            .selected
            .iter()
            .filter(|id| !universe.contains(id))
            .cloned()
            .collect();
        for id in &dropped {
            self.selected.remove(id);
        }
        dropped
    }

    /// Tri-state over `visible`: indeterminate when some but not all are selected.
    pub fn state<'a>(&self, visible: impl IntoIterator<Item = &'a TicketId>) -> SelectAllState {
        let mut total = 0usize;
        let mut hits = 0usize;
        for id in visible {
            total += 1;
            if self.selected.contains(id) {
                hits += 1;
            }
        }

        match hits {
            0 => SelectAllState::None,
            n if n == total => SelectAllState::All,
            _ => SelectAllState::Indeterminate,
        }
    }

    /// Advance the select-all control: everything visible selected → clear;
    /// otherwise select every visible id.
    pub fn toggle_all<'a>(&mut self, visible: impl IntoIterator<Item = &'a TicketId> + Clone) {
        if self.state(visible.clone()) == SelectAllState::All {
            self.clear();
        } else {
            self.selected.extend(visible.into_iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> Vec<TicketId> {
        names.iter().map(|n| TicketId::from(*n)).collect()
    }

    #[test]
    fn test_select_all_then_deselect_one_is_indeterminate() {
        let visible = ids(&["a", "b", "c", "d", "e"]);
        let mut selection = Selection::new();
        assert_eq!(selection.state(&visible), SelectAllState::None);

        selection.toggle_all(&visible);
        assert_eq!(selection.len(), 5);
        assert_eq!(selection.state(&visible), SelectAllState::All);

        selection.toggle(&visible[2]);
        assert_eq!(selection.len(), 4);
        assert_eq!(selection.state(&visible), SelectAllState::Indeterminate);
    }

    #[test]
    fn test_toggle_all_cycles_none_all_none() {
        let visible = ids(&["a", "b"]);
        let mut selection = Selection::new();
        selection.toggle_all(&visible);
        selection.toggle_all(&visible);
        assert!(selection.is_empty());
    }

    #[test]
    fn test_toggle_all_from_indeterminate_selects_all() {
        let visible = ids(&["a", "b", "c"]);
        let mut selection = Selection::new();
        selection.select(visible[0].clone());
        selection.toggle_all(&visible);
        assert_eq!(selection.state(&visible), SelectAllState::All);
    }

    #[test]
    fn test_retain_universe_prunes_vanished_ids() {
        let mut selection = Selection::new();
        for id in ids(&["a", "b", "c"]) {
            selection.select(id);
        }
        let dropped = selection.retain_universe(&ids(&["a", "c", "z"]));
        assert_eq!(dropped, ids(&["b"]));
        assert_eq!(selection.ids(), ids(&["a", "c"]));
    }

    #[test]
    fn test_empty_visible_reads_as_none() {
        let selection = Selection::new();
        assert_eq!(selection.state(&Vec::<TicketId>::new()), SelectAllState::None);
    }
}
