//! Single focused CI and the epoch that guards its dependent loads.
//!
//! `Unselected -> Selected(id) -> Selected(id')`. The only automatic way back
//! to `Unselected` is an empty CI list. Every transition bumps the epoch, so
//! a response issued under an older ticket can be recognised and dropped.

/// Proof of which selection a load was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionTicket {
    pub id: String,
    pub epoch: u64,
}

/// What a fresh CI list did to the selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListReconcile {
    /// Existing selection left alone.
    Kept,
    /// Nothing was selected; the first row of the page is now.
    AutoSelected(SelectionTicket),
    /// The query matched nothing; selection cleared.
    Cleared,
    /// Nothing selected and nothing to select.
    Idle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: Option<String>,
    epoch: u64,
}

impl Selection {
    /// Restore a persisted selection without issuing any loads.
    pub fn restored(selected: Option<String>) -> Self {
        Self {
            selected: selected.filter(|id| !id.trim().is_empty()),
            epoch: 0,
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Focus `id`. Always supersedes in-flight loads, even when re-picking
    /// the same entity.
    pub fn select(&mut self, id: &str) -> SelectionTicket {
        self.epoch += 1;
        self.selected = Some(id.to_string());
        SelectionTicket {
            id: id.to_string(),
            epoch: self.epoch,
        }
    }

    pub fn clear(&mut self) {
        self.epoch += 1;
        self.selected = None;
    }

    /// Ticket for reloading the current selection without superseding it.
    pub fn ticket(&self) -> Option<SelectionTicket> {
        self.selected.as_ref().map(|id| SelectionTicket {
            id: id.clone(),
            epoch: self.epoch,
        })
    }

    pub fn is_current(&self, ticket: &SelectionTicket) -> bool {
        self.epoch == ticket.epoch && self.selected.as_deref() == Some(ticket.id.as_str())
    }

    /// Apply the default-selection policy to a freshly loaded list page.
    pub fn reconcile_with_list(&mut self, total: u64, first_id: Option<&str>) -> ListReconcile {
        if total == 0 {
            if self.selected.is_some() {
                self.clear();
                return ListReconcile::Cleared;
            }
            return ListReconcile::Idle;
        }
        if self.selected.is_some() {
            return ListReconcile::Kept;
        }
        match first_id {
            Some(id) => ListReconcile::AutoSelected(self.select(id)),
            None => ListReconcile::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_selection_invalidates_older_ticket() {
        let mut sel = Selection::default();
        let a = sel.select("A");
        let b = sel.select("B");
        assert!(!sel.is_current(&a));
        assert!(sel.is_current(&b));
    }

    #[test]
    fn reselecting_same_id_still_supersedes() {
        let mut sel = Selection::default();
        let first = sel.select("A");
        let second = sel.select("A");
        assert!(!sel.is_current(&first));
        assert!(sel.is_current(&second));
    }

    #[test]
    fn ticket_reuses_current_epoch() {
        let mut sel = Selection::default();
        assert!(sel.ticket().is_none());
        let issued = sel.select("A");
        assert_eq!(sel.ticket(), Some(issued));
    }

    #[test]
    fn empty_list_clears_selection() {
        let mut sel = Selection::default();
        let t = sel.select("A");
        assert_eq!(sel.reconcile_with_list(0, None), ListReconcile::Cleared);
        assert_eq!(sel.selected(), None);
        assert!(!sel.is_current(&t));
    }

    #[test]
    fn auto_select_only_when_unselected() {
        let mut sel = Selection::default();
        match sel.reconcile_with_list(3, Some("first")) {
            ListReconcile::AutoSelected(t) => assert_eq!(t.id, "first"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(sel.reconcile_with_list(3, Some("other")), ListReconcile::Kept);
        assert_eq!(sel.selected(), Some("first"));
    }

    #[test]
    fn page_past_end_keeps_nothing_to_select() {
        let mut sel = Selection::default();
        assert_eq!(sel.reconcile_with_list(10, None), ListReconcile::Idle);
        assert_eq!(sel.reconcile_with_list(0, None), ListReconcile::Idle);
    }

    #[test]
    fn restored_ignores_blank_ids() {
        assert_eq!(Selection::restored(Some("  ".to_string())).selected(), None);
        assert_eq!(
            Selection::restored(Some("ci-1".to_string())).selected(),
            Some("ci-1")
        );
    }
}
