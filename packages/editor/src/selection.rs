//! # Selection Manager
//!
//! Owns mutation of the selection set. Callers address elements by id
//! (internal or author-visible); resolution to identity tokens happens
//! here, so no view ever handles tokens directly. Unknown ids are skipped
//! per-id rather than failing the call.

use crate::store::DocumentStore;
use marker_parser::ast::NodeId;

/// Side-channel hooks views may install, with no dependency from the
/// manager on any view type.
#[derive(Default)]
pub struct SelectionSyncHooks {
    /// Fired after every selection mutation with the post-change set
    pub on_selection_changed: Option<Box<dyn FnMut(&[NodeId])>>,
    /// Fired for the most recently added element, e.g. to scroll a tree
    /// view row into sight
    pub scroll_into_view: Option<Box<dyn FnMut(NodeId)>>,
}

pub struct SelectionManager {
    store: DocumentStore,
    hooks: SelectionSyncHooks,
}

impl SelectionManager {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store,
            hooks: SelectionSyncHooks::default(),
        }
    }

    pub fn register_sync_callbacks(&mut self, hooks: SelectionSyncHooks) {
        self.hooks = hooks;
    }

    /// Replaces the selection with the resolvable subset of `ids`
    pub fn select<S: AsRef<str>>(&mut self, ids: &[S]) {
        let tokens = self.resolve(ids);
        let focus = tokens.last().copied();
        self.store.set_selection(tokens);
        self.after_change(focus);
    }

    /// Adds `ids` to the selection, keeping existing order
    pub fn add_to_selection<S: AsRef<str>>(&mut self, ids: &[S]) {
        let mut tokens = self.store.selected_tokens();
        let mut focus = None;
        for token in self.resolve(ids) {
            if !tokens.contains(&token) {
                tokens.push(token);
                focus = Some(token);
            }
        }
        self.store.set_selection(tokens);
        self.after_change(focus);
    }

    pub fn remove_from_selection<S: AsRef<str>>(&mut self, ids: &[S]) {
        let drop = self.resolve(ids);
        let tokens: Vec<NodeId> = self
            .store
            .selected_tokens()
            .into_iter()
            .filter(|token| !drop.contains(token))
            .collect();
        self.store.set_selection(tokens);
        self.after_change(None);
    }

    /// Flips membership of a single element
    pub fn toggle_selection(&mut self, id: &str) {
        let Some(token) = self.store.resolve_id(id) else {
            return;
        };
        let mut tokens = self.store.selected_tokens();
        let mut focus = None;
        if let Some(index) = tokens.iter().position(|t| *t == token) {
            tokens.remove(index);
        } else {
            tokens.push(token);
            focus = Some(token);
        }
        self.store.set_selection(tokens);
        self.after_change(focus);
    }

    pub fn clear_selection(&mut self) {
        self.store.set_selection(Vec::new());
        self.after_change(None);
    }

    /// Internal ids of the selected elements, in selection order
    pub fn selected_ids(&self) -> Vec<String> {
        self.store
            .selected_tokens()
            .into_iter()
            .filter_map(|token| self.store.id_of(token))
            .collect()
    }

    pub fn selected_tokens(&self) -> Vec<NodeId> {
        self.store.selected_tokens()
    }

    pub fn has_selection(&self) -> bool {
        self.store.has_selection()
    }

    pub fn selection_count(&self) -> usize {
        self.store.selection_count()
    }

    fn resolve<S: AsRef<str>>(&self, ids: &[S]) -> Vec<NodeId> {
        ids.iter()
            .filter_map(|id| self.store.resolve_id(id.as_ref()))
            .collect()
    }

    fn after_change(&mut self, focus: Option<NodeId>) {
        let selected = self.store.selected_tokens();
        if let Some(callback) = &mut self.hooks.on_selection_changed {
            callback(&selected);
        }
        if let (Some(token), Some(callback)) = (focus, &mut self.hooks.scroll_into_view) {
            if selected.contains(&token) {
                callback(token);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_parser::parse;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manager_with(source: &str) -> SelectionManager {
        let store = DocumentStore::new();
        let outcome = parse(source);
        store.set_document(
            outcome.document.unwrap(),
            outcome.hierarchy.unwrap(),
            source.to_string(),
        );
        SelectionManager::new(store)
    }

    #[test]
    fn test_select_by_author_id() {
        let mut selection = manager_with(r#"<svg><rect id="a"/></svg>"#);
        selection.select(&["a"]);
        assert!(selection.has_selection());
        assert_eq!(selection.selected_ids(), vec!["rect-1"]);
    }

    #[test]
    fn test_toggle_empties_a_single_selection() {
        let mut selection = manager_with(r#"<svg><rect id="a"/></svg>"#);
        selection.select(&["a"]);
        selection.toggle_selection("a");
        assert!(!selection.has_selection());
        assert_eq!(selection.selection_count(), 0);
    }

    #[test]
    fn test_unknown_ids_are_skipped_per_id() {
        let mut selection = manager_with("<svg><rect/><circle/></svg>");
        selection.select(&["rect-1", "ghost", "circle-1"]);
        assert_eq!(selection.selection_count(), 2);

        selection.remove_from_selection(&["ghost", "rect-1"]);
        assert_eq!(selection.selected_ids(), vec!["circle-1"]);
    }

    #[test]
    fn test_add_keeps_existing_order_and_dedupes() {
        let mut selection = manager_with("<svg><rect/><circle/><line/></svg>");
        selection.select(&["circle-1"]);
        selection.add_to_selection(&["rect-1", "circle-1"]);
        assert_eq!(selection.selected_ids(), vec!["circle-1", "rect-1"]);
    }

    #[test]
    fn test_clear_selection() {
        let mut selection = manager_with("<svg><rect/></svg>");
        selection.select(&["rect-1"]);
        selection.clear_selection();
        assert!(!selection.has_selection());
    }

    #[test]
    fn test_sync_hooks_observe_changes() {
        let mut selection = manager_with("<svg><rect/></svg>");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let scrolled = Rc::new(RefCell::new(Vec::new()));

        selection.register_sync_callbacks(SelectionSyncHooks {
            on_selection_changed: Some(Box::new({
                let seen = Rc::clone(&seen);
                move |tokens: &[NodeId]| seen.borrow_mut().push(tokens.len())
            })),
            scroll_into_view: Some(Box::new({
                let scrolled = Rc::clone(&scrolled);
                move |token| scrolled.borrow_mut().push(token)
            })),
        });

        selection.select(&["rect-1"]);
        selection.clear_selection();

        assert_eq!(*seen.borrow(), vec![1, 0]);
        assert_eq!(scrolled.borrow().len(), 1);
    }
}
