//! # Document Store
//!
//! Reactive container for the open document and everything views observe
//! about it: the working tree, its raw-text mirror, the display hierarchy,
//! the selection set, and the hover token.
//!
//! Subscribers register interest per field, so a text-only update never
//! forces a canvas re-render and a selection-only change never forces a
//! hierarchy re-render. Notifications are synchronous and delivered in
//! subscription order once the state swap is complete. A subscriber that
//! mutates the store from inside its callback does not re-enter: the
//! update is queued and drained after the active notification cycle.

use crate::registry::ElementRegistry;
use marker_parser::ast::{Document, ElementNode, HierarchyNode, NodeId};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::debug;

/// Independently observable store fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreField {
    Document,
    RawText,
    Hierarchy,
    Selection,
    Hover,
}

/// Change notification payloads
#[derive(Debug, Clone)]
pub enum StoreEvent {
    DocumentReplaced { generation: u64 },
    DocumentCleared,
    RawTextChanged { text: String },
    HierarchyChanged,
    SelectionChanged { selected: Vec<NodeId> },
    HoverChanged { hovered: Option<NodeId> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    field: StoreField,
    callback: Box<dyn FnMut(&StoreEvent)>,
}

enum StoreUpdate {
    Replace {
        document: Document,
        hierarchy: HierarchyNode,
        raw_text: String,
    },
    RawText(String),
    Selection(Vec<NodeId>),
    Hover(Option<NodeId>),
    Clear,
}

#[derive(Default)]
struct StoreState {
    document: Option<Document>,
    hierarchy: Option<HierarchyNode>,
    raw_text: String,
    selection: Vec<NodeId>,
    hovered: Option<NodeId>,
    registry: ElementRegistry,
    generation: u64,
    subscribers: Vec<Subscriber>,
    removed: Vec<SubscriptionId>,
    next_subscription: u64,
}

/// Cloneable handle to the single-threaded document store
#[derive(Clone)]
pub struct DocumentStore {
    state: Rc<RefCell<StoreState>>,
    pending: Rc<RefCell<VecDeque<StoreUpdate>>>,
    notifying: Rc<Cell<bool>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(StoreState::default())),
            pending: Rc::new(RefCell::new(VecDeque::new())),
            notifying: Rc::new(Cell::new(false)),
        }
    }

    // ---- subscriptions ----------------------------------------------------

    pub fn subscribe(
        &self,
        field: StoreField,
        callback: impl FnMut(&StoreEvent) + 'static,
    ) -> SubscriptionId {
        let mut state = self.state.borrow_mut();
        state.next_subscription += 1;
        let id = SubscriptionId(state.next_subscription);
        state.subscribers.push(Subscriber {
            id,
            field,
            callback: Box::new(callback),
        });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = self.state.borrow_mut();
        if self.notifying.get() {
            state.removed.push(id);
        }
        state.subscribers.retain(|s| s.id != id);
    }

    // ---- mutations --------------------------------------------------------

    /// Atomically replaces document, hierarchy, and raw mirror in one
    /// notification cycle. The selection set is intersected against the
    /// tokens present in the new registry; stale entries are dropped
    /// silently.
    pub fn set_document(&self, document: Document, hierarchy: HierarchyNode, raw_text: String) {
        self.enqueue(StoreUpdate::Replace {
            document,
            hierarchy,
            raw_text,
        });
    }

    /// Updates only the text mirror, leaving structure alone. Used for
    /// non-structural serialization changes.
    pub fn update_raw_text(&self, text: impl Into<String>) {
        self.enqueue(StoreUpdate::RawText(text.into()));
    }

    /// Resets every field to its initial state
    pub fn clear_document(&self) {
        self.enqueue(StoreUpdate::Clear);
    }

    /// Replaces the selection set. Tokens absent from the registry are
    /// dropped; no notification fires when the set is unchanged.
    pub fn set_selection(&self, tokens: Vec<NodeId>) {
        self.enqueue(StoreUpdate::Selection(tokens));
    }

    pub fn set_hovered(&self, hovered: Option<NodeId>) {
        self.enqueue(StoreUpdate::Hover(hovered));
    }

    // ---- observable fields ------------------------------------------------

    pub fn has_document(&self) -> bool {
        self.state.borrow().document.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    pub fn raw_text(&self) -> String {
        self.state.borrow().raw_text.clone()
    }

    pub fn hierarchy(&self) -> Option<HierarchyNode> {
        self.state.borrow().hierarchy.clone()
    }

    pub fn selected_tokens(&self) -> Vec<NodeId> {
        self.state.borrow().selection.clone()
    }

    /// Clones of the currently selected elements, in selection order
    pub fn selected_elements(&self) -> Vec<ElementNode> {
        let state = self.state.borrow();
        let Some(document) = &state.document else {
            return Vec::new();
        };
        state
            .selection
            .iter()
            .filter_map(|token| state.registry.element(document, *token))
            .cloned()
            .collect()
    }

    pub fn has_selection(&self) -> bool {
        !self.state.borrow().selection.is_empty()
    }

    pub fn selection_count(&self) -> usize {
        self.state.borrow().selection.len()
    }

    pub fn hovered(&self) -> Option<NodeId> {
        self.state.borrow().hovered
    }

    // ---- scoped access ----------------------------------------------------

    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> Option<R> {
        self.state.borrow().document.as_ref().map(f)
    }

    /// Direct mutable access to the live tree, bypassing notifications and
    /// the registry. This is the gesture preview path: geometry changes
    /// per pointer frame, structure never does, and a full replacement
    /// follows at commit time.
    pub fn with_document_mut<R>(&self, f: impl FnOnce(&mut Document) -> R) -> Option<R> {
        self.state.borrow_mut().document.as_mut().map(f)
    }

    pub fn with_registry<R>(&self, f: impl FnOnce(&ElementRegistry) -> R) -> R {
        f(&self.state.borrow().registry)
    }

    pub fn resolve_id(&self, id: &str) -> Option<NodeId> {
        self.state.borrow().registry.resolve_id(id)
    }

    /// Internal id of the element holding `token`, if it is alive
    pub fn id_of(&self, token: NodeId) -> Option<String> {
        let state = self.state.borrow();
        let document = state.document.as_ref()?;
        state
            .registry
            .element(document, token)
            .map(|node| node.internal_id.clone())
    }

    pub fn document_clone(&self) -> Option<Document> {
        self.state.borrow().document.clone()
    }

    // ---- update machinery -------------------------------------------------

    fn enqueue(&self, update: StoreUpdate) {
        self.pending.borrow_mut().push_back(update);
        self.pump();
    }

    /// Drains queued updates unless a notification cycle is already
    /// running, in which case that cycle's drain loop picks them up.
    fn pump(&self) {
        if self.notifying.get() {
            return;
        }
        self.notifying.set(true);
        loop {
            let update = self.pending.borrow_mut().pop_front();
            let Some(update) = update else {
                break;
            };
            self.apply(update);
        }
        self.notifying.set(false);
    }

    fn apply(&self, update: StoreUpdate) {
        match update {
            StoreUpdate::Replace {
                mut document,
                hierarchy,
                raw_text,
            } => {
                let (generation, selection_changed, selected) = {
                    let mut state = self.state.borrow_mut();
                    state.generation += 1;
                    document.generation = state.generation;

                    let registry = ElementRegistry::build(&document.root);
                    let before = state.selection.len();
                    state.selection.retain(|token| registry.contains(*token));
                    let selection_changed = state.selection.len() != before;

                    debug!(
                        generation = state.generation,
                        elements = registry.len(),
                        "document replaced"
                    );

                    state.registry = registry;
                    state.document = Some(document);
                    state.hierarchy = Some(hierarchy);
                    state.raw_text = raw_text;
                    (state.generation, selection_changed, state.selection.clone())
                };

                self.notify(StoreField::Document, &StoreEvent::DocumentReplaced { generation });
                self.notify(StoreField::Hierarchy, &StoreEvent::HierarchyChanged);
                let text = self.raw_text();
                self.notify(StoreField::RawText, &StoreEvent::RawTextChanged { text });
                if selection_changed {
                    self.notify(StoreField::Selection, &StoreEvent::SelectionChanged { selected });
                }
            }

            StoreUpdate::RawText(text) => {
                self.state.borrow_mut().raw_text = text.clone();
                self.notify(StoreField::RawText, &StoreEvent::RawTextChanged { text });
            }

            StoreUpdate::Selection(tokens) => {
                let changed = {
                    let mut state = self.state.borrow_mut();
                    let mut next: Vec<NodeId> = Vec::with_capacity(tokens.len());
                    for token in tokens {
                        if state.registry.contains(token) && !next.contains(&token) {
                            next.push(token);
                        }
                    }
                    if next == state.selection {
                        None
                    } else {
                        state.selection = next.clone();
                        Some(next)
                    }
                };
                if let Some(selected) = changed {
                    self.notify(StoreField::Selection, &StoreEvent::SelectionChanged { selected });
                }
            }

            StoreUpdate::Hover(hovered) => {
                let changed = {
                    let mut state = self.state.borrow_mut();
                    if state.hovered == hovered {
                        false
                    } else {
                        state.hovered = hovered;
                        true
                    }
                };
                if changed {
                    self.notify(StoreField::Hover, &StoreEvent::HoverChanged { hovered });
                }
            }

            StoreUpdate::Clear => {
                let (had_selection, had_hover) = {
                    let mut state = self.state.borrow_mut();
                    let had_selection = !state.selection.is_empty();
                    let had_hover = state.hovered.is_some();
                    state.document = None;
                    state.hierarchy = None;
                    state.raw_text.clear();
                    state.selection.clear();
                    state.hovered = None;
                    state.registry = ElementRegistry::default();
                    (had_selection, had_hover)
                };

                self.notify(StoreField::Document, &StoreEvent::DocumentCleared);
                self.notify(StoreField::Hierarchy, &StoreEvent::HierarchyChanged);
                self.notify(
                    StoreField::RawText,
                    &StoreEvent::RawTextChanged { text: String::new() },
                );
                if had_selection {
                    self.notify(
                        StoreField::Selection,
                        &StoreEvent::SelectionChanged { selected: Vec::new() },
                    );
                }
                if had_hover {
                    self.notify(StoreField::Hover, &StoreEvent::HoverChanged { hovered: None });
                }
            }
        }
    }

    /// Runs matching callbacks in subscription order. The subscriber list
    /// is parked outside the state cell while callbacks run, so callbacks
    /// may subscribe and unsubscribe freely.
    fn notify(&self, field: StoreField, event: &StoreEvent) {
        let mut active = std::mem::take(&mut self.state.borrow_mut().subscribers);
        for subscriber in active.iter_mut() {
            if subscriber.field != field {
                continue;
            }
            let dead = self.state.borrow().removed.contains(&subscriber.id);
            if !dead {
                (subscriber.callback)(event);
            }
        }

        let mut state = self.state.borrow_mut();
        let added = std::mem::take(&mut state.subscribers);
        active.extend(added);
        let removed = std::mem::take(&mut state.removed);
        if !removed.is_empty() {
            active.retain(|s| !removed.contains(&s.id));
        }
        state.subscribers = active;
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_parser::parse;
    use std::rc::Rc;

    fn parsed(source: &str) -> (Document, HierarchyNode, String) {
        let outcome = parse(source);
        (
            outcome.document.unwrap(),
            outcome.hierarchy.unwrap(),
            source.to_string(),
        )
    }

    fn store_with(source: &str) -> DocumentStore {
        let store = DocumentStore::new();
        let (doc, tree, raw) = parsed(source);
        store.set_document(doc, tree, raw);
        store
    }

    #[test]
    fn test_set_document_notifies_each_field_once() {
        let store = DocumentStore::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        for (field, name) in [
            (StoreField::Document, "doc"),
            (StoreField::Hierarchy, "tree"),
            (StoreField::RawText, "raw"),
            (StoreField::Selection, "sel"),
        ] {
            let log = Rc::clone(&log);
            store.subscribe(field, move |_| log.borrow_mut().push(name));
        }

        let (doc, tree, raw) = parsed("<svg><rect/></svg>");
        store.set_document(doc, tree, raw);

        // No selection existed, so no selection notification fires
        assert_eq!(*log.borrow(), vec!["doc", "tree", "raw"]);
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn test_update_raw_text_touches_only_the_mirror() {
        let store = store_with("<svg><rect/></svg>");
        let doc_events = Rc::new(Cell::new(0));
        let raw_events = Rc::new(Cell::new(0));

        {
            let n = Rc::clone(&doc_events);
            store.subscribe(StoreField::Document, move |_| n.set(n.get() + 1));
            let n = Rc::clone(&raw_events);
            store.subscribe(StoreField::RawText, move |_| n.set(n.get() + 1));
        }

        store.update_raw_text("<svg/>");
        assert_eq!(doc_events.get(), 0);
        assert_eq!(raw_events.get(), 1);
        assert_eq!(store.raw_text(), "<svg/>");
        // Structure was not re-derived
        assert_eq!(store.generation(), 1);
    }

    #[test]
    fn test_selection_intersected_on_replacement() {
        let store = store_with("<svg><rect/><circle/></svg>");
        let rect = store.resolve_id("rect-1").unwrap();
        let circle = store.resolve_id("circle-1").unwrap();
        store.set_selection(vec![rect, circle]);
        assert_eq!(store.selection_count(), 2);

        // Replace with a document that kept only the rect's token
        let doc = store.document_clone().unwrap();
        let mut root = doc.root.clone();
        root.children.truncate(1);
        let markup = marker_parser::serialize(
            &Document::new(root, ""),
            marker_parser::SerializeOptions { keep_uuid: true },
        );
        let (new_doc, tree, raw) = parsed(&markup);
        store.set_document(new_doc, tree, raw);

        assert_eq!(store.selected_tokens(), vec![rect]);
        assert!(store.with_registry(|r| r.contains(rect)));
        assert!(!store.with_registry(|r| r.contains(circle)));
    }

    #[test]
    fn test_unknown_tokens_never_enter_the_selection() {
        let store = store_with("<svg><rect/></svg>");
        let rect = store.resolve_id("rect-1").unwrap();
        store.set_selection(vec![NodeId::new(), rect, rect]);
        assert_eq!(store.selected_tokens(), vec![rect]);
    }

    #[test]
    fn test_reentrant_set_document_is_queued_not_nested() {
        let store = store_with("<svg><rect/></svg>");
        let seen = Rc::new(RefCell::new(Vec::new()));

        {
            let store_handle = store.clone();
            let seen = Rc::clone(&seen);
            store.subscribe(StoreField::Document, move |event| {
                if let StoreEvent::DocumentReplaced { generation } = event {
                    seen.borrow_mut().push(*generation);
                    if *generation == 2 {
                        let (doc, tree, raw) = parsed("<svg><circle/></svg>");
                        store_handle.set_document(doc, tree, raw);
                    }
                }
            });
        }

        let (doc, tree, raw) = parsed("<svg><g/></svg>");
        store.set_document(doc, tree, raw);

        // The nested replace ran after the first cycle finished
        assert_eq!(*seen.borrow(), vec![2, 3]);
        assert_eq!(store.generation(), 3);
        assert!(store.resolve_id("circle-1").is_some());
    }

    #[test]
    fn test_clear_document_resets_every_field() {
        let store = store_with("<svg><rect/></svg>");
        let rect = store.resolve_id("rect-1").unwrap();
        store.set_selection(vec![rect]);
        store.set_hovered(Some(rect));

        store.clear_document();
        assert!(!store.has_document());
        assert!(store.hierarchy().is_none());
        assert_eq!(store.raw_text(), "");
        assert!(!store.has_selection());
        assert_eq!(store.hovered(), None);
        assert!(store.with_registry(|r| r.is_empty()));
    }

    #[test]
    fn test_hover_notifies_only_on_change() {
        let store = store_with("<svg><rect/></svg>");
        let rect = store.resolve_id("rect-1").unwrap();
        let events = Rc::new(Cell::new(0));
        {
            let n = Rc::clone(&events);
            store.subscribe(StoreField::Hover, move |_| n.set(n.get() + 1));
        }

        store.set_hovered(Some(rect));
        store.set_hovered(Some(rect));
        store.set_hovered(None);
        assert_eq!(events.get(), 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let store = DocumentStore::new();
        let events = Rc::new(Cell::new(0));
        let id = {
            let n = Rc::clone(&events);
            store.subscribe(StoreField::RawText, move |_| n.set(n.get() + 1))
        };

        store.update_raw_text("a");
        store.unsubscribe(id);
        store.update_raw_text("b");
        assert_eq!(events.get(), 1);
    }
}
