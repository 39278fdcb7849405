//! # Editor Session
//!
//! The application context. Owns the store, selection manager, history
//! manager, and gesture engine as explicitly constructed service objects,
//! so multiple documents and test runs can coexist without ambient state.
//! External views hold the store handle for reading and call through the
//! session for every mutation.

use crate::gesture::{GestureEngine, GestureOutcome, Point};
use crate::history::HistoryManager;
use crate::commit::replace_document;
use crate::ops::{Operation, OperationKind, ReplayError};
use crate::selection::SelectionManager;
use crate::store::DocumentStore;
use crate::validate::{validate_attribute, AttributeValidationError};
use marker_parser::ast::ElementKind;
use marker_parser::{parse, serialize, ParseDiagnostic, SerializeOptions};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("the markup could not be parsed ({} error{})", .0.len(), if .0.len() == 1 { "" } else { "s" })]
    Parse(Vec<ParseDiagnostic>),

    #[error(transparent)]
    Validation(#[from] AttributeValidationError),

    #[error(transparent)]
    Replay(#[from] ReplayError),

    #[error("no document is open")]
    NoDocument,

    #[error("no element with id {0:?}")]
    UnknownElement(String),
}

pub struct EditorSession {
    store: DocumentStore,
    selection: SelectionManager,
    history: HistoryManager,
    gesture: GestureEngine,
}

impl EditorSession {
    pub fn new() -> Self {
        let store = DocumentStore::new();
        Self {
            selection: SelectionManager::new(store.clone()),
            history: HistoryManager::new(),
            gesture: GestureEngine::new(),
            store,
        }
    }

    // ---- service access ---------------------------------------------------

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    pub fn selection(&self) -> &SelectionManager {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionManager {
        &mut self.selection
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    // ---- document lifecycle -----------------------------------------------

    /// Loads markup as the new document. On failure the previously
    /// accepted document stays untouched and the diagnostics come back.
    pub fn open(&mut self, markup: &str) -> Result<(), SessionError> {
        let outcome = parse(markup);
        match (outcome.success, outcome.document, outcome.hierarchy) {
            (true, Some(document), Some(hierarchy)) => {
                self.reset_services();
                info!(elements = document.element_count(), "document opened");
                self.store
                    .set_document(document, hierarchy, markup.to_string());
                Ok(())
            }
            _ => Err(SessionError::Parse(outcome.errors)),
        }
    }

    /// Starts a fresh document with an empty canvas of the given size
    pub fn new_document(&mut self, width: f64, height: f64) -> Result<(), SessionError> {
        let markup = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}"></svg>"#,
            width, height
        );
        self.open(&markup)
    }

    /// Closes the document and fully resets every service
    pub fn close(&mut self) {
        self.store.clear_document();
        self.reset_services();
        info!("document closed");
    }

    fn reset_services(&mut self) {
        self.history = HistoryManager::new();
        self.gesture = GestureEngine::new();
        self.selection = SelectionManager::new(self.store.clone());
    }

    // ---- raw-text editing -------------------------------------------------

    /// Applies an edited raw-markup buffer. Invalid text is rejected with
    /// diagnostics while the last valid document and mirror stay in
    /// place.
    pub fn apply_raw_edit(&mut self, markup: &str) -> Result<(), SessionError> {
        let outcome = parse(markup);
        match (outcome.success, outcome.document, outcome.hierarchy) {
            (true, Some(document), Some(hierarchy)) => {
                self.store
                    .set_document(document, hierarchy, markup.to_string());
                Ok(())
            }
            _ => Err(SessionError::Parse(outcome.errors)),
        }
    }

    /// Re-announces the retained valid text so an editing view can drop
    /// its invalid buffer. No parse happens.
    pub fn rollback_raw_edit(&mut self) {
        let text = self.store.raw_text();
        self.store.update_raw_text(text);
    }

    /// Export form of the current document, identity markers stripped
    pub fn export(&self) -> Option<String> {
        self.store
            .with_document(|document| serialize(document, SerializeOptions::default()))
    }

    // ---- attribute editing ------------------------------------------------

    /// Validates and applies one attribute edit as a single reversible
    /// operation. `None` removes the attribute.
    pub fn set_attribute(
        &mut self,
        id: &str,
        name: &str,
        value: Option<&str>,
    ) -> Result<(), SessionError> {
        if let Some(value) = value {
            validate_attribute(name, value)?;
        }
        let token = self
            .store
            .resolve_id(id)
            .ok_or_else(|| SessionError::UnknownElement(id.to_string()))?;

        let mut document = self.store.document_clone().ok_or(SessionError::NoDocument)?;
        let old_value = document
            .find_by_token(token)
            .and_then(|node| node.attributes.get(name).map(str::to_string));

        let operation = Operation::new(
            format!("Set {}", name),
            OperationKind::SetAttribute {
                token,
                name: name.to_string(),
                old_value,
                new_value: value.map(str::to_string),
            },
        );
        operation
            .apply_forward(&mut document)
            .map_err(SessionError::Replay)?;
        self.history.push(operation);
        replace_document(&self.store, document)?;
        Ok(())
    }

    // ---- history ----------------------------------------------------------

    pub fn undo(&mut self) -> Result<bool, SessionError> {
        Ok(self.history.undo(&self.store)?)
    }

    pub fn redo(&mut self) -> Result<bool, SessionError> {
        Ok(self.history.redo(&self.store)?)
    }

    // ---- pointer gestures -------------------------------------------------

    /// Pointer press on the element addressed by `id`. An unselected
    /// target becomes the selection before the drag arms.
    pub fn pointer_down(&mut self, id: &str, at: Point) -> Result<(), SessionError> {
        let token = self
            .store
            .resolve_id(id)
            .ok_or_else(|| SessionError::UnknownElement(id.to_string()))?;
        if !self.store.selected_tokens().contains(&token) {
            self.selection.select(&[id]);
        }
        self.gesture.pointer_down(&self.store, token, at);
        Ok(())
    }

    pub fn pointer_move(&mut self, at: Point) {
        self.gesture.pointer_move(&self.store, at);
    }

    pub fn pointer_up(&mut self) -> Result<GestureOutcome, SessionError> {
        Ok(self.gesture.pointer_up(&self.store, &mut self.history)?)
    }

    /// Pointer left the surface mid-gesture
    pub fn cancel_gesture(&mut self) {
        self.gesture.cancel(&self.store);
    }

    // ---- primitive drawing ------------------------------------------------

    pub fn begin_draw(&mut self, kind: ElementKind, at: Point) {
        self.gesture.begin_draw(kind, at);
    }

    pub fn update_draw(&mut self, at: Point) {
        self.gesture.update_draw(at);
    }

    /// The preview element while a draw is in flight
    pub fn draw_preview(&self) -> Option<&marker_parser::ast::ElementNode> {
        self.gesture.preview()
    }

    /// Finishes a draw, returning the new element's internal id
    pub fn finish_draw(&mut self, at: Point) -> Result<Option<String>, SessionError> {
        let token = self
            .gesture
            .finish_draw(&self.store, &mut self.history, at)?;
        Ok(token.and_then(|token| self.store.id_of(token)))
    }

    pub fn cancel_draw(&mut self) {
        self.gesture.cancel_draw();
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}
