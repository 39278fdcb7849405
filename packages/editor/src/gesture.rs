//! # Gesture Engine
//!
//! Turns continuous pointer interactions into single committed
//! operations.
//!
//! A drag moves through `Idle → Armed → Live`, mutating geometry directly
//! in the live tree on every pointer frame with no notifications and no
//! history. On release the live mutations are rolled back from pre-gesture
//! snapshots, one Move operation re-applies the total displacement, and a
//! single serialize→reparse→replace cycle produces the next document
//! generation. Displacement inside a 0.01-unit epsilon is sub-pixel
//! jitter and commits nothing.
//!
//! Primitive drawing follows the same two-phase protocol with a
//! reduced-opacity preview element that lives outside the document until
//! release.

use crate::commit::replace_document;
use crate::geom::{self, format_number};
use crate::history::HistoryManager;
use crate::ops::{Operation, OperationKind, ReplayError};
use crate::store::DocumentStore;
use marker_parser::ast::{AttributeList, ElementKind, ElementNode, NodeId};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Total displacement below this is treated as a plain click
pub const DRAG_EPSILON: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// What a finished pointer interaction amounted to
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// No gesture was active
    Idle,
    /// Press and release without meaningful displacement
    Click { target: NodeId },
    /// A committed move, already pushed to history
    Moved {
        tokens: Vec<NodeId>,
        dx: f64,
        dy: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragPhase {
    Idle,
    Armed,
    Live,
}

struct NodeSnapshot {
    token: NodeId,
    attributes: AttributeList,
}

struct DrawState {
    anchor: Point,
    element: ElementNode,
}

pub struct GestureEngine {
    phase: DragPhase,
    last: Point,
    total_dx: f64,
    total_dy: f64,
    targets: Vec<NodeId>,
    saved_selection: Vec<NodeId>,
    snapshots: Vec<NodeSnapshot>,
    draw: Option<DrawState>,
}

impl GestureEngine {
    pub fn new() -> Self {
        Self {
            phase: DragPhase::Idle,
            last: Point::default(),
            total_dx: 0.0,
            total_dy: 0.0,
            targets: Vec::new(),
            saved_selection: Vec::new(),
            snapshots: Vec::new(),
            draw: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.phase != DragPhase::Idle
    }

    // ---- drag-to-move -----------------------------------------------------

    /// Arms a drag on a selectable target. The moving set is the whole
    /// current selection when the target is already part of it, otherwise
    /// just the target. No mutation happens yet.
    pub fn pointer_down(&mut self, store: &DocumentStore, target: NodeId, at: Point) {
        if self.phase != DragPhase::Idle {
            return;
        }
        if !store.with_registry(|registry| registry.contains(target)) {
            return;
        }

        let selection = store.selected_tokens();
        self.targets = if selection.contains(&target) {
            selection.clone()
        } else {
            vec![target]
        };
        self.saved_selection = selection;
        self.last = at;
        self.total_dx = 0.0;
        self.total_dy = 0.0;
        self.phase = DragPhase::Armed;
    }

    /// Applies the incremental delta since the previous frame directly to
    /// the live tree. The first move takes the pre-gesture snapshots and
    /// transitions to Live.
    pub fn pointer_move(&mut self, store: &DocumentStore, at: Point) {
        match self.phase {
            DragPhase::Idle => return,
            DragPhase::Armed => {
                self.take_snapshots(store);
                self.phase = DragPhase::Live;
            }
            DragPhase::Live => {}
        }

        let dx = at.x - self.last.x;
        let dy = at.y - self.last.y;
        let targets = self.targets.clone();
        store.with_document_mut(|document| {
            for token in &targets {
                if let Some(node) = document.find_by_token_mut(*token) {
                    geom::translate_element(node, dx, dy);
                }
            }
        });
        self.total_dx += dx;
        self.total_dy += dy;
        self.last = at;
    }

    /// Finishes the drag. Meaningful displacement commits exactly one
    /// Move operation and one document generation; anything less reverts
    /// to byte-identical pre-gesture geometry and reports a click.
    pub fn pointer_up(
        &mut self,
        store: &DocumentStore,
        history: &mut HistoryManager,
    ) -> Result<GestureOutcome, ReplayError> {
        let result = self.finish_drag(store, history);
        self.reset_drag();
        result
    }

    /// Abandons a live drag, reverting all per-frame mutations
    pub fn cancel(&mut self, store: &DocumentStore) {
        if self.phase == DragPhase::Live {
            self.restore_snapshots(store);
        }
        self.reset_drag();
    }

    fn finish_drag(
        &mut self,
        store: &DocumentStore,
        history: &mut HistoryManager,
    ) -> Result<GestureOutcome, ReplayError> {
        match self.phase {
            DragPhase::Idle => Ok(GestureOutcome::Idle),
            DragPhase::Armed => Ok(self.click_outcome()),
            DragPhase::Live => {
                let (dx, dy) = (self.total_dx, self.total_dy);
                self.restore_snapshots(store);

                if (dx * dx + dy * dy).sqrt() < DRAG_EPSILON {
                    return Ok(self.click_outcome());
                }

                let tokens = self.targets.clone();
                let label = if tokens.len() == 1 {
                    "Move element".to_string()
                } else {
                    format!("Move {} elements", tokens.len())
                };
                let operation = Operation::new(
                    label,
                    OperationKind::Move {
                        tokens: tokens.clone(),
                        dx,
                        dy,
                    },
                );

                let mut document = store.document_clone().ok_or(ReplayError::NoDocument)?;
                operation.apply_forward(&mut document)?;
                history.push(operation);
                replace_document(store, document)?;
                store.set_selection(self.saved_selection.clone());

                debug!(count = tokens.len(), dx, dy, "drag committed");
                Ok(GestureOutcome::Moved { tokens, dx, dy })
            }
        }
    }

    fn click_outcome(&self) -> GestureOutcome {
        match self.targets.first() {
            Some(target) => GestureOutcome::Click { target: *target },
            None => GestureOutcome::Idle,
        }
    }

    fn take_snapshots(&mut self, store: &DocumentStore) {
        let targets = self.targets.clone();
        self.snapshots = store
            .with_document(|document| {
                targets
                    .iter()
                    .filter_map(|token| {
                        document.find_by_token(*token).map(|node| NodeSnapshot {
                            token: *token,
                            attributes: node.attributes.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
    }

    /// Restores the exact pre-gesture attribute text, so a reverted drag
    /// leaves the document byte-identical.
    fn restore_snapshots(&mut self, store: &DocumentStore) {
        let snapshots = std::mem::take(&mut self.snapshots);
        store.with_document_mut(|document| {
            for snapshot in &snapshots {
                if let Some(node) = document.find_by_token_mut(snapshot.token) {
                    node.attributes = snapshot.attributes.clone();
                }
            }
        });
    }

    fn reset_drag(&mut self) {
        self.phase = DragPhase::Idle;
        self.targets.clear();
        self.saved_selection.clear();
        self.snapshots.clear();
        self.total_dx = 0.0;
        self.total_dy = 0.0;
    }

    // ---- primitive drawing ------------------------------------------------

    /// Starts drawing a new primitive anchored at `at`. The preview
    /// element stays outside the document until release.
    pub fn begin_draw(&mut self, kind: ElementKind, at: Point) {
        let mut element = ElementNode::new(kind.tag());
        shape_geometry(&mut element, at, at);
        element.attributes.set("opacity", "0.5");
        self.draw = Some(DrawState { anchor: at, element });
    }

    /// Recomputes the preview geometry from the anchor to `at`
    pub fn update_draw(&mut self, at: Point) {
        if let Some(draw) = &mut self.draw {
            shape_geometry(&mut draw.element, draw.anchor, at);
        }
    }

    /// The in-flight preview element, for overlay rendering
    pub fn preview(&self) -> Option<&ElementNode> {
        self.draw.as_ref().map(|draw| &draw.element)
    }

    pub fn cancel_draw(&mut self) {
        self.draw = None;
    }

    /// Realizes the drawn element: appends it to the root, pushes one
    /// Create operation, and selects it once the replacement has
    /// propagated. A degenerate drag draws nothing.
    pub fn finish_draw(
        &mut self,
        store: &DocumentStore,
        history: &mut HistoryManager,
        at: Point,
    ) -> Result<Option<NodeId>, ReplayError> {
        let Some(mut draw) = self.draw.take() else {
            return Ok(None);
        };
        shape_geometry(&mut draw.element, draw.anchor, at);

        let dx = at.x - draw.anchor.x;
        let dy = at.y - draw.anchor.y;
        if (dx * dx + dy * dy).sqrt() < DRAG_EPSILON {
            return Ok(None);
        }

        let mut element = draw.element;
        element.attributes.remove("opacity");
        let token = element.token;
        let label = format!("Create {}", element.tag_name);

        let mut document = store.document_clone().ok_or(ReplayError::NoDocument)?;
        let parent = document.root.token;
        let index = document.root.children.len();
        let operation = Operation::new(
            label,
            OperationKind::CreateElement {
                parent,
                index,
                fragment: element,
            },
        );

        operation.apply_forward(&mut document)?;
        history.push(operation);
        replace_document(store, document)?;
        store.set_selection(vec![token]);

        debug!(%token, "draw committed");
        Ok(Some(token))
    }
}

impl Default for GestureEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Writes the geometry attributes a drag from `a` to `b` implies
fn shape_geometry(element: &mut ElementNode, a: Point, b: Point) {
    let attrs = &mut element.attributes;
    match element.kind {
        ElementKind::Rect => {
            attrs.set("x", format_number(a.x.min(b.x)));
            attrs.set("y", format_number(a.y.min(b.y)));
            attrs.set("width", format_number((b.x - a.x).abs()));
            attrs.set("height", format_number((b.y - a.y).abs()));
        }
        ElementKind::Circle => {
            attrs.set("cx", format_number((a.x + b.x) / 2.0));
            attrs.set("cy", format_number((a.y + b.y) / 2.0));
            let r = (b.x - a.x).abs().max((b.y - a.y).abs()) / 2.0;
            attrs.set("r", format_number(r));
        }
        ElementKind::Ellipse => {
            attrs.set("cx", format_number((a.x + b.x) / 2.0));
            attrs.set("cy", format_number((a.y + b.y) / 2.0));
            attrs.set("rx", format_number((b.x - a.x).abs() / 2.0));
            attrs.set("ry", format_number((b.y - a.y).abs() / 2.0));
        }
        ElementKind::Line => {
            attrs.set("x1", format_number(a.x));
            attrs.set("y1", format_number(a.y));
            attrs.set("x2", format_number(b.x));
            attrs.set("y2", format_number(b.y));
        }
        ElementKind::Text => {
            attrs.set("x", format_number(a.x));
            attrs.set("y", format_number(a.y));
            if element.text.is_none() {
                element.text = Some("Text".to_string());
            }
        }
        ElementKind::Group | ElementKind::Other => {}
    }
}
