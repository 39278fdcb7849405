//! # Marker Editor
//!
//! Document-identity and edit-transaction core for the Marker
//! vector-graphics editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: markup → identity-stamped tree      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ store: document, raw mirror, hierarchy,     │
//! │        selection, hover — observable fields │
//! │ registry: token → live node, per generation │
//! └─────────────────────────────────────────────┘
//!                     ↑
//! ┌─────────────────────────────────────────────┐
//! │ gesture: live preview → one operation       │
//! │ history: linear undo/redo over operations   │
//! │ selection: id-addressed set mutation        │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core principles
//!
//! 1. **The tree is the source of truth**: hierarchy and registry are
//!    derived, rebuilt wholesale on every accepted document.
//! 2. **Identity is out of band**: views address elements through stable
//!    tokens that survive internal round trips and never reach exports.
//! 3. **Gestures commit once**: per-frame preview mutation is cheap and
//!    unobserved; release produces one operation and one new generation.
//! 4. **Operations are data**: forward and backward are pure functions of
//!    the variant fields plus the current document.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use marker_editor::{EditorSession, Point};
//!
//! let mut session = EditorSession::new();
//! session.open(r#"<svg><rect id="a" x="1" y="2"/></svg>"#)?;
//!
//! session.pointer_down("a", Point::new(0.0, 0.0))?;
//! session.pointer_move(Point::new(50.0, 30.0));
//! session.pointer_up()?;          // one history entry
//! session.undo()?;                // rect back at (1, 2)
//!
//! let markup = session.export();  // no identity markers
//! ```

mod commit;
mod geom;
mod gesture;
mod history;
mod ops;
mod registry;
mod selection;
mod session;
mod store;
mod validate;

pub use commit::replace_document;
pub use gesture::{GestureEngine, GestureOutcome, Point, DRAG_EPSILON};
pub use history::HistoryManager;
pub use ops::{Operation, OperationKind, ReplayError};
pub use registry::ElementRegistry;
pub use selection::{SelectionManager, SelectionSyncHooks};
pub use session::{EditorSession, SessionError};
pub use store::{DocumentStore, StoreEvent, StoreField, SubscriptionId};
pub use validate::{validate_attribute, AttributeValidationError};

// Re-export the parser-side types sessions hand around
pub use marker_parser::ast::{Document, ElementKind, ElementNode, HierarchyNode, NodeId};
