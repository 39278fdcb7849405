//! Reversible edit operations.
//!
//! Operations are plain data: a label for menu display and a tagged
//! variant whose forward and backward applications are pure functions of
//! the variant fields and the current document. That keeps them safe to
//! replay any number of times and trivially serializable for inspection.

use crate::geom;
use marker_parser::ast::{Document, ElementNode, NodeId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure while replaying an operation.
///
/// Replay errors signal a broken reversibility invariant and are always
/// surfaced to the caller; the history cursor does not move past one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReplayError {
    #[error("no document is open")]
    NoDocument,

    #[error("element {0} is no longer present")]
    NodeNotFound(NodeId),

    #[error("parent {0} is no longer present")]
    ParentNotFound(NodeId),

    #[error("document failed to round-trip after replay: {0}")]
    Roundtrip(String),
}

/// One reversible edit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub label: String,
    pub kind: OperationKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OperationKind {
    /// Translate a set of elements by a total displacement
    Move {
        tokens: Vec<NodeId>,
        dx: f64,
        dy: f64,
    },

    /// Insert a fully built fragment under a parent at an index
    CreateElement {
        parent: NodeId,
        index: usize,
        fragment: ElementNode,
    },

    /// Remove a fragment; the stored copy makes the inverse exact
    RemoveElement {
        parent: NodeId,
        index: usize,
        fragment: ElementNode,
    },

    /// Set or clear one attribute, remembering the previous value
    SetAttribute {
        token: NodeId,
        name: String,
        old_value: Option<String>,
        new_value: Option<String>,
    },
}

impl Operation {
    pub fn new(label: impl Into<String>, kind: OperationKind) -> Self {
        Self {
            label: label.into(),
            kind,
        }
    }

    pub fn apply_forward(&self, document: &mut Document) -> Result<(), ReplayError> {
        match &self.kind {
            OperationKind::Move { tokens, dx, dy } => translate_all(document, tokens, *dx, *dy),
            OperationKind::CreateElement {
                parent,
                index,
                fragment,
            } => insert_fragment(document, *parent, *index, fragment),
            OperationKind::RemoveElement {
                parent, fragment, ..
            } => remove_fragment(document, *parent, fragment.token),
            OperationKind::SetAttribute {
                token,
                name,
                new_value,
                ..
            } => set_attribute(document, *token, name, new_value.as_deref()),
        }
    }

    pub fn apply_backward(&self, document: &mut Document) -> Result<(), ReplayError> {
        match &self.kind {
            OperationKind::Move { tokens, dx, dy } => translate_all(document, tokens, -dx, -dy),
            OperationKind::CreateElement {
                parent, fragment, ..
            } => remove_fragment(document, *parent, fragment.token),
            OperationKind::RemoveElement {
                parent,
                index,
                fragment,
            } => insert_fragment(document, *parent, *index, fragment),
            OperationKind::SetAttribute {
                token,
                name,
                old_value,
                ..
            } => set_attribute(document, *token, name, old_value.as_deref()),
        }
    }
}

fn translate_all(
    document: &mut Document,
    tokens: &[NodeId],
    dx: f64,
    dy: f64,
) -> Result<(), ReplayError> {
    for token in tokens {
        let node = document
            .find_by_token_mut(*token)
            .ok_or(ReplayError::NodeNotFound(*token))?;
        geom::translate_element(node, dx, dy);
    }
    Ok(())
}

fn insert_fragment(
    document: &mut Document,
    parent: NodeId,
    index: usize,
    fragment: &ElementNode,
) -> Result<(), ReplayError> {
    let node = document
        .find_by_token_mut(parent)
        .ok_or(ReplayError::ParentNotFound(parent))?;
    let index = index.min(node.children.len());
    node.children.insert(index, fragment.clone());
    Ok(())
}

fn remove_fragment(
    document: &mut Document,
    parent: NodeId,
    token: NodeId,
) -> Result<(), ReplayError> {
    let node = document
        .find_by_token_mut(parent)
        .ok_or(ReplayError::ParentNotFound(parent))?;
    let position = node
        .children
        .iter()
        .position(|child| child.token == token)
        .ok_or(ReplayError::NodeNotFound(token))?;
    node.children.remove(position);
    Ok(())
}

fn set_attribute(
    document: &mut Document,
    token: NodeId,
    name: &str,
    value: Option<&str>,
) -> Result<(), ReplayError> {
    let node = document
        .find_by_token_mut(token)
        .ok_or(ReplayError::NodeNotFound(token))?;
    match value {
        Some(value) => node.attributes.set(name, value),
        None => {
            node.attributes.remove(name);
        }
    }
    Ok(())
}
