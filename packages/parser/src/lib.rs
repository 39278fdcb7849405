//! # Marker Parser
//!
//! Markup front end for the Marker editor: raw text in, identity-stamped
//! working tree out, and back again.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ tokenizer: text → tokens (two lexing contexts)│
//! └───────────────────────────────────────────────┘
//!                      ↓
//! ┌───────────────────────────────────────────────┐
//! │ parser: tokens → ElementNode tree             │
//! └───────────────────────────────────────────────┘
//!                      ↓
//! ┌───────────────────────────────────────────────┐
//! │ identity: stamp tokens + internal ids         │
//! └───────────────────────────────────────────────┘
//!                      ↓
//! ┌───────────────────────────────────────────────┐
//! │ serializer: tree → text (uuid kept or not)    │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! Identity tokens live out of band: `parse` consumes `data-uuid` markers
//! into `NodeId` fields and `serialize` only writes them back when asked,
//! so exported markup never carries editor residue.

pub mod ast;
pub mod error;
pub mod identity;
pub mod parser;
pub mod serializer;
pub mod tokenizer;

pub use ast::{
    Attribute, AttributeList, Document, ElementKind, ElementNode, HierarchyNode, NodeId,
};
pub use error::{ParseDiagnostic, ParseError, ParseResult};
pub use identity::{IdentityAssigner, UUID_ATTR};
pub use parser::{parse, ParseOutcome, Parser};
pub use serializer::{serialize, SerializeOptions, Serializer};
