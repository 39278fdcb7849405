//! The structural commit path shared by gestures, history replay, and
//! attribute edits: serialize with identity kept, reparse, hand the fresh
//! tree to the store.

use crate::ops::ReplayError;
use crate::store::DocumentStore;
use marker_parser::ast::Document;
use marker_parser::{parse, serialize, SerializeOptions};

/// Round-trips an edited document into the store.
///
/// The tree is serialized with identity markers so tokens survive the
/// reparse, while the raw mirror handed to the store is the clean export
/// form. A reparse failure here means an operation produced a tree the
/// serializer and parser disagree about, which is surfaced, never
/// swallowed.
pub fn replace_document(store: &DocumentStore, document: Document) -> Result<(), ReplayError> {
    let internal = serialize(&document, SerializeOptions { keep_uuid: true });
    let outcome = parse(&internal);

    match (outcome.success, outcome.document, outcome.hierarchy) {
        (true, Some(mut reparsed), Some(hierarchy)) => {
            let raw = serialize(&reparsed, SerializeOptions::default());
            reparsed.raw = raw.clone();
            store.set_document(reparsed, hierarchy, raw);
            Ok(())
        }
        _ => Err(ReplayError::Roundtrip(
            outcome
                .errors
                .iter()
                .map(|e| e.message.clone())
                .collect::<Vec<_>>()
                .join("; "),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_parser::parse;

    #[test]
    fn test_commit_preserves_tokens_and_cleans_the_mirror() {
        let store = DocumentStore::new();
        let document = parse(r#"<svg><rect x="1"/></svg>"#).document.unwrap();
        let rect = document.root.children[0].token;

        replace_document(&store, document).unwrap();

        assert!(store.with_registry(|r| r.contains(rect)));
        assert!(!store.raw_text().contains(marker_parser::UUID_ATTR));
        assert!(store.raw_text().contains("<rect x=\"1\"/>"));
    }
}
