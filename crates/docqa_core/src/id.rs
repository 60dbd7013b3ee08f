//! crates/docqa_core/src/id.rs
//!
//! Opaque string identifiers for documents and Q&A records. The prefixed
//! flavors embed an entity tag so ids stay readable while debugging.

use uuid::Uuid;

/// A fresh opaque identifier.
pub fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A document identifier, e.g. `doc_4f1c...`.
pub fn doc_id() -> String {
    format!("doc_{}", new_id())
}

/// A Q&A record identifier, e.g. `qa_9ab2...`.
pub fn qa_id() -> String {
    format!("qa_{}", new_id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn prefixed_ids_carry_their_tag() {
        assert!(doc_id().starts_with("doc_"));
        assert!(qa_id().starts_with("qa_"));
    }

    #[test]
    fn ids_are_unique_across_many_draws() {
        let ids: HashSet<String> = (0..2000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 2000);
    }
}
