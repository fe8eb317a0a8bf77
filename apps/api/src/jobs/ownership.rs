//! Owner field resolution for job documents.
//!
//! The owner of a job was stored under several names over time. Reads accept all of
//! them; writes only ever use `OWNER_FIELD`.

use serde_json::Value;

/// Canonical owner field written on create.
pub const OWNER_FIELD: &str = "ownerId";

/// Older spellings still present on stored records, in lookup order.
pub const LEGACY_OWNER_FIELDS: [&str; 4] = ["uid", "userId", "user_id", "createdBy"];

pub fn owner_fields() -> impl Iterator<Item = &'static str> {
    std::iter::once(OWNER_FIELD).chain(LEGACY_OWNER_FIELDS)
}

/// First non-empty owner id found on the document.
pub fn resolve_owner(doc: &Value) -> Option<&str> {
    owner_fields()
        .filter_map(|field| doc.get(field).and_then(Value::as_str))
        .find(|owner| !owner.is_empty())
}

/// True when any recognised owner field equals `uid`.
pub fn is_owned_by(doc: &Value, uid: &str) -> bool {
    !uid.is_empty()
        && owner_fields().any(|field| doc.get(field).and_then(Value::as_str) == Some(uid))
}

/// SQL condition matching any owner field against bind parameter `$param`.
pub fn sql_predicate(param: usize) -> String {
    let clauses: Vec<String> = owner_fields()
        .map(|field| format!("doc->>'{field}' = ${param}"))
        .collect();
    format!("({})", clauses.join(" OR "))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_canonical_field_wins() {
        let doc = json!({"ownerId": "a", "uid": "b"});
        assert_eq!(resolve_owner(&doc), Some("a"));
    }

    #[test]
    fn test_each_legacy_field_resolves() {
        for field in LEGACY_OWNER_FIELDS {
            let doc = json!({ field: "u1" });
            assert_eq!(resolve_owner(&doc), Some("u1"), "field {field}");
            assert!(is_owned_by(&doc, "u1"), "field {field}");
        }
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let doc = json!({"ownerId": "", "createdBy": "u3"});
        assert_eq!(resolve_owner(&doc), Some("u3"));
    }

    #[test]
    fn test_no_owner_matches_nobody() {
        let doc = json!({"company": "Acme"});
        assert_eq!(resolve_owner(&doc), None);
        assert!(!is_owned_by(&doc, ""));
        assert!(!is_owned_by(&doc, "u1"));
    }

    #[test]
    fn test_non_string_owner_is_ignored() {
        let doc = json!({"uid": 42});
        assert!(!is_owned_by(&doc, "42"));
    }

    #[test]
    fn test_sql_predicate_lists_every_field() {
        let sql = sql_predicate(2);
        assert_eq!(
            sql,
            "(doc->>'ownerId' = $2 OR doc->>'uid' = $2 OR doc->>'userId' = $2 \
             OR doc->>'user_id' = $2 OR doc->>'createdBy' = $2)"
        );
    }
}
