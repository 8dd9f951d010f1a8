//! Table-qualification rewrite for the warehouse dialect.
//!
//! Rewrites bare `FROM <table>` / `JOIN <table>` references into
//! backtick-delimited `project.dataset.table` identifiers. The candidate
//! token universe is every word-like token in the schema text, which
//! over-matches column and type names as well; that only misfires when such
//! a token directly follows FROM or JOIN, and callers apply the pass
//! exactly once per freshly generated query, so repeated application is not
//! expected to be idempotent.

use std::collections::BTreeSet;

use regex::{NoExpand, Regex};

/// Best-effort text rewrite; non-matching input comes back unchanged.
pub fn qualify(sql: &str, schema_text: &str, project_id: &str, dataset: &str) -> String {
    let ident = Regex::new(r"\w+").expect("identifier pattern is valid");

    // BTreeSet for dedup and a deterministic rewrite order.
    let tokens: BTreeSet<&str> = ident.find_iter(schema_text).map(|m| m.as_str()).collect();

    let mut out = sql.to_string();
    for token in tokens {
        let qualified = format!("`{project_id}.{dataset}.{token}`");
        for keyword in ["FROM", "JOIN"] {
            let pattern = Regex::new(&format!(r"(?i)\b{keyword}\s+{token}\b"))
                .expect("keyword pattern is valid");
            let replacement = format!("{keyword} {qualified}");
            // NoExpand: a '$' in the identifiers is not a capture reference.
            out = pattern
                .replace_all(&out, NoExpand(&replacement))
                .into_owned();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA_TEXT: &str = "Tables:\n\
        - orders (id INTEGER MODE(REQUIRED), uid INTEGER MODE(NULLABLE))\n\
        - users (id INTEGER MODE(REQUIRED))\n";

    #[test]
    fn qualifies_from_and_join_references() {
        let sql = "SELECT * FROM orders o JOIN users u ON o.uid = u.id";
        let out = qualify(sql, SCHEMA_TEXT, "proj", "ds");

        assert!(out.contains("`proj.ds.orders`"));
        assert!(out.contains("`proj.ds.users`"));
        assert!(!out.contains("FROM orders"));
        assert!(!out.contains("JOIN users"));
    }

    #[test]
    fn keyword_match_is_case_insensitive_and_normalizes_to_uppercase() {
        let sql = "select * from orders";
        let out = qualify(sql, SCHEMA_TEXT, "p", "d");
        assert_eq!(out, "select * FROM `p.d.orders`");
    }

    #[test]
    fn tokens_outside_from_join_positions_are_untouched() {
        let sql = "SELECT orders.id FROM orders WHERE users = 1";
        let out = qualify(sql, SCHEMA_TEXT, "p", "d");
        assert!(out.starts_with("SELECT orders.id FROM `p.d.orders`"));
        assert!(out.contains("WHERE users = 1"));
    }

    #[test]
    fn non_matching_input_is_unchanged() {
        let sql = "SELECT 1";
        assert_eq!(qualify(sql, SCHEMA_TEXT, "p", "d"), sql);
    }

    #[test]
    fn dollar_signs_in_identifiers_stay_literal() {
        let sql = "SELECT * FROM orders";
        let out = qualify(sql, SCHEMA_TEXT, "proj$2024", "ds");
        assert_eq!(out, "SELECT * FROM `proj$2024.ds.orders`");
    }

    #[test]
    fn already_qualified_identifiers_are_left_alone() {
        let sql = "SELECT * FROM `p.d.orders`";
        assert_eq!(qualify(sql, SCHEMA_TEXT, "p", "d"), sql);
    }
}
