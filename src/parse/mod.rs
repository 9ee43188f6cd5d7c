//! Extract facts from platform CLI output.
//!
//! Parsers are pure and never fail: a missing marker is reported as `None` or
//! `false`, which callers treat as "not found" rather than as an error.
//! Structured (`--json`) output is preferred wherever a CLI offers it.

pub mod fly;
pub mod heroku;
pub mod platformsh;

use serde_json::Value;

/// Names from a JSON array of objects carrying a `Name`/`name` field.
///
/// Returns `None` when `output` is not a JSON array, so callers can fall back
/// to text parsing.
pub(crate) fn json_names(output: &str) -> Option<Vec<String>> {
    let trimmed = output.trim();
    if !trimmed.starts_with('[') {
        return None;
    }

    let Value::Array(items) = serde_json::from_str::<Value>(trimmed).ok()? else {
        return None;
    };

    Some(
        items
            .iter()
            .filter_map(|item| item.get("Name").or_else(|| item.get("name")))
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_names_reads_either_case() {
        let out = r#"[{"Name": "blog-db"}, {"name": "other"}, {"id": 3}]"#;
        assert_eq!(
            json_names(out),
            Some(vec!["blog-db".to_string(), "other".to_string()])
        );
    }

    #[test]
    fn test_json_names_rejects_text() {
        assert_eq!(json_names("NAME  OWNER\nblog personal"), None);
        assert_eq!(json_names("[not json"), None);
    }

    #[test]
    fn test_json_names_empty_array() {
        assert_eq!(json_names("[]\n"), Some(Vec::new()));
    }
}
