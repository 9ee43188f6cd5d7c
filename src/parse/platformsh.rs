//! Parsers for the Platform.sh `platform` CLI.

use regex::Regex;
use std::sync::LazyLock;

/// Value of `property` in the `platform project:info` table.
///
/// Rows look like `| title          | my_blog_project |`.
pub fn project_property(output: &str, property: &str) -> Option<String> {
    static ROW_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^\|\s*(?P<key>[^|]+?)\s*\|\s*(?P<value>[^|]*?)\s*\|\s*$")
            .expect("table row regex is valid")
    });

    output
        .lines()
        .filter_map(|line| ROW_RE.captures(line.trim()))
        .find(|caps| &caps["key"] == property)
        .map(|caps| caps["value"].to_string())
        .filter(|value| !value.is_empty())
}

/// First URL printed by `platform url --yes`
pub fn project_url(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .find(|word| word.starts_with("https://") || word.starts_with("http://"))
        .map(str::to_string)
}
