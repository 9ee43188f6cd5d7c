//! Parsers for `flyctl` output.

use super::json_names;
use regex::Regex;
use std::sync::LazyLock;

/// Marker `flyctl postgres list` prints when the account has no clusters
pub const NO_CLUSTERS_MARKER: &str = "No postgres clusters found";

/// Apps listed by `flyctl apps list` that have never been deployed.
///
/// A freshly created app only fills NAME, OWNER and STATUS, so its row has
/// exactly three whitespace-separated fields. Header, update-notice and
/// builder rows are skipped. Order follows the listing.
pub fn undeployed_apps(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.to_lowercase().contains("update"))
        .filter(|line| !line.contains("NAME"))
        .filter(|line| !line.contains("builder"))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            (fields.len() == 3).then(|| fields[0].to_string())
        })
        .collect()
}

/// The app to configure against: the last undeployed app in the listing.
///
/// Apps are listed alphabetically, so "last" is a stable choice but not
/// necessarily the newest app. Callers warn when more than one candidate
/// exists.
pub fn undeployed_app_name(output: &str) -> Option<String> {
    undeployed_apps(output).pop()
}

/// First non-empty line after the `Region Pool` header of `flyctl regions list`
pub fn region(output: &str) -> Option<String> {
    let mut lines = output.lines();
    lines.find(|line| line.contains("Region Pool"))?;
    lines
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Whether a postgres cluster called `name` exists.
///
/// Reads `flyctl postgres list --json`; for text output the "no clusters"
/// sentence is authoritative and otherwise the first column is matched.
pub fn postgres_cluster_exists(output: &str, name: &str) -> bool {
    if let Some(names) = json_names(output) {
        return names.iter().any(|n| n == name);
    }

    if output.contains(NO_CLUSTERS_MARKER) {
        return false;
    }

    first_column_contains(output, name)
}

/// Whether secret `name` appears in `flyctl secrets list --json` (or its table form)
pub fn secret_is_set(output: &str, name: &str) -> bool {
    match json_names(output) {
        Some(names) => names.iter().any(|n| n == name),
        None => first_column_contains(output, name),
    }
}

/// App hostname from `flyctl info`, e.g. `blog.fly.dev`
pub fn hostname(output: &str) -> Option<String> {
    static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"Hostname\s*=\s*(?P<host>\S+\.fly\.dev)").expect("hostname regex is valid")
    });

    HOSTNAME_RE
        .captures(output)
        .map(|caps| caps["host"].to_string())
}

fn first_column_contains(output: &str, name: &str) -> bool {
    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .any(|first| first == name)
}
