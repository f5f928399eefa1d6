//! Small string helpers shared by the catalog and validators.

/// Case-insensitive comparison without allocating.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Lookup key for ids that are matched case-insensitively.
pub fn fold_key(id: &str) -> String {
    id.to_lowercase()
}

/// Returns the trimmed text, or `None` when it is blank.
pub fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// Format a number the way error messages report bounds and observed values.
pub fn format_number(value: f64) -> String {
    format!("{}", value)
}
