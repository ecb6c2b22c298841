//! Small shared helpers.

/// Turn a snake_case column name into display text.
pub fn humanize(name: &str) -> String {
    name.replace('_', " ")
}
