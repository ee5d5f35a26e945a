/// Bound parameters per statement when binding id lists; under the 999
/// variable limit of older SQLite builds.
pub(crate) const MAX_BINDINGS_PER_STATEMENT: usize = 900;

/// `?,?,?` placeholder list for an `IN (...)` clause with `count` bindings.
pub(crate) fn generate_parameterized_bindings(count: usize) -> String {
    vec!["?"; count].join(",")
}

/// `%fragment%` for a `LIKE ... ESCAPE '\'` match, with wildcards in the
/// fragment taken literally.
pub(crate) fn contains_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings() {
        assert_eq!(generate_parameterized_bindings(0), "");
        assert_eq!(generate_parameterized_bindings(1), "?");
        assert_eq!(generate_parameterized_bindings(3), "?,?,?");
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("rum"), "%rum%");
        assert_eq!(contains_pattern(" 100%_pure "), "%100\\%\\_pure%");
    }
}
