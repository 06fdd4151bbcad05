//! Repository layer: entity-scoped database operations.
//!
//! Every function takes a borrowed `Connection`; multi-statement writes open
//! their own transaction so a failed request leaves no partial rows behind.

mod appointment;
mod encounter;
mod patient;
mod revoked_token;
mod user;

pub use appointment::*;
pub use encounter::*;
pub use patient::*;
pub use revoked_token::*;
pub use user::*;

/// Build a `LIKE ... ESCAPE '\'` pattern matching `needle` as a literal substring.
pub(crate) fn contains_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
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
    fn pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("ana"), "%ana%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
