//! Small helpers shared by the repositories.

use diesel::result::{DatabaseErrorKind, Error};

/// Wrap a connection-level failure (which diesel reports as a
/// `ConnectionError`) in the query error type the repositories return.
pub fn to_diesel_error(e: impl std::fmt::Display) -> Error {
    Error::DatabaseError(DatabaseErrorKind::Unknown, Box::new(e.to_string()))
}

/// Escape `%`, `_` and the escape character itself for a `LIKE ... ESCAPE '\'`
/// pattern, so user input only ever matches literally.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
