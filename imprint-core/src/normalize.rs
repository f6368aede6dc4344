//! Path normalizer: relative path → stable identifier.
//!
//! Every non-alphanumeric character is a separator. Separators are removed and
//! the first character after a run of them is uppercased, so `a/b`, `a//b`,
//! `a.b` and `a-b` all become `aB`. A leading run is dropped without
//! capitalizing anything.

/// Normalize a relative path into a camel-cased identifier string.
///
/// Pure and infallible. Validation of the result as a symbol happens in
/// [`Identifier::from_path`](crate::types::Identifier::from_path).
pub fn normalize(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut capitalize_next = false;

    for c in path.chars() {
        if !c.is_alphanumeric() {
            // Leading separators never trigger capitalization.
            capitalize_next = !out.is_empty();
            continue;
        }
        if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
