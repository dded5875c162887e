//! Display-name splitting for contact mapping.

/// Split a customer display name into given and family name.
///
/// The first whitespace-separated token becomes the given name; the
/// remaining tokens, joined with single spaces, become the family name. A
/// single-token name yields an empty family name.
pub fn split_display_name(display_name: &str) -> (String, String) {
    let mut parts = display_name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = parts.collect();
    (first, rest.join(" "))
}
