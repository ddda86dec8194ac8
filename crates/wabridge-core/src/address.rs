//! Channel id normalization — the `@c.us` / `@g.us` domain markers.
//!
//! The engine addresses every chat by a channel id whose domain marker
//! distinguishes a person from a group. Subscribers may send bare phone
//! numbers or bare group ids; normalization appends the right marker.

/// Domain marker for a direct (person) chat.
pub const PERSON_DOMAIN: &str = "@c.us";

/// Domain marker for a group chat.
pub const GROUP_DOMAIN: &str = "@g.us";

/// Normalize a person destination into a canonical channel id.
///
/// Identifiers that already carry a domain marker pass through unchanged.
/// Anything else is assumed to be a phone number and gets [`PERSON_DOMAIN`]
/// appended — there is deliberately no validation of phone-number shape.
pub fn normalize_person(identifier: &str) -> String {
    if identifier.contains('@') {
        identifier.to_string()
    } else {
        format!("{identifier}{PERSON_DOMAIN}")
    }
}

/// Normalize a group destination into a canonical channel id.
///
/// Same pass-through rule as [`normalize_person`], with [`GROUP_DOMAIN`]
/// appended to bare ids.
pub fn normalize_group(identifier: &str) -> String {
    if identifier.contains('@') {
        identifier.to_string()
    } else {
        format!("{identifier}{GROUP_DOMAIN}")
    }
}
