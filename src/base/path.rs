//! Reference paths.
//!
//! A reference path is the `:`-joined chain of child keys from the design
//! root down to an entity, e.g. `top:dma0[block]:M_AXI[port]`. The root
//! contributes its bare name; every other segment is `name[generic_type]`.

/// Separator between path segments.
pub const PATH_SEPARATOR: char = ':';

/// Key of a child inside its owner's children map.
pub fn child_key(name: &str, generic_type: &str) -> String {
    format!("{name}[{generic_type}]")
}

/// Join an owner's reference with a child key.
pub fn join(owner_ref: &str, key: &str) -> String {
    format!("{owner_ref}{PATH_SEPARATOR}{key}")
}

/// Split a reference path into its segments.
pub fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split(PATH_SEPARATOR).filter(|s| !s.is_empty())
}

/// Candidate spellings for a segment, tried in order: exact, upper, lower.
///
/// Case folding applies to the name part only; the `[generic_type]` suffix
/// is kept as written.
pub fn case_candidates(segment: &str) -> [String; 3] {
    match segment.find('[') {
        Some(open) => {
            let (name, suffix) = segment.split_at(open);
            [
                segment.to_string(),
                format!("{}{suffix}", name.to_uppercase()),
                format!("{}{suffix}", name.to_lowercase()),
            ]
        }
        None => [
            segment.to_string(),
            segment.to_uppercase(),
            segment.to_lowercase(),
        ],
    }
}
