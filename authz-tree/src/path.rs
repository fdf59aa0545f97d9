// SPDX-License-Identifier: MIT OR Apache-2.0

//! Slash-delimited repository paths.

use crate::error::AuthzError;

/// Separator between path segments.
pub const SEPARATOR: char = '/';

/// Split a path into its ordered segment names.
///
/// The root path ("/" or "") yields no segments. Empty segments are discarded, so "/foo/bar",
/// "foo/bar", "foo//bar" and "foo/bar/" all yield `["foo", "bar"]`.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(SEPARATOR)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Join segment names into an absolute path. No segments yield the root path "/".
pub fn join_path<'a, I>(segments: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut path = String::new();
    for segment in segments {
        path.push(SEPARATOR);
        path.push_str(segment);
    }

    if path.is_empty() {
        path.push(SEPARATOR);
    }

    path
}

/// Check that a name can be used for a single tree node.
pub(crate) fn validate_name(name: &str) -> Result<(), AuthzError> {
    if name.is_empty() || name.contains(SEPARATOR) {
        return Err(AuthzError::InvalidNodeName(name.to_owned()));
    }
    Ok(())
}
