// SPDX-License-Identifier: MIT OR Apache-2.0

use std::fmt::Display;
use std::str::FromStr;

use crate::error::AuthzError;

/// The three access levels an access rule can grant. Greater access levels are assumed to also
/// contain all lower ones.
///
/// None < ReadOnly < ReadWrite
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccessLevel {
    /// Access is explicitly denied.
    #[default]
    None,

    /// Permission to read a path.
    ReadOnly,

    /// Permission to read and write a path.
    ReadWrite,
}

impl AccessLevel {
    /// Token used for this level on the right-hand side of an authz rule line.
    pub fn as_token(&self) -> &'static str {
        match self {
            AccessLevel::None => "",
            AccessLevel::ReadOnly => "r",
            AccessLevel::ReadWrite => "rw",
        }
    }

    /// Access level is None.
    pub fn is_none(&self) -> bool {
        matches!(self, AccessLevel::None)
    }

    /// Access level is ReadOnly.
    pub fn is_read_only(&self) -> bool {
        matches!(self, AccessLevel::ReadOnly)
    }

    /// Access level is ReadWrite.
    pub fn is_read_write(&self) -> bool {
        matches!(self, AccessLevel::ReadWrite)
    }
}

impl Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AccessLevel::None => "none",
            AccessLevel::ReadOnly => "read-only",
            AccessLevel::ReadWrite => "read-write",
        };

        write!(f, "{}", s)
    }
}

impl FromStr for AccessLevel {
    type Err = AuthzError;

    /// Parse an authz token ("", "r" or "rw"). Surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(AccessLevel::None),
            "r" => Ok(AccessLevel::ReadOnly),
            "rw" => Ok(AccessLevel::ReadWrite),
            other => Err(AuthzError::InvalidAccessLevel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AccessLevel;

    #[test]
    fn access_level_ordering() {
        assert!(AccessLevel::None < AccessLevel::ReadOnly);
        assert!(AccessLevel::ReadOnly < AccessLevel::ReadWrite);
        assert_eq!(
            AccessLevel::ReadOnly.max(AccessLevel::ReadWrite),
            AccessLevel::ReadWrite
        );
        assert_eq!(AccessLevel::default(), AccessLevel::None);
    }

    #[test]
    fn authz_tokens() {
        for level in [
            AccessLevel::None,
            AccessLevel::ReadOnly,
            AccessLevel::ReadWrite,
        ] {
            assert_eq!(level.as_token().parse::<AccessLevel>().unwrap(), level);
        }

        assert_eq!(" rw ".parse::<AccessLevel>().unwrap(), AccessLevel::ReadWrite);
        assert!("w".parse::<AccessLevel>().is_err());
        assert!("wr".parse::<AccessLevel>().is_err());
    }
}
