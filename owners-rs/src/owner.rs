use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[\w\-+%.]+@[\w\-+%.]+\z").expect("valid email regex"));

/// An identity that may approve changes: either a single person identified
/// by email address, or the wildcard `*` meaning anyone may approve.
///
/// Owners are totally ordered with the wildcard first, then emails in
/// lexicographic order. Tie-breaks throughout the crate pick the smallest
/// owner in this order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Owner {
    Everyone,
    Email(String),
}

impl Owner {
    pub const WILDCARD: &'static str = "*";

    /// Parse an owner from a declaration token or a reviewer identity.
    /// Returns `None` for anything that is neither `*` nor a valid email.
    pub fn parse(s: &str) -> Option<Owner> {
        if s == Self::WILDCARD {
            Some(Owner::Everyone)
        } else if is_valid_email(s) {
            Some(Owner::Email(s.to_owned()))
        } else {
            None
        }
    }

    pub fn is_everyone(&self) -> bool {
        matches!(self, Owner::Everyone)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Owner::Everyone => Self::WILDCARD,
            Owner::Email(email) => email,
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq<str> for Owner {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Owner {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

pub fn is_valid_email(s: &str) -> bool {
    EMAIL_REGEX.is_match(s)
}
