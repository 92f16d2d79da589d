// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent role identifier.
//!
//! A role is declared at project initialization (e.g. "architect",
//! "developer", "reviewer") and is unique within one project (invariant 1
//! of the data model). Unlike the generated entity ids in [`crate::ids`],
//! roles are user-chosen strings, so they stay a plain newtype around
//! `String` rather than a `define_id!` wrapper.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Reserved recipient string meaning the supervisor itself.
pub const SUPERVISOR: &str = "supervisor";
/// Reserved recipient string meaning every agent in the project.
pub const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(pub String);

impl Role {
    pub fn new(role: impl Into<String>) -> Self {
        Self(role.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this string denotes a real agent role rather than one of the
    /// reserved recipients ("supervisor" / "all").
    pub fn is_real(&self) -> bool {
        self.0 != SUPERVISOR && self.0 != ALL
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for Role {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Role {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Borrow<str> for Role {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "role_tests.rs"]
mod tests;
