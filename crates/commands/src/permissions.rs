//! Operator permission levels.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tally_primitives::{Marker, Member};

/// LEADERSHIP, Gray Council.
const FULL: [u64; 2] = [1381235438563491841, 1399751111602212884];
/// Staff.
const BASIC: [u64; 1] = [1381244026790871111];

/// Access a command requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Access {
    /// Award commands.
    Basic,
    /// Deductions and direct grants.
    Full,
}

/// Markers that unlock each access level. Full access implies basic access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub basic: BTreeSet<Marker>,
    pub full: BTreeSet<Marker>,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            basic: BASIC.into_iter().chain(FULL).map(Marker::from).collect(),
            full: FULL.into_iter().map(Marker::from).collect(),
        }
    }
}

impl Permissions {
    pub fn has_basic<M: Member + ?Sized>(&self, member: &M) -> bool {
        self.basic.iter().chain(&self.full).any(|m| member.has_marker(m))
    }

    pub fn has_full<M: Member + ?Sized>(&self, member: &M) -> bool {
        self.full.iter().any(|m| member.has_marker(m))
    }

    pub fn allows<M: Member + ?Sized>(&self, member: &M, access: Access) -> bool {
        match access {
            Access::Basic => self.has_basic(member),
            Access::Full => self.has_full(member),
        }
    }
}
