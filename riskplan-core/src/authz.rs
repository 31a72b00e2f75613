//! Capability checks
//!
//! The engine never hardcodes user identifiers; callers inject whatever role
//! store their deployment uses.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// Edit the global measure template library
    Admin,
}

pub trait AuthorizationContext {
    fn has_capability(&self, user: &str, capability: Capability) -> bool;
}

/// Role store backed by a fixed admin list (typically from configuration)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRoleStore {
    admins: BTreeSet<String>,
}

impl StaticRoleStore {
    pub fn with_admins<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StaticRoleStore {
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn admins(&self) -> impl Iterator<Item = &str> {
        self.admins.iter().map(String::as_str)
    }
}

impl AuthorizationContext for StaticRoleStore {
    fn has_capability(&self, user: &str, capability: Capability) -> bool {
        match capability {
            Capability::Admin => self.admins.contains(user),
        }
    }
}
