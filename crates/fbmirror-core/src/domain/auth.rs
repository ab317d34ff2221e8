//! Per-client authorization: rights tiers, configured credentials and the
//! bounded table of authenticated sessions.
//!
//! # Lifecycle
//!
//! ```text
//! connect ──► challenge-response checked against each credential (in order)
//!               │ first match                      │ no match
//!               ▼                                  ▼
//!         admit(client, tier)               rejected, no state
//!               │
//!         rights(client)  ◄── read-only lookups from the input paths
//!               │
//! disconnect ─► release(client)   frees the slot
//! ```
//!
//! The table has a fixed capacity.  An identity appears at most once; a
//! second admission for the same identity replaces its tier without
//! consuming another slot.  Admissions beyond capacity are rejected.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Identity the transport assigns to each connected remote session.
pub type ClientId = Uuid;

/// Default number of concurrently authenticated sessions.
pub const DEFAULT_CAPACITY: usize = 16;

/// Authorization level granted to a remote session.
///
/// Ordered: `ViewOnly < Operate < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RightsTier {
    /// May watch the display; all input is suppressed.
    ViewOnly = 0,
    /// May drive the touch panel and ordinary keys.
    Operate = 1,
    /// May additionally open the system menu and play button gestures.
    Admin = 2,
}

impl RightsTier {
    pub fn can_operate(self) -> bool {
        self >= RightsTier::Operate
    }

    pub fn is_admin(self) -> bool {
        self == RightsTier::Admin
    }
}

/// Errors raised by the authorization table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Every slot is taken by another session.
    #[error("authorization table full ({capacity} sessions)")]
    TableFull { capacity: usize },

    /// The client has no entry (never admitted or already released).
    #[error("unknown client: {0}")]
    UnknownClient(ClientId),
}

/// One configured password and the tier it grants.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub password: String,
    pub tier: RightsTier,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("password", &"<redacted>")
            .field("tier", &self.tier)
            .finish()
    }
}

/// Ordered password list consulted during the challenge-response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    entries: Vec<Credential>,
}

impl CredentialSet {
    pub fn new(entries: Vec<Credential>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns the tier of the first password the verifier accepts.
    ///
    /// `verifies` wraps the transport's challenge-response check: it is
    /// given each candidate password in configuration order and reports
    /// whether the client's response was computed from it.
    pub fn match_response(&self, mut verifies: impl FnMut(&str) -> bool) -> Option<RightsTier> {
        self.entries
            .iter()
            .find(|c| verifies(&c.password))
            .map(|c| c.tier)
    }
}

/// Outcome of a successful admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub tier: RightsTier,
    /// The transport must suppress all input from this session.
    pub view_only: bool,
    /// `true` when an existing entry for the same identity was replaced.
    pub replaced: bool,
}

/// Bounded map from client identity to rights tier.
#[derive(Debug)]
pub struct AuthorizationTable {
    entries: HashMap<ClientId, RightsTier>,
    capacity: usize,
}

impl AuthorizationTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records an authenticated session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TableFull`] if `client` is new and every slot is
    /// occupied.  The table is left unchanged in that case.
    pub fn admit(&mut self, client: ClientId, tier: RightsTier) -> Result<Admission, AuthError> {
        let replaced = self.entries.contains_key(&client);
        if !replaced && self.entries.len() >= self.capacity {
            return Err(AuthError::TableFull {
                capacity: self.capacity,
            });
        }
        self.entries.insert(client, tier);
        Ok(Admission {
            tier,
            view_only: tier == RightsTier::ViewOnly,
            replaced,
        })
    }

    /// Frees the slot held by `client`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownClient`] if the client holds no slot.
    pub fn release(&mut self, client: ClientId) -> Result<RightsTier, AuthError> {
        self.entries
            .remove(&client)
            .ok_or(AuthError::UnknownClient(client))
    }

    /// Looks up the tier granted to `client`.
    pub fn rights(&self, client: ClientId) -> Option<RightsTier> {
        self.entries.get(&client).copied()
    }

    /// Returns `true` if `client` is admitted with Admin rights.
    pub fn is_admin(&self, client: ClientId) -> bool {
        self.rights(client).is_some_and(RightsTier::is_admin)
    }
}

impl Default for AuthorizationTable {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
