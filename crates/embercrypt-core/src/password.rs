//! The vault password entry.
//!
//! One payload shape serves every write: on full writes an absent field is
//! stored as absent, on partial writes it is left untouched. Timestamps are
//! owned by the service and ignored when they arrive from a client.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored password record, serialized in camelCase (`idPassword`, ...).
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultPassword {
    /// Positive identifier, assigned by the service on create.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_password: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl VaultPassword {
    /// Whether `other` describes the same account: equal `name`, `username`
    /// and `url` after trimming, with `name` and `url` compared without case.
    #[must_use]
    pub fn is_equivalent(&self, other: &Self) -> bool {
        fn norm(value: Option<&String>, fold_case: bool) -> Option<String> {
            value.map(|v| {
                let v = v.trim();
                if fold_case {
                    v.to_lowercase()
                } else {
                    v.to_owned()
                }
            })
        }

        norm(self.name.as_ref(), true) == norm(other.name.as_ref(), true)
            && norm(self.username.as_ref(), false) == norm(other.username.as_ref(), false)
            && norm(self.url.as_ref(), true) == norm(other.url.as_ref(), true)
    }

    /// Overwrite the client-settable fields present in `patch`.
    ///
    /// Identity and timestamps are not client-settable and are ignored.
    pub fn apply_patch(&mut self, patch: VaultPassword) {
        let VaultPassword {
            name,
            username,
            password,
            url,
            notes,
            ..
        } = patch;

        if name.is_some() {
            self.name = name;
        }
        if username.is_some() {
            self.username = username;
        }
        if password.is_some() {
            self.password = password;
        }
        if url.is_some() {
            self.url = url;
        }
        if notes.is_some() {
            self.notes = notes;
        }
    }

    /// Drop service-managed fields from a client payload.
    #[must_use]
    pub(crate) fn into_client_fields(self) -> Self {
        Self {
            id_password: None,
            created_at: None,
            updated_at: None,
            ..self
        }
    }
}

impl fmt::Debug for VaultPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultPassword")
            .field("id_password", &self.id_password)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("url", &self.url)
            .field("notes", &self.notes)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}
