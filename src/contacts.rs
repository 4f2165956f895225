//! Contact sources.
//!
//! The address book is exported by a separate updater process into a JSON
//! cache (`contacts.json` in the cache directory). While the updater runs it
//! keeps a `contacts.updating` marker file next to the cache; readers never
//! wait for it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MailtoError, Result};
use crate::model::contact::Contact;

/// Where contacts come from.
pub trait ContactSource {
    /// All known contacts, in address-book order.
    fn list_contacts(&self) -> Result<Vec<Contact>>;

    /// Whether a background refresh is in progress.
    fn is_updating(&self) -> bool;
}

/// On-disk layout of the contact cache.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactCacheFile {
    pub contacts: Vec<Contact>,
}

/// Contacts read from the JSON cache written by the updater.
#[derive(Debug, Clone)]
pub struct CachedContacts {
    cache_path: PathBuf,
    marker_path: PathBuf,
}

impl CachedContacts {
    pub fn new(cache_path: impl Into<PathBuf>, marker_path: impl Into<PathBuf>) -> Self {
        Self {
            cache_path: cache_path.into(),
            marker_path: marker_path.into(),
        }
    }
}

impl ContactSource for CachedContacts {
    /// A missing cache is not an error: the updater has not run yet.
    fn list_contacts(&self) -> Result<Vec<Contact>> {
        if !self.cache_path.exists() {
            tracing::warn!(path = %self.cache_path.display(), "No contact cache yet");
            return Ok(Vec::new());
        }
        let data = std::fs::read(&self.cache_path).map_err(|e| MailtoError::io(&self.cache_path, e))?;
        let file: ContactCacheFile =
            serde_json::from_slice(&data).map_err(|e| MailtoError::ContactCache {
                path: self.cache_path.clone(),
                reason: e.to_string(),
            })?;
        tracing::debug!(count = file.contacts.len(), "Loaded contacts");
        Ok(file.contacts)
    }

    fn is_updating(&self) -> bool {
        self.marker_path.exists()
    }
}

/// A fixed, in-memory contact list.
#[derive(Debug, Clone, Default)]
pub struct StaticContacts(pub Vec<Contact>);

impl ContactSource for StaticContacts {
    fn list_contacts(&self) -> Result<Vec<Contact>> {
        Ok(self.0.clone())
    }

    fn is_updating(&self) -> bool {
        false
    }
}

/// Display name for `email`, compared case-insensitively. Groups have no
/// per-address name and are skipped.
pub fn name_for<'a>(contacts: &'a [Contact], email: &str) -> Option<&'a str> {
    contacts
        .iter()
        .filter(|c| !c.is_group())
        .find(|c| c.emails().iter().any(|e| e.eq_ignore_ascii_case(email)))
        .and_then(|c| c.display_name.as_deref())
}
