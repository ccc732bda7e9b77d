//! Connection registry.
//!
//! Owns the set of live connections, keyed by the label each was initiated
//! with. Both maps sit behind one lock so a label and its id are always
//! added and removed together.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::RegexBuilder;

use crate::connection::{ConnectionHandle, ConnectionId};
use crate::error::RegistryError;

#[derive(Default)]
struct Inner {
    by_label: HashMap<String, Arc<ConnectionHandle>>,
    by_id: HashMap<ConnectionId, String>,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    inner: RwLock<Inner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under `label`. Fails without side effects if the
    /// label is taken or the connection is already registered.
    pub fn add(
        &self,
        label: impl Into<String>,
        conn: Arc<ConnectionHandle>,
    ) -> Result<(), RegistryError> {
        let label = label.into();
        let mut inner = self.inner.write();
        if inner.by_label.contains_key(&label) {
            return Err(RegistryError::DuplicateLabel(label));
        }
        if let Some(existing) = inner.by_id.get(&conn.id) {
            return Err(RegistryError::DuplicateConnection(existing.clone()));
        }
        inner.by_id.insert(conn.id, label.clone());
        inner.by_label.insert(label, conn);
        crate::metrics::connection_added();
        Ok(())
    }

    /// Remove by label. Absent labels are not an error.
    pub fn remove_by_label(&self, label: &str) -> Option<Arc<ConnectionHandle>> {
        let mut inner = self.inner.write();
        let conn = inner.by_label.remove(label)?;
        inner.by_id.remove(&conn.id);
        crate::metrics::connection_removed();
        Some(conn)
    }

    /// Remove whichever entry holds `conn`, if any.
    pub fn remove_by_connection(
        &self,
        conn: &ConnectionHandle,
    ) -> Option<(String, Arc<ConnectionHandle>)> {
        let mut inner = self.inner.write();
        let label = inner.by_id.remove(&conn.id)?;
        let removed = inner.by_label.remove(&label)?;
        crate::metrics::connection_removed();
        Some((label, removed))
    }

    /// Find the single connection whose label matches `mask`, a
    /// case-insensitive regular expression matched anywhere in the label.
    pub fn find_by_pattern(&self, mask: &str) -> Result<Arc<ConnectionHandle>, RegistryError> {
        let re = RegexBuilder::new(mask)
            .case_insensitive(true)
            .build()
            .map_err(|e| RegistryError::InvalidMask {
                mask: mask.to_string(),
                reason: e.to_string(),
            })?;

        let inner = self.inner.read();
        let mut matches: Vec<(&String, &Arc<ConnectionHandle>)> = inner
            .by_label
            .iter()
            .filter(|(label, _)| re.is_match(label))
            .collect();

        match matches.len() {
            0 => Err(RegistryError::NotFound(mask.to_string())),
            1 => Ok(matches[0].1.clone()),
            _ => {
                matches.sort_by(|a, b| a.0.cmp(b.0));
                Err(RegistryError::AmbiguousMatch {
                    mask: mask.to_string(),
                    labels: matches.into_iter().map(|(l, _)| l.clone()).collect(),
                })
            }
        }
    }

    pub fn find_by_exact_label(&self, label: &str) -> Option<Arc<ConnectionHandle>> {
        self.inner.read().by_label.get(label).cloned()
    }

    /// Label currently registered for `id`.
    pub fn find_by_id(&self, id: ConnectionId) -> Option<String> {
        self.inner.read().by_id.get(&id).cloned()
    }

    /// Snapshot of every entry, ordered by label.
    ///
    /// The lock is released before the iterator is returned, so callers may
    /// add or remove while iterating.
    pub fn list_all(&self) -> impl Iterator<Item = (String, Arc<ConnectionHandle>)> + use<> {
        let mut snapshot: Vec<(String, Arc<ConnectionHandle>)> = self
            .inner
            .read()
            .by_label
            .iter()
            .map(|(label, conn)| (label.clone(), conn.clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot.into_iter()
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_label.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().by_label.is_empty()
    }
}
