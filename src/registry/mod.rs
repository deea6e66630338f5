//! Proxy group registry
//!
//! The authoritative in-memory store of all proxy groups. This is the only
//! shared mutable state in the process; every consumer receives clones, never
//! references into the locked structure. Writers are serialized behind a
//! single `RwLock`, so readers always observe a fully-applied group.

use std::collections::HashMap;

use dashmap::DashMap;
use parking_lot::RwLock;
use rand::Rng;

use crate::error::{Result, StardustError};
use crate::models::{Proxy, ProxyGroup};

/// Strategy types for proxy rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationStrategy {
    #[default]
    RoundRobin,
    Random,
}

impl RotationStrategy {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "random" => Self::Random,
            _ => Self::RoundRobin,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RoundRobin => "round_robin",
            Self::Random => "random",
        }
    }
}

#[derive(Default)]
struct Inner {
    groups: HashMap<String, ProxyGroup>,
    /// Group identifiers in insertion order
    order: Vec<String>,
}

/// In-memory registry of proxy groups, keyed by identifier
pub struct Registry {
    inner: RwLock<Inner>,
    /// Per-group round-robin cursors; reset when a group is replaced
    cursors: DashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            cursors: DashMap::new(),
        }
    }

    /// Replace the registry contents with groups loaded from durable storage.
    ///
    /// Preserves the order of the given sequence; duplicate identifiers keep
    /// the last occurrence.
    pub fn seed(&self, groups: Vec<ProxyGroup>) {
        let mut inner = self.inner.write();
        inner.groups.clear();
        inner.order.clear();
        for group in groups {
            if !inner.groups.contains_key(&group.id) {
                inner.order.push(group.id.clone());
            }
            inner.groups.insert(group.id.clone(), group);
        }
        self.cursors.clear();
    }

    /// Look up a group by identifier
    pub fn get(&self, id: &str) -> Result<ProxyGroup> {
        self.inner
            .read()
            .groups
            .get(id)
            .cloned()
            .ok_or_else(|| StardustError::NotFound(format!("proxy group {}", id)))
    }

    /// Snapshot of all groups in insertion order
    pub fn list(&self) -> Vec<ProxyGroup> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.groups.get(id).cloned())
            .collect()
    }

    /// Insert or replace a group by identifier.
    ///
    /// Replacement keeps the group's insertion position and resets its
    /// round-robin cursor, since the member list may have changed size.
    pub fn upsert(&self, group: ProxyGroup) -> Result<()> {
        if group.id.is_empty() {
            return Err(StardustError::InvalidArgument(
                "group identifier must not be empty".to_string(),
            ));
        }

        let mut inner = self.inner.write();
        if inner.groups.insert(group.id.clone(), group.clone()).is_none() {
            inner.order.push(group.id.clone());
        }
        drop(inner);

        self.cursors.remove(&group.id);
        Ok(())
    }

    /// Remove a group; a no-op when the identifier is absent
    pub fn remove(&self, id: &str) {
        let mut inner = self.inner.write();
        if inner.groups.remove(id).is_some() {
            inner.order.retain(|existing| existing != id);
        }
        drop(inner);

        self.cursors.remove(id);
    }

    /// Select one proxy from a group under the given rotation strategy.
    ///
    /// Fails fast: a missing group is `NotFound`, a group with zero members
    /// is `EmptyGroup`. Never waits for a group to become non-empty.
    pub fn pick(&self, id: &str, strategy: RotationStrategy) -> Result<Proxy> {
        let inner = self.inner.read();
        let group = inner
            .groups
            .get(id)
            .ok_or_else(|| StardustError::NotFound(format!("proxy group {}", id)))?;

        let len = group.proxies.len();
        if len == 0 {
            return Err(StardustError::EmptyGroup {
                group_id: id.to_string(),
            });
        }

        let idx = match strategy {
            RotationStrategy::RoundRobin => {
                let mut cursor = self.cursors.entry(id.to_string()).or_insert(0);
                let idx = *cursor % len;
                *cursor = (idx + 1) % len;
                idx
            }
            RotationStrategy::Random => rand::thread_rng().gen_range(0..len),
        };

        Ok(group.proxies[idx].clone())
    }

    /// Number of groups currently held
    pub fn group_count(&self) -> usize {
        self.inner.read().groups.len()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
