//! Proxy identity rotation and failure quarantine.
//!
//! The pool is the only shared mutable state across concurrent agents; all
//! reads, usage increments, and quarantine marks are serialized behind one
//! mutex. Quarantine never removes an identity from the pool; removal is a
//! separate explicit operation.

use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone)]
struct IdentityEntry {
    address: String,
    uses: u64,
    failed: bool,
}

#[derive(Debug, Default)]
struct PoolState {
    entries: Vec<IdentityEntry>,
    // Sticky identity per account username
    assignments: HashMap<String, String>,
}

/// Rotation statistics snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub total: usize,
    pub available: usize,
    pub quarantined: usize,
    pub usage_counts: HashMap<String, u64>,
}

/// Owned pool of proxy-like endpoints used to diversify agent traffic
#[derive(Debug, Default)]
pub struct IdentityPool {
    state: Mutex<PoolState>,
}

impl IdentityPool {
    pub fn new(addresses: impl IntoIterator<Item = String>) -> Self {
        let entries = addresses
            .into_iter()
            .map(|address| IdentityEntry {
                address,
                uses: 0,
                failed: false,
            })
            .collect();

        Self {
            state: Mutex::new(PoolState {
                entries,
                assignments: HashMap::new(),
            }),
        }
    }

    /// Add an identity to the pool. No-op if the address is already present.
    pub fn add(&self, address: impl Into<String>) {
        let address = address.into();
        let mut state = self.lock();
        if state.entries.iter().any(|e| e.address == address) {
            return;
        }
        state.entries.push(IdentityEntry {
            address,
            uses: 0,
            failed: false,
        });
    }

    /// Remove an identity from the pool entirely, clearing any quarantine
    /// mark and sticky assignments pointing at it.
    pub fn remove(&self, address: &str) -> bool {
        let mut state = self.lock();
        let before = state.entries.len();
        state.entries.retain(|e| e.address != address);
        state.assignments.retain(|_, assigned| assigned != address);
        state.entries.len() != before
    }

    /// Pick one non-quarantined identity uniformly at random, incrementing
    /// its usage counter. `None` when the pool is empty or fully quarantined.
    pub fn pick_random(&self) -> Option<String> {
        let mut state = self.lock();
        let available: Vec<usize> = available_indices(&state.entries);
        if available.is_empty() {
            warn!("No available identities - pool empty or fully quarantined");
            return None;
        }

        let idx = *available.choose(&mut rand::thread_rng())?;
        let entry = &mut state.entries[idx];
        entry.uses += 1;
        info!(identity = %entry.address, uses = entry.uses, "Using identity");
        Some(entry.address.clone())
    }

    /// Deterministic round-robin over the available identities: index
    /// `i % available.len()`. Used to hand each of N agents a distinct
    /// identity when possible.
    pub fn pick_for_index(&self, i: usize) -> Option<String> {
        let mut state = self.lock();
        let available = available_indices(&state.entries);
        if available.is_empty() {
            return None;
        }

        let idx = available[i % available.len()];
        let entry = &mut state.entries[idx];
        entry.uses += 1;
        Some(entry.address.clone())
    }

    /// Sticky per-account assignment: reuse the identity previously handed
    /// to this account while it remains available, otherwise assign a fresh
    /// random one and remember it.
    pub fn pick_for_account(&self, username: &str) -> Option<String> {
        let mut state = self.lock();

        if let Some(assigned) = state.assignments.get(username).cloned() {
            if let Some(entry) = state
                .entries
                .iter_mut()
                .find(|e| e.address == assigned && !e.failed)
            {
                entry.uses += 1;
                return Some(assigned);
            }
            // Assigned identity quarantined or removed; reassign below.
            state.assignments.remove(username);
        }

        let available = available_indices(&state.entries);
        if available.is_empty() {
            warn!(account = %username, "No available identity for account");
            return None;
        }

        let idx = *available.choose(&mut rand::thread_rng())?;
        let entry = &mut state.entries[idx];
        entry.uses += 1;
        let address = entry.address.clone();
        info!(account = %username, identity = %address, "Assigned identity to account");
        state.assignments.insert(username.to_string(), address.clone());
        Some(address)
    }

    /// Mark an identity as failed so it is never handed out again until an
    /// explicit reset. Idempotent; unknown addresses are ignored.
    pub fn quarantine(&self, address: &str) {
        let mut state = self.lock();
        if let Some(entry) = state.entries.iter_mut().find(|e| e.address == address) {
            if !entry.failed {
                entry.failed = true;
                warn!(identity = %address, "Identity quarantined");
            }
        }
    }

    /// Clear all quarantine marks; returns how many were cleared.
    pub fn reset_quarantine(&self) -> usize {
        let mut state = self.lock();
        let mut cleared = 0;
        for entry in state.entries.iter_mut().filter(|e| e.failed) {
            entry.failed = false;
            cleared += 1;
        }
        info!(cleared, "Reset quarantined identities");
        cleared
    }

    /// Read-only usage and quarantine statistics
    pub fn stats(&self) -> PoolStats {
        let state = self.lock();
        let quarantined = state.entries.iter().filter(|e| e.failed).count();
        PoolStats {
            total: state.entries.len(),
            available: state.entries.len() - quarantined,
            quarantined,
            usage_counts: state
                .entries
                .iter()
                .filter(|e| e.uses > 0)
                .map(|e| (e.address.clone(), e.uses))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PoolState> {
        // Pool operations cannot panic while holding the lock, so a
        // poisoned mutex only ever means a panicking test thread.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn available_indices(entries: &[IdentityEntry]) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.failed)
        .map(|(i, _)| i)
        .collect()
}
