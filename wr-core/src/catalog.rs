//! Round-trip jump catalog.
//!
//! Each entry is one ship round trip: `out` is the outbound jump mass and
//! `back` the return jump mass, both in millions. Catalog order is
//! meaningful: expansion scans and tie-breaks follow it, so the catalog is an
//! ordered list rather than a map.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of an entry in the catalog. The catalog is small and fixed for the
/// lifetime of a planner, so indices are stable.
pub type ActionId = u8;

/// One round-trip jump: outbound and return mass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub out: f64,
    pub back: f64,
}

impl Action {
    /// Total mass pushed through the hole by the full round trip.
    pub fn round_trip(&self) -> f64 {
        self.out + self.back
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub is_hic: bool,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog has no actions")]
    Empty,
    #[error("action {key}: masses must be finite and >= 0 with out + back > 0")]
    InvalidMass { key: String },
    #[error("duplicate action key {key}")]
    DuplicateKey { key: String },
}

/// Ordered action catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, CatalogError> {
        let catalog = Self { entries };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Re-check the catalog invariants. Needed after deserialization, which
    /// bypasses `new`.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.entries.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut keys: HashSet<&str> = HashSet::new();
        for e in &self.entries {
            let a = e.action;
            if !(a.out.is_finite() && a.back.is_finite())
                || a.out < 0.0
                || a.back < 0.0
                || a.round_trip() <= 0.0
            {
                return Err(CatalogError::InvalidMass { key: e.key.clone() });
            }
            if !keys.insert(e.key.as_str()) {
                return Err(CatalogError::DuplicateKey { key: e.key.clone() });
            }
        }
        Ok(())
    }

    /// The stock rolling lineup: a battleship in its three prop-mod
    /// configurations and a HIC, cold and hot.
    pub fn standard() -> Self {
        let mk = |key: &str, label: &str, is_hic: bool, out: f64, back: f64| CatalogEntry {
            key: key.to_string(),
            label: label.to_string(),
            is_hic,
            action: Action { out, back },
        };
        Self::new(vec![
            mk("BS_COLD_COLD", "Battleship, cold both ways", false, 200.0, 200.0),
            mk("BS_COLD_HOT", "Battleship, cold out / hot back", false, 200.0, 300.0),
            mk("BS_HOT_HOT", "Battleship, hot both ways", false, 300.0, 300.0),
            mk("HIC_COLD", "HIC, cold both ways", true, 106.0, 106.0),
            mk("HIC_HOT", "HIC, hot both ways", true, 134.0, 134.0),
        ])
        .expect("standard catalog is valid")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: ActionId) -> &CatalogEntry {
        &self.entries[id as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ActionId, &CatalogEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i as ActionId, e))
    }

    pub fn find(&self, key: &str) -> Option<ActionId> {
        self.entries
            .iter()
            .position(|e| e.key == key)
            .map(|i| i as ActionId)
    }
}
