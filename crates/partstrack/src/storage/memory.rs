//! In-memory part store.

use std::collections::HashMap;

use super::PartStore;
use crate::error::{Error, Result};
use crate::part::{NewPart, Part, PartId};

/// Part store backed by a `HashMap`, used by tests and embedders that keep
/// their own persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
    parts: HashMap<PartId, Part>,
    next_id: PartId,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Whether the store holds no parts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl PartStore for MemoryStore {
    fn insert(&mut self, part: &NewPart) -> Result<Part> {
        self.next_id += 1;
        let mut created = Part::new(self.next_id, part.name.clone());
        created.tracking = part.tracking.trim().to_string();
        created.status = part.status;
        self.parts.insert(created.id, created.clone());
        Ok(created)
    }

    fn get(&self, id: PartId) -> Result<Option<Part>> {
        Ok(self.parts.get(&id).cloned())
    }

    fn update(&mut self, part: &Part) -> Result<()> {
        match self.parts.get_mut(&part.id) {
            Some(stored) => {
                *stored = part.clone();
                Ok(())
            }
            None => Err(Error::PartNotFound(part.id)),
        }
    }

    fn list(&self) -> Result<Vec<Part>> {
        let mut parts: Vec<Part> = self.parts.values().cloned().collect();
        parts.sort_by_key(|p| p.id);
        Ok(parts)
    }
}
