//! Zero-based index tables for users and satellites
//!
//! Identities may start at any offset and arrive in any map. A [`Roster`]
//! fixes the mapping once, at the boundary: index `i` is the `i`-th
//! smallest identity. Everything inside the solver works on indices.

use crate::Position;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Roster<Id> {
    ids: Vec<Id>,
    positions: Vec<Position>,
}

impl<Id: Copy + Ord> Roster<Id> {
    pub fn from_map(map: &BTreeMap<Id, Position>) -> Self {
        let (ids, positions): (Vec<Id>, Vec<Position>) =
            map.iter().map(|(id, pos)| (*id, *pos)).unzip();
        Self { ids, positions }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn id(&self, index: usize) -> Id {
        self.ids[index]
    }

    pub fn position(&self, index: usize) -> &Position {
        &self.positions[index]
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Index of an identity, if present
    pub fn index_of(&self, id: Id) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }
}
