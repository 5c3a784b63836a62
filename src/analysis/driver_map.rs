// Copyright (c) 2016-2021 Fabian Schuiki

//! An interval map from bit ranges to drivers.

use crate::driver::{Driver, DriverBitRange};

/// The drivers of a single value, keyed by the bits they drive.
///
/// Entries are kept sorted by their lower bound. Entries are never removed.
#[derive(Debug, Default)]
pub struct DriverMap<'a> {
    entries: Vec<(DriverBitRange, &'a Driver<'a>)>,
}

impl<'a> DriverMap<'a> {
    /// Create an empty map.
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a driver. Entries with equal lower bounds keep insertion order.
    pub fn insert(&mut self, bounds: DriverBitRange, driver: &'a Driver<'a>) {
        let pos = self.entries.partition_point(|(b, _)| b.low <= bounds.low);
        self.entries.insert(pos, (bounds, driver));
    }

    /// Iterate over all entries that overlap with `bounds`.
    pub fn find(
        &self,
        bounds: DriverBitRange,
    ) -> impl Iterator<Item = (DriverBitRange, &'a Driver<'a>)> + '_ {
        let end = self.entries.partition_point(|(b, _)| b.low <= bounds.high);
        self.entries[..end]
            .iter()
            .filter(move |(b, _)| b.overlaps(&bounds))
            .cloned()
    }

    /// Iterate over all entries, ordered by their lower bound.
    pub fn iter(&self) -> impl Iterator<Item = (DriverBitRange, &'a Driver<'a>)> + '_ {
        self.entries.iter().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
