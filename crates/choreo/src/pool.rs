//! Fixed-size pool of reusable proxies.
//!
//! Entries live in an arena and are handed out by index from a free list.
//! Each entry records which range holds it, so a double checkout or a stray
//! release is caught instead of silently corrupting the pool. The pool never
//! grows.

use crate::frame_range::RangeId;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolIndex(pub usize);

#[derive(Debug)]
struct Entry<T> {
    item: T,
    owner: Option<RangeId>,
}

#[derive(Debug)]
pub struct Pool<T> {
    label: String,
    entries: Vec<Entry<T>>,
    /// Free indices; checkout pops from the end
    free: Vec<usize>,
    peak_in_use: usize,
}

impl<T> Pool<T> {
    pub fn new(label: impl Into<String>, items: Vec<T>) -> Pool<T> {
        let entries: Vec<Entry<T>> = items
            .into_iter()
            .map(|item| Entry { item, owner: None })
            .collect();
        // lowest index comes out first
        let free = (0..entries.len()).rev().collect();

        Pool {
            label: label.into(),
            entries,
            free,
            peak_in_use: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn in_use(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    /// Most entries ever checked out at once.
    pub fn peak_in_use(&self) -> usize {
        self.peak_in_use
    }

    pub fn checkout(&mut self, owner: RangeId) -> Result<PoolIndex> {
        let index = self.free.pop().ok_or_else(|| Error::PoolExhausted {
            group: self.label.clone(),
            capacity: self.entries.len(),
        })?;
        self.entries[index].owner = Some(owner);
        self.peak_in_use = self.peak_in_use.max(self.in_use());
        Ok(PoolIndex(index))
    }

    /// Return an entry, yielding the range that held it.
    pub fn release(&mut self, index: PoolIndex) -> Result<RangeId> {
        let owner = self
            .entries
            .get_mut(index.0)
            .and_then(|e| e.owner.take())
            .ok_or_else(|| Error::NotCheckedOut {
                pool: self.label.clone(),
                index: index.0,
            })?;
        self.free.push(index.0);
        Ok(owner)
    }

    pub fn get(&self, index: PoolIndex) -> Option<&T> {
        self.entries.get(index.0).map(|e| &e.item)
    }

    pub fn owner(&self, index: PoolIndex) -> Option<RangeId> {
        self.entries.get(index.0).and_then(|e| e.owner)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.item)
    }
}
