use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::pixel::PixelPair;

/// A scored request to redraw one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChangeRecord {
    pub pair: PixelPair,
    pub magnitude: f64,
}

impl ChangeRecord {
    /// A cell that has never been drawn. Sorts after every delta.
    pub fn new_cell(pair: PixelPair) -> Self {
        Self {
            pair,
            magnitude: f64::INFINITY,
        }
    }

    /// A cell whose content moved from `old` to `new`.
    pub fn delta(old: &PixelPair, new: PixelPair) -> Self {
        Self {
            magnitude: new.distance_to(old) as f64,
            pair: new,
        }
    }

    pub fn is_new_cell(&self) -> bool {
        self.magnitude == f64::INFINITY
    }
}

/// Remembers what every cell last showed and collects the changes of the
/// frame being built.
///
/// A coordinate is remembered once it has been set at least once; setting
/// it again with an identical pair queues nothing.
#[derive(Debug, Default)]
pub struct ChangeBuffer {
    cells: HashMap<(u16, u16), PixelPair>,
    pending: Vec<ChangeRecord>,
}

impl ChangeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, x: u16, y: u16, pair: PixelPair) {
        match self.cells.entry((x, y)) {
            Entry::Vacant(slot) => {
                self.pending.push(ChangeRecord::new_cell(pair));
                slot.insert(pair);
            }
            Entry::Occupied(mut slot) => {
                if *slot.get() == pair {
                    return;
                }
                self.pending.push(ChangeRecord::delta(slot.get(), pair));
                slot.insert(pair);
            }
        }
    }

    /// Last pair stored for `(x, y)`.
    pub fn remembered(&self, x: u16, y: u16) -> Option<&PixelPair> {
        self.cells.get(&(x, y))
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending records, smallest magnitude first and new cells last.
    ///
    /// Records the caller does not consume are dropped with the iterator.
    pub fn drain_by_priority(&mut self) -> std::vec::Drain<'_, ChangeRecord> {
        self.pending.sort_by(|a, b| a.magnitude.total_cmp(&b.magnitude));
        self.pending.drain(..)
    }

    /// Drop whatever is still pending. Nothing is carried into the next frame.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
    }

    /// Forget every cell, so the next frame paints from scratch.
    pub fn reset(&mut self) {
        self.cells.clear();
        self.pending.clear();
    }
}
