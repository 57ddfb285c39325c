// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector3f};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogValue {
    Float(Float),
    UInt(u32),
    Bool(bool),
    Vec3(Vector3f),
}

impl std::fmt::Display for LogValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogValue::Float(v) => write!(f, "{}", v),
            LogValue::UInt(v) => write!(f, "{}", v),
            LogValue::Bool(v) => write!(f, "{}", v),
            LogValue::Vec3(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Print,
    Assert,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelLogRecord {
    pub pixel: (usize, usize),
    pub kind: RecordKind,
    pub label: &'static str,
    pub value: LogValue,
}

/// Append-only, fixed-capacity record sink shared by all workers.
///
/// Writers reserve a slot with a single atomic increment, so records never
/// interleave. Once the capacity is used up further records are dropped.
pub struct PixelLog {
    slots: Vec<OnceLock<PixelLogRecord>>,
    next: AtomicUsize,
}

impl PixelLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| OnceLock::new()).collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// Returns false when the record was dropped.
    pub fn append(&self, record: PixelLogRecord) -> bool {
        let slot = self.next.fetch_add(1, Ordering::Relaxed);
        match self.slots.get(slot) {
            Some(cell) => cell.set(record).is_ok(),
            None => false,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.next.load(Ordering::Relaxed).min(self.slots.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dropped(&self) -> usize {
        self.next.load(Ordering::Relaxed).saturating_sub(self.slots.len())
    }

    /// Records written so far, in slot order.
    pub fn records(&self) -> Vec<PixelLogRecord> {
        self.slots[..self.len()].iter().filter_map(|cell| cell.get().copied()).collect()
    }
}
