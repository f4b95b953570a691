//! # Storage Module
//!
//! Disk-backed history of scored readings using redb.
//!
//! Uses the redb embedded database for:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)
//!
//! Records are postcard-encoded and keyed by `(device_id, sequence)`, so a
//! device's history is one contiguous key range.

mod redb_readings;

pub use redb_readings::{MAX_DEVICE_ID_LEN, ReadingRecord, ReadingStore};
