use crate::error::{CoreError, Result};
use crate::score::CarbonCreditScore;
use crate::sensor::SensorData;
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Readings table: (device_id, sequence) -> postcard(ReadingRecord).
const READINGS: TableDefinition<(&str, u64), &[u8]> = TableDefinition::new("readings");

/// Longest accepted device identifier, in bytes.
pub const MAX_DEVICE_ID_LEN: usize = 64;

/// One stored, scored reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRecord {
    pub device_id: String,
    /// Per-device counter starting at 1.
    pub sequence: u64,
    pub species_key: String,
    pub sensor: SensorData,
    pub score: CarbonCreditScore,
}

/// Append-only reading history backed by a redb file.
pub struct ReadingStore {
    db: Database,
}

impl std::fmt::Debug for ReadingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadingStore").finish_non_exhaustive()
    }
}

impl ReadingStore {
    /// Create a new database file, or open it if it already exists.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path)?;
        let txn = db.begin_write()?;
        {
            txn.open_table(READINGS)?;
        }
        txn.commit()?;
        Ok(Self { db })
    }

    /// Open an existing database file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::open(path)?;
        Ok(Self { db })
    }

    /// Store a reading and return its sequence number.
    pub fn append(
        &self,
        device_id: &str,
        species_key: &str,
        sensor: &SensorData,
        score: &CarbonCreditScore,
    ) -> Result<u64> {
        validate_device_id(device_id)?;

        let txn = self.db.begin_write()?;
        let sequence = {
            let mut table = txn.open_table(READINGS)?;
            let last = {
                let mut range = table.range((device_id, 0u64)..=(device_id, u64::MAX))?;
                match range.next_back() {
                    Some(entry) => entry?.0.value().1,
                    None => 0,
                }
            };
            let sequence = last.saturating_add(1);

            let record = ReadingRecord {
                device_id: device_id.to_string(),
                sequence,
                species_key: species_key.to_string(),
                sensor: sensor.clone(),
                score: *score,
            };
            let bytes = postcard::to_allocvec(&record)?;
            table.insert((device_id, sequence), bytes.as_slice())?;
            sequence
        };
        txn.commit()?;
        Ok(sequence)
    }

    /// The newest reading of a device.
    pub fn latest(&self, device_id: &str) -> Result<Option<ReadingRecord>> {
        Ok(self.history(device_id, 1)?.into_iter().next())
    }

    /// Up to `limit` readings of a device, newest first.
    pub fn history(&self, device_id: &str, limit: usize) -> Result<Vec<ReadingRecord>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(READINGS)?;
        let mut records = Vec::new();
        for entry in table
            .range((device_id, 0u64)..=(device_id, u64::MAX))?
            .rev()
            .take(limit)
        {
            let (_, value) = entry?;
            records.push(postcard::from_bytes(value.value())?);
        }
        Ok(records)
    }

    /// Total number of stored readings across all devices.
    pub fn count(&self) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(READINGS)?;
        Ok(table.len()?)
    }
}

fn validate_device_id(device_id: &str) -> Result<()> {
    if device_id.trim().is_empty() {
        return Err(CoreError::InvalidDeviceId("empty".to_string()));
    }
    if device_id.len() > MAX_DEVICE_ID_LEN {
        return Err(CoreError::InvalidDeviceId(format!(
            "longer than {MAX_DEVICE_ID_LEN} bytes"
        )));
    }
    if device_id.chars().any(char::is_control) {
        return Err(CoreError::InvalidDeviceId(
            "contains control characters".to_string(),
        ));
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
