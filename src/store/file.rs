//! Durable entry store backed by a single checksummed snapshot file.

use super::state::LedgerState;
use super::EntryStore;
use crate::error::{Result, StoreError};
use crate::types::{Habit, HabitEntry, HabitId, HabitInput, UserId};
use chrono::NaiveDate;
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Magic bytes for the store manifest.
const STORE_MAGIC: &[u8; 4] = b"HBS\0";

/// Current store format version.
const STORE_VERSION: u8 = 1;

/// Magic bytes for the ledger snapshot.
const LEDGER_MAGIC: &[u8; 4] = b"HBL\0";

/// Current ledger snapshot format version.
const LEDGER_VERSION: u8 = 1;

/// Upper bound on a snapshot body, as a sanity check on the length field.
const MAX_LEDGER_BYTES: u64 = 256 * 1024 * 1024;

const LEDGER_FILE: &str = "ledger.bin";
const LEDGER_TMP_FILE: &str = "ledger.bin.tmp";

/// File store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Base directory for the store.
    pub path: PathBuf,

    /// Whether to create the store if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./habits"),
            create_if_missing: true,
        }
    }
}

/// Entry store persisted to disk.
///
/// Every mutation is applied to a copy of the state, written to a temp
/// file, fsynced and renamed into place before the in-memory state is
/// replaced. A failed write leaves both disk and memory untouched.
pub struct FileEntryStore {
    config: StoreConfig,

    /// Lock file for exclusive access.
    _lock_file: File,

    state: Mutex<LedgerState>,
}

impl FileEntryStore {
    /// Open an existing store or create a new one.
    pub fn open_or_create(config: StoreConfig) -> Result<Self> {
        if config.path.join("MANIFEST").exists() {
            Self::open(config)
        } else if config.create_if_missing {
            Self::create(config)
        } else {
            Err(StoreError::NotInitialized)
        }
    }

    /// Create a new, empty store.
    pub fn create(config: StoreConfig) -> Result<Self> {
        fs::create_dir_all(&config.path)?;
        Self::write_manifest(&config.path)?;
        let lock_file = Self::acquire_lock(&config.path)?;

        let state = LedgerState::default();
        Self::save(&config.path, &state)?;

        info!(path = %config.path.display(), "created habit store");

        Ok(Self {
            config,
            _lock_file: lock_file,
            state: Mutex::new(state),
        })
    }

    /// Open an existing store.
    pub fn open(config: StoreConfig) -> Result<Self> {
        Self::verify_manifest(&config.path)?;
        let lock_file = Self::acquire_lock(&config.path)?;

        let ledger_path = config.path.join(LEDGER_FILE);
        let state = if ledger_path.exists() {
            Self::load(&ledger_path)?
        } else {
            LedgerState::default()
        };

        info!(
            path = %config.path.display(),
            habits = state.habit_count(),
            entries = state.entry_count(),
            "opened habit store"
        );

        Ok(Self {
            config,
            _lock_file: lock_file,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Total number of entries across all habits.
    pub fn entry_count(&self) -> usize {
        self.state.lock().entry_count()
    }

    /// Apply `f` to a copy of the state and commit it once it is on disk.
    fn mutate<T>(&self, f: impl FnOnce(&mut LedgerState) -> Result<T>) -> Result<T> {
        let mut state = self.state.lock();
        let mut next = state.clone();
        let out = f(&mut next)?;
        Self::save(&self.config.path, &next)?;
        *state = next;
        Ok(out)
    }

    fn save(dir: &Path, state: &LedgerState) -> Result<()> {
        let encoded = rmp_serde::to_vec(state)?;
        let checksum = crc32fast::hash(&encoded);

        let tmp_path = dir.join(LEDGER_TMP_FILE);
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;

        file.write_all(LEDGER_MAGIC)?;
        file.write_all(&[LEDGER_VERSION])?;
        file.write_all(&(encoded.len() as u64).to_le_bytes())?;
        file.write_all(&encoded)?;
        file.write_all(&checksum.to_le_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, dir.join(LEDGER_FILE))?;
        debug!(bytes = encoded.len(), "saved ledger snapshot");
        Ok(())
    }

    fn load(path: &Path) -> Result<LedgerState> {
        let mut file = File::open(path)?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != LEDGER_MAGIC {
            return Err(StoreError::InvalidFormat("Invalid ledger magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != LEDGER_VERSION {
            return Err(StoreError::InvalidFormat(format!(
                "Unsupported ledger version: {}",
                version[0]
            )));
        }

        let mut len_bytes = [0u8; 8];
        file.read_exact(&mut len_bytes)?;
        let len = u64::from_le_bytes(len_bytes);
        if len > MAX_LEDGER_BYTES {
            return Err(StoreError::Corruption("Ledger snapshot too large".into()));
        }

        let mut encoded = vec![0u8; len as usize];
        file.read_exact(&mut encoded)?;

        let mut checksum_bytes = [0u8; 4];
        file.read_exact(&mut checksum_bytes)?;
        let expected = u32::from_le_bytes(checksum_bytes);
        let got = crc32fast::hash(&encoded);
        if expected != got {
            return Err(StoreError::ChecksumMismatch { expected, got });
        }

        Ok(rmp_serde::from_slice(&encoded)?)
    }

    fn write_manifest(path: &Path) -> Result<()> {
        let mut file = File::create(path.join("MANIFEST"))?;
        file.write_all(STORE_MAGIC)?;
        file.write_all(&[STORE_VERSION])?;
        file.sync_all()?;
        Ok(())
    }

    fn verify_manifest(path: &Path) -> Result<()> {
        let manifest_path = path.join("MANIFEST");
        if !manifest_path.exists() {
            return Err(StoreError::NotInitialized);
        }
        let mut file = File::open(manifest_path)?;

        let mut magic = [0u8; 4];
        file.read_exact(&mut magic)?;
        if &magic != STORE_MAGIC {
            return Err(StoreError::InvalidFormat("Invalid store magic".into()));
        }

        let mut version = [0u8; 1];
        file.read_exact(&mut version)?;
        if version[0] != STORE_VERSION {
            return Err(StoreError::InvalidFormat(format!(
                "Unsupported store version: {}",
                version[0]
            )));
        }

        Ok(())
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(path.join("LOCK"))?;
        lock_file
            .try_lock_exclusive()
            .map_err(|_| StoreError::Locked)?;
        Ok(lock_file)
    }
}

impl EntryStore for FileEntryStore {
    fn habit(&self, id: HabitId) -> Result<Option<Habit>> {
        Ok(self.state.lock().habit(id).cloned())
    }

    fn habits_for(&self, owner: &UserId) -> Result<Vec<Habit>> {
        Ok(self.state.lock().habits_for(owner))
    }

    fn create_habit(&self, owner: &UserId, input: HabitInput) -> Result<Habit> {
        self.mutate(|state| state.create_habit(owner, input))
    }

    fn update_habit(&self, id: HabitId, input: HabitInput) -> Result<Habit> {
        self.mutate(|state| state.update_habit(id, input))
    }

    fn archive_habit(&self, id: HabitId) -> Result<Habit> {
        self.mutate(|state| state.archive_habit(id))
    }

    fn restore_habit(&self, id: HabitId) -> Result<Habit> {
        self.mutate(|state| state.restore_habit(id))
    }

    fn entry(&self, habit_id: HabitId, date: NaiveDate) -> Result<Option<HabitEntry>> {
        Ok(self.state.lock().entry(habit_id, date).cloned())
    }

    fn entries(&self, habit_id: HabitId) -> Result<Vec<HabitEntry>> {
        let state = self.state.lock();
        if state.habit(habit_id).is_none() {
            return Err(StoreError::HabitNotFound(habit_id));
        }
        Ok(state.entries(habit_id))
    }

    fn insert_entry(&self, habit_id: HabitId, date: NaiveDate) -> Result<HabitEntry> {
        self.mutate(|state| state.insert_entry(habit_id, date))
    }

    fn delete_entry(&self, habit_id: HabitId, date: NaiveDate) -> Result<Option<HabitEntry>> {
        // Nothing to persist when the slot is already empty.
        if self.state.lock().entry(habit_id, date).is_none() {
            return Ok(None);
        }
        self.mutate(|state| Ok(state.delete_entry(habit_id, date)))
    }
}
