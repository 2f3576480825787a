use std::path::PathBuf;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::InventoryError;
use crate::fetch::{Fetched, Fetcher, Source};
use crate::snapshot::{self, RawStatRecord};

/// One snapshot file known to the inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    /// `YYYYMMDD` taken from the file name.
    pub date: String,
    /// Everything between the prefix and `.json`.
    pub key: String,
    pub path: PathBuf,
    /// Sum of `confirmedCount`. `None` when the file could not be read.
    pub confirmed_total: Option<u64>,
}

impl InventoryEntry {
    pub fn load(&self) -> Result<Vec<RawStatRecord>, crate::error::SnapshotError> {
        snapshot::read_snapshot(&self.path)
    }
}

/// In-memory index over the snapshot files of one directory.
///
/// The table is rebuilt wholesale by [`Inventory::refresh`] and kept sorted
/// by file name, which orders entries by snapshot key.
pub struct Inventory {
    dir: PathBuf,
    entries: Vec<InventoryEntry>,
}

impl Inventory {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, InventoryError> {
        let mut inventory = Inventory {
            dir: dir.into(),
            entries: Vec::new(),
        };
        inventory.refresh()?;
        Ok(inventory)
    }

    /// Rescans the directory. On error the previous table is kept.
    pub fn refresh(&mut self) -> Result<(), InventoryError> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for item in walker {
            let item = item.map_err(|e| InventoryError::Io {
                path: self.dir.clone(),
                source: e.into(),
            })?;

            if !item.file_type().is_file() {
                continue;
            }

            let name = item.file_name().to_string_lossy();
            let Some((date, key)) = snapshot::parse_file_name(&name) else {
                info!("ignore file {name}");
                continue;
            };

            let path = item.path().to_path_buf();
            let confirmed_total = match snapshot::read_snapshot(&path) {
                Ok(records) => Some(snapshot::confirmed_total(&records)),
                Err(e) => {
                    warn!("snapshot {key} unreadable, no total: {e}");
                    None
                }
            };

            debug!("found snapshot {key} at {}", path.display());
            entries.push(InventoryEntry {
                date,
                key,
                path,
                confirmed_total,
            });
        }

        info!(
            "inventory {} holds {} snapshots",
            self.dir.display(),
            entries.len()
        );
        self.entries = entries;
        Ok(())
    }

    pub fn entries(&self) -> &[InventoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries whose date component equals `date`. Empty when none do.
    pub fn by_date(&self, date: &str) -> Vec<&InventoryEntry> {
        let found: Vec<_> = self.entries.iter().filter(|e| e.date == date).collect();
        info!("{} records found on date {date}", found.len());
        found
    }

    /// Positional lookup. Negative indices count from the end.
    pub fn by_index(&self, index: isize) -> Result<&InventoryEntry, InventoryError> {
        let len = self.entries.len();
        let resolved = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs()).filter(|&i| i < len)
        };

        match resolved.and_then(|i| self.entries.get(i)) {
            Some(entry) => Ok(entry),
            None => {
                warn!("index {index} out of range ({len} entries)");
                Err(InventoryError::IndexOutOfRange { index, len })
            }
        }
    }

    pub fn latest(&self) -> Option<&InventoryEntry> {
        self.entries.last()
    }

    /// Fetches a new snapshot and rescans.
    pub fn trigger_update<S: Source>(
        &mut self,
        fetcher: &Fetcher<S>,
    ) -> Result<Fetched, InventoryError> {
        let fetched = fetcher.fetch_snapshot()?;
        self.refresh()?;
        Ok(fetched)
    }
}
