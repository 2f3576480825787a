//! Snapshot storage.
//!
//! Snapshots live as one json file each in an inventory directory:
//! - inventory: index by date and by position, rebuilt on each scan
//! - diff: compare two snapshots region by region

pub mod diff;
pub mod inventory;

pub use inventory::{Inventory, InventoryEntry};
