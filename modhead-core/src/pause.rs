//! Persistence of the global pause flag

use anyhow::{Context, Result};

use crate::error::StorageError;
use crate::models::PauseFlag;
use crate::storage::{read_key, write_key, LocalStorage, IS_PAUSED_KEY};

/// Reads the pause flag stored at startup; absent means `Active`
pub fn load_is_paused(storage: &dyn LocalStorage) -> Result<PauseFlag, StorageError> {
    let stored: Option<bool> = read_key(storage, IS_PAUSED_KEY)?;
    Ok(PauseFlag::from_paused(stored.unwrap_or(false)))
}

/// Writes the pause flag, then runs `on_saved` once the write has completed
///
/// `on_saved` (normally the override installer) runs only if the write
/// succeeded. A failed write is logged and returned; the continuation is not
/// invoked.
pub fn save_is_paused_to_browser<F>(
    storage: &dyn LocalStorage,
    is_paused: bool,
    on_saved: F,
) -> Result<()>
where
    F: FnOnce() -> Result<()>,
{
    if let Err(e) = write_key(storage, IS_PAUSED_KEY, &is_paused) {
        log::error!("Failed to persist pause flag ({}): {}", is_paused, e);
        return Err(e).context("Failed to save pause flag");
    }

    log::debug!("pause flag saved: {}", is_paused);
    on_saved()
}
