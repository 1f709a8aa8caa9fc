//! # Companion Device Link
//!
//! The phone side of the data-sync channel. The face only reads from it:
//! connect when shown, attach a listener for incremental changes, ask for
//! every stored item once connected so it can catch up, and detach and
//! disconnect when hidden.
//!
//! [`CompanionLink`] is the seam the host adapter implements. Connection
//! callbacks arrive asynchronously through [`crate::face::WatchFace`], so
//! `connect` only requests a connection.
//!
//! [`FileCompanion`] backs the link with a JSON file of data items, which is
//! what the development binary and the tests use:
//!
//! ```json
//! [
//!   { "path": "/weatherinfo",
//!     "data": { "high_temp": 24.6, "low_temp": 13.2, "weather_id": 801 } }
//! ]
//! ```

use crate::weather::DataItem;
use log::{debug, info};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by a companion link.
///
/// None of these are fatal to the face: they are logged and the last known
/// weather stays on screen.
#[derive(Error, Debug)]
pub enum LinkError {
    /// Operation needs a live connection
    #[error("companion not connected")]
    NotConnected,

    /// Reading the backing store failed
    #[error("companion IO: {0}")]
    Io(#[from] io::Error),

    /// Stored items could not be decoded
    #[error("companion data: {0}")]
    Decode(#[from] serde_json::Error),

    /// Host transport reported a failure
    #[error("connection failed: {0}")]
    Connection(String),
}

/// Read-only view of the companion's data-sync API.
pub trait CompanionLink {
    /// Request a connection. Idempotent.
    fn connect(&mut self) -> Result<(), LinkError>;

    /// Drop the connection. Safe when not connected.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Start delivering change events to the face.
    fn add_listener(&mut self) -> Result<(), LinkError>;

    /// Stop delivering change events. Safe when no listener is attached.
    fn remove_listener(&mut self);

    /// Every item currently stored on the channel.
    fn stored_items(&mut self) -> Result<Vec<DataItem>, LinkError>;
}

/// Companion link backed by a JSON file of [`DataItem`]s.
///
/// The file is re-read on every [`CompanionLink::stored_items`] call, so
/// editing it while the face runs is picked up on the next catch-up.
#[derive(Debug)]
pub struct FileCompanion {
    path: PathBuf,
    connected: bool,
    listening: bool,
}

impl FileCompanion {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            connected: false,
            listening: false,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }
}

impl CompanionLink for FileCompanion {
    fn connect(&mut self) -> Result<(), LinkError> {
        if !self.connected {
            // Surface a missing file as a connection failure up front.
            fs::metadata(&self.path)?;
            self.connected = true;
            info!("connected to companion file {}", self.path.display());
        }
        Ok(())
    }

    fn disconnect(&mut self) {
        self.listening = false;
        self.connected = false;
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn add_listener(&mut self) -> Result<(), LinkError> {
        if !self.connected {
            return Err(LinkError::NotConnected);
        }
        self.listening = true;
        Ok(())
    }

    fn remove_listener(&mut self) {
        self.listening = false;
    }

    fn stored_items(&mut self) -> Result<Vec<DataItem>, LinkError> {
        if !self.connected {
            return Err(LinkError::NotConnected);
        }
        let contents = fs::read(&self.path)?;
        let items: Vec<DataItem> = serde_json::from_slice(&contents)?;
        debug!("companion file holds {} items", items.len());
        Ok(items)
    }
}
