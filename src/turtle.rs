//! Turtle entity
//!
//! Holds the server-side state of one in-game turtle and applies validated
//! status updates to it. Updates are all-or-nothing: a payload that fails
//! validation leaves the entity untouched, and a payload that passes is
//! merged as a single atomic step with respect to concurrent readers.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, StatusError};
use crate::status::{InventorySlot, Orientation, Position, StatusUpdate};
use crate::validator::StatusValidator;

/// Server-side state of one turtle.
///
/// Entities are created exclusively by the registry; everything else holds
/// shared references handed out through it.
#[derive(Debug)]
pub struct Turtle {
    id: String,
    state: Mutex<TurtleState>,
}

#[derive(Debug, Clone)]
struct TurtleState {
    online: bool,
    fuel: u64,
    position: Option<Position>,
    orientation: Option<Orientation>,
    whitelist: Vec<String>,
    inventory: Vec<InventorySlot>,
    last_update: DateTime<Utc>,
    initialised: bool,
}

impl TurtleState {
    fn offline() -> Self {
        Self {
            online: false,
            fuel: 0,
            position: None,
            orientation: None,
            whitelist: Vec::new(),
            inventory: Vec::new(),
            last_update: DateTime::UNIX_EPOCH,
            initialised: false,
        }
    }
}

/// A consistent point-in-time view of a turtle.
///
/// While `online` is false the facet fields carry last-known (or default)
/// values and are not meaningful to consumers; the query layer applies the
/// display rule.
#[derive(Debug, Clone, PartialEq)]
pub struct TurtleSnapshot {
    pub id: String,
    pub online: bool,
    pub fuel: u64,
    pub position: Option<Position>,
    pub orientation: Option<Orientation>,
    pub whitelist: Vec<String>,
    pub inventory: Vec<InventorySlot>,
    pub last_update: DateTime<Utc>,
    pub initialised: bool,
}

impl Turtle {
    /// Create a turtle in the default offline, uninitialised state.
    ///
    /// Crate-private: the registry is the single creation path.
    pub(crate) fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: Mutex::new(TurtleState::offline()),
        }
    }

    /// The turtle's unique id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Validate and apply a status update.
    ///
    /// On validation failure the entity state is unchanged and the error
    /// carries the structured fault list. On success every field present
    /// in the payload overwrites the corresponding state field, absent
    /// fields stay untouched, `initialised` becomes true, and
    /// `last_update` advances only when the update reports the turtle
    /// online — a turtle going offline does not refresh its last contact.
    pub fn apply_update(&self, validator: &StatusValidator, payload: &Value) -> Result<()> {
        debug!(turtle_id = %self.id, "received status update");

        let report = validator.validate(payload);
        if !report.is_valid() {
            warn!(
                turtle_id = %self.id,
                faults = report.faults.len(),
                "invalid status payload"
            );
            return Err(StatusError::validation(report.into_faults()));
        }

        let update: StatusUpdate = serde_json::from_value(payload.clone())?;

        let mut state = self.state.lock().expect("turtle state lock poisoned");
        state.online = update.online;
        if let Some(fuel) = update.fuel {
            state.fuel = fuel;
        }
        if let Some(position) = update.position {
            state.position = Some(position);
        }
        if let Some(orientation) = update.orientation {
            state.orientation = Some(orientation);
        }
        if let Some(whitelist) = update.whitelist {
            state.whitelist = whitelist;
        }
        if let Some(inventory) = update.inventory {
            state.inventory = inventory;
        }
        state.initialised = true;
        if state.online {
            state.last_update = Utc::now();
        }
        drop(state);

        debug!(turtle_id = %self.id, "applied status update");
        Ok(())
    }

    /// Take a consistent snapshot of the current state.
    pub fn snapshot(&self) -> TurtleSnapshot {
        let state = self.state.lock().expect("turtle state lock poisoned");
        TurtleSnapshot {
            id: self.id.clone(),
            online: state.online,
            fuel: state.fuel,
            position: state.position,
            orientation: state.orientation,
            whitelist: state.whitelist.clone(),
            inventory: state.inventory.clone(),
            last_update: state.last_update,
            initialised: state.initialised,
        }
    }
}
