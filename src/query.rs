//! Read-only query surface over the registry
//!
//! Produces the wire DTOs consumed by the HTTP layer. Queries never mutate
//! registry state. Display rule for the optional facet: `position` and
//! `orientation` are surfaced only while a turtle is online — last-known
//! values survive in storage across an offline transition, but consumers
//! must not rely on them, so the query contract withholds them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatusError};
use crate::registry::TurtleRegistry;
use crate::status::{InventorySlot, Orientation, Position};
use crate::turtle::TurtleSnapshot;

/// One row of the fleet listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurtleSummary {
    pub id: String,
    pub online: bool,
    /// Time of the last online status report (epoch before first contact)
    pub last_contact: DateTime<Utc>,
    /// Present only while online
    pub position: Option<Position>,
}

/// Full detail for a single turtle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurtleDetail {
    pub id: String,
    pub online: bool,
    pub fuel: u64,
    /// Time of the last online status report (epoch before first contact)
    pub last_contact: DateTime<Utc>,
    pub whitelist: Vec<String>,
    pub inventory: Vec<InventorySlot>,
    /// Omitted (not null) unless online and reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Omitted (not null) unless online and reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
}

/// Read-only query collaborator over the registry.
#[derive(Clone)]
pub struct QueryService {
    registry: Arc<TurtleRegistry>,
}

impl QueryService {
    pub fn new(registry: Arc<TurtleRegistry>) -> Self {
        Self { registry }
    }

    /// Summaries for all registered turtles; with `include_offline` false
    /// only online turtles appear.
    pub fn list(&self, include_offline: bool) -> Vec<TurtleSummary> {
        self.registry
            .list()
            .iter()
            .map(|turtle| turtle.snapshot())
            .filter(|snapshot| include_offline || snapshot.online)
            .map(|snapshot| TurtleSummary {
                position: surfaced(&snapshot, snapshot.position),
                id: snapshot.id,
                online: snapshot.online,
                last_contact: snapshot.last_update,
            })
            .collect()
    }

    /// Full detail for one turtle; `NotFound` for an unregistered id.
    pub fn detail(&self, id: &str) -> Result<TurtleDetail> {
        if !self.registry.exists(id) {
            return Err(StatusError::not_found(id));
        }
        let snapshot = self.registry.get_or_create(id)?.snapshot();
        Ok(TurtleDetail {
            position: surfaced(&snapshot, snapshot.position),
            orientation: surfaced(&snapshot, snapshot.orientation),
            id: snapshot.id,
            online: snapshot.online,
            fuel: snapshot.fuel,
            last_contact: snapshot.last_update,
            whitelist: snapshot.whitelist,
            inventory: snapshot.inventory,
        })
    }
}

fn surfaced<T>(snapshot: &TurtleSnapshot, value: Option<T>) -> Option<T> {
    if snapshot.online {
        value
    } else {
        None
    }
}
