//! Status payload data model
//!
//! Defines the wire shape of a turtle status update and its component
//! types. A `StatusUpdate` is an explicit partial-update: `online` is
//! always carried, every other field is optional and only overwrites
//! entity state when present.

use serde::{Deserialize, Serialize};

/// A position in the world, relative to the world origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

/// The cardinal direction a turtle is facing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    North,
    East,
    South,
    West,
}

impl Orientation {
    /// All accepted wire values, in declaration order
    pub const VALUES: [&'static str; 4] = ["north", "east", "south", "west"];
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::North => write!(f, "north"),
            Orientation::East => write!(f, "east"),
            Orientation::South => write!(f, "south"),
            Orientation::West => write!(f, "west"),
        }
    }
}

/// One slot of a turtle's inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySlot {
    /// Name of the item in the slot
    pub name: String,
    /// Damage value of the item
    pub damage: i64,
    /// Number of items in the stack
    pub count: i64,
}

/// A validated turtle status update, ready to be merged onto entity state.
///
/// `online` is required on the wire; the remaining fields are the "online
/// facet" and are required by the validator only when `online` is true.
/// Fields that are `None` were absent from the payload and leave the
/// entity untouched on merge. Unknown top-level payload fields are
/// tolerated and dropped here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Whether the turtle reports itself reachable
    pub online: bool,
    /// Fuel level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel: Option<u64>,
    /// World position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Facing direction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    /// Mining whitelist (block names the turtle may mine)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<Vec<String>>,
    /// Inventory slots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Vec<InventorySlot>>,
}

impl StatusUpdate {
    /// A minimal offline update, carrying no facet fields
    pub fn offline() -> Self {
        Self {
            online: false,
            fuel: None,
            position: None,
            orientation: None,
            whitelist: None,
            inventory: None,
        }
    }
}
