//! Beam Planner
//!
//! Assigns ground users to serving satellites and reusable frequency
//! channels for the SX9-Orbital constellation, maximizing the fraction of
//! users served under three hard limits.
//!
//! # Constraints
//!
//! | Limit | Value | Description |
//! |-------|-------|-------------|
//! | Off-boresight | < 45° | User's local vertical vs. direction to the satellite |
//! | Separation | ≥ 10° | Same-satellite, same-channel beams as seen from the satellite |
//! | Capacity | ≤ 32 | Users served by a single satellite |
//! | Channels | 4 | Reusable channels `A`..`D` |
//!
//! # Pipeline
//!
//! ```text
//! positions → ranking → visibility → per-user pruning
//!           → interference (permissive ×2, strict ×1) → capacity → assignment
//! ```
//!
//! The pipeline is one forward pass. The only non-determinism is the
//! per-user satellite choice, drawn from a caller-supplied [`rand::Rng`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub mod capacity;
pub mod geometry;
pub mod interference;
pub mod matrix;
pub mod ranking;
pub mod roster;
pub mod scenario;
pub mod solver;
pub mod validate;
pub mod visibility;

pub use geometry::Position;
pub use scenario::Scenario;
pub use solver::{solve, solve_with_config, solve_with_stats, PlannerConfig, SolveStats};
pub use validate::{validate, ValidationReport, Violation};

/// Maximum off-boresight angle for a viable beam (degrees, exclusive)
pub const MAX_BEAM_ANGLE_DEG: f64 = 45.0;

/// Maximum users served by one satellite
pub const MAX_USERS_PER_SAT: usize = 32;

/// Minimum same-channel beam separation seen from a satellite (degrees)
pub const MIN_SEPARATION_DEG: f64 = 10.0;

/// Number of reusable channels
pub const CHANNEL_COUNT: usize = 4;

/// Permissive interference passes run before the strict pass
pub const PERMISSIVE_PASSES: usize = 2;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid token on line {line}: {token:?}")]
    InvalidToken { line: usize, token: String },
    #[error("Line {line}: `{directive}` is missing its {field}")]
    MissingField {
        line: usize,
        directive: &'static str,
        field: &'static str,
    },
    #[error("Line {line}: cannot parse {value:?} as a number")]
    InvalidNumber { line: usize, value: String },
    #[error("Line {line}: duplicate {kind} id {id}")]
    DuplicateId {
        line: usize,
        kind: &'static str,
        id: i64,
    },
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;

/// Ground user identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

/// Satellite identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SatId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reusable frequency channel ("color")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Channel {
    A,
    B,
    C,
    D,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [Channel::A, Channel::B, Channel::C, Channel::D];

    /// Next channel in the A → B → C → D → A cycle
    pub fn next(self) -> Self {
        match self {
            Channel::A => Channel::B,
            Channel::B => Channel::C,
            Channel::C => Channel::D,
            Channel::D => Channel::A,
        }
    }

    /// Wire value (1-4)
    pub fn value(self) -> u8 {
        match self {
            Channel::A => 1,
            Channel::B => 2,
            Channel::C => 3,
            Channel::D => 4,
        }
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Channel::A),
            2 => Some(Channel::B),
            3 => Some(Channel::C),
            4 => Some(Channel::D),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// A served user's beam: serving satellite plus channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beam {
    pub sat: SatId,
    pub channel: Channel,
}

/// Final mapping from served user to beam. Unserved users are absent.
pub type Assignment = BTreeMap<UserId, Beam>;

/// Served fraction of all users. An empty population counts as fully covered.
pub fn coverage(served: usize, total_users: usize) -> f64 {
    if total_users == 0 {
        1.0
    } else {
        served as f64 / total_users as f64
    }
}
