//! Assignment pipeline
//!
//! Wires the stages together over a fresh [`ConnectionMatrix`]:
//!
//! 1. rank users and satellites ([`crate::ranking`])
//! 2. build the visibility matrix ([`crate::visibility`])
//! 3. prune each user to one satellite (random, caller-seeded)
//! 4. resolve interference: permissive passes, then one strict pass
//! 5. cap per-satellite load ([`crate::capacity`])
//! 6. extract the user → beam mapping

use crate::capacity::{cap_capacity, to_assignment};
use crate::interference::resolve_schedule;
use crate::matrix::ConnectionMatrix;
use crate::ranking::ranked_order;
use crate::roster::Roster;
use crate::visibility::{build_visibility, prune_to_single_sat};
use crate::{
    coverage, Assignment, PlannerError, Position, Result, SatId, UserId, MAX_BEAM_ANGLE_DEG,
    MAX_USERS_PER_SAT, MIN_SEPARATION_DEG, PERMISSIVE_PASSES,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Planner thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Off-boresight limit for a viable beam (degrees, exclusive)
    pub max_beam_angle_deg: f64,
    /// Seat limit per satellite
    pub max_users_per_sat: usize,
    /// Same-channel separation seen from the satellite (degrees)
    pub min_separation_deg: f64,
    /// Channel-rotating passes before the strict pass
    pub permissive_passes: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_beam_angle_deg: MAX_BEAM_ANGLE_DEG,
            max_users_per_sat: MAX_USERS_PER_SAT,
            min_separation_deg: MIN_SEPARATION_DEG,
            permissive_passes: PERMISSIVE_PASSES,
        }
    }
}

/// Per-stage counts from one solve call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveStats {
    pub users: usize,
    pub sats: usize,
    /// Viable beams after the visibility stage
    pub viable_beams: usize,
    /// Beams left after single-satellite pruning
    pub pruned_beams: usize,
    /// Channel rotations made by permissive passes
    pub rotations: usize,
    /// Beams cleared by the strict pass
    pub interference_drops: usize,
    /// Beams cleared by capacity capping
    pub capacity_drops: usize,
    pub served: usize,
    /// Served fraction (0-1)
    pub coverage: f64,
}

/// Assign users to satellites and channels with the default thresholds
pub fn solve<R: Rng + ?Sized>(
    users: &BTreeMap<UserId, Position>,
    sats: &BTreeMap<SatId, Position>,
    rng: &mut R,
) -> Result<Assignment> {
    solve_with_config(users, sats, &PlannerConfig::default(), rng)
}

pub fn solve_with_config<R: Rng + ?Sized>(
    users: &BTreeMap<UserId, Position>,
    sats: &BTreeMap<SatId, Position>,
    config: &PlannerConfig,
    rng: &mut R,
) -> Result<Assignment> {
    solve_with_stats(users, sats, config, rng).map(|(assignment, _)| assignment)
}

/// Solve and report what each stage did
pub fn solve_with_stats<R: Rng + ?Sized>(
    users: &BTreeMap<UserId, Position>,
    sats: &BTreeMap<SatId, Position>,
    config: &PlannerConfig,
    rng: &mut R,
) -> Result<(Assignment, SolveStats)> {
    check_finite("user", users)?;
    check_finite("sat", sats)?;

    let users = Roster::from_map(users);
    let sats = Roster::from_map(sats);

    let mut stats = SolveStats {
        users: users.len(),
        sats: sats.len(),
        coverage: coverage(0, users.len()),
        ..SolveStats::default()
    };

    if users.is_empty() || sats.is_empty() {
        info!(
            "Nothing to assign ({} users, {} sats)",
            users.len(),
            sats.len()
        );
        return Ok((Assignment::new(), stats));
    }

    info!("Planning {} users across {} sats", users.len(), sats.len());

    let user_order = ranked_order(users.positions());
    let sat_order = ranked_order(sats.positions());

    let mut matrix: ConnectionMatrix = build_visibility(
        users.positions(),
        sats.positions(),
        &user_order,
        &sat_order,
        config.max_beam_angle_deg,
    )?;
    stats.viable_beams = matrix.viable_count();

    prune_to_single_sat(&mut matrix, &sat_order, rng);
    stats.pruned_beams = matrix.viable_count();

    let interference = resolve_schedule(
        &mut matrix,
        users.positions(),
        sats.positions(),
        &user_order,
        &sat_order,
        config.min_separation_deg,
        config.permissive_passes,
    )?;
    stats.rotations = interference.rotated;
    stats.interference_drops = interference.cleared;

    stats.capacity_drops = cap_capacity(&mut matrix, config.max_users_per_sat);

    let assignment = to_assignment(&matrix, &users, &sats);
    stats.served = assignment.len();
    stats.coverage = coverage(assignment.len(), users.len());

    info!(
        "Served {} of {} users ({:.2}% coverage)",
        stats.served,
        stats.users,
        stats.coverage * 100.0
    );

    Ok((assignment, stats))
}

/// Reject NaN or infinite coordinates before any stage sees them
fn check_finite<Id: fmt::Display>(kind: &str, positions: &BTreeMap<Id, Position>) -> Result<()> {
    match positions.iter().find(|(_, p)| !p.iter().all(|c| c.is_finite())) {
        Some((id, p)) => Err(PlannerError::DegenerateGeometry(format!(
            "{} {} has non-finite position ({}, {}, {})",
            kind, id, p.x, p.y, p.z
        ))),
        None => Ok(()),
    }
}
