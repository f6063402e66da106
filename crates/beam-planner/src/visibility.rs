//! Visibility and single-satellite pruning
//!
//! [`build_visibility`] marks every (satellite, user) pair whose
//! off-boresight angle is under the threshold, stamping each viable cell
//! from a rotating channel counter. [`prune_to_single_sat`] then leaves each
//! user with at most one candidate satellite, chosen at random.

use crate::geometry::off_boresight_deg;
use crate::matrix::ConnectionMatrix;
use crate::{Channel, Position, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

/// Build the candidate matrix
///
/// Users are visited in `user_order`, satellites in `sat_order`. The channel
/// counter starts at `A` and advances once per viable cell regardless of
/// which user or satellite it belongs to.
pub fn build_visibility(
    users: &[Position],
    sats: &[Position],
    user_order: &[usize],
    sat_order: &[usize],
    max_beam_angle_deg: f64,
) -> Result<ConnectionMatrix> {
    let mut matrix = ConnectionMatrix::new(sats.len(), users.len());
    let mut channel = Channel::A;

    for &u in user_order {
        for &s in sat_order {
            let angle = off_boresight_deg(&users[u], &sats[s])?;
            if angle < max_beam_angle_deg {
                matrix.set(s, u, channel);
                channel = channel.next();
            }
        }
    }

    info!(
        "Visibility: {} viable beams across {} sats x {} users",
        matrix.viable_count(),
        sats.len(),
        users.len()
    );

    Ok(matrix)
}

/// Keep one randomly chosen satellite per user
///
/// Users are visited in index order; candidates are gathered in `sat_order`
/// and the kept cell retains its channel. Returns the number of cells
/// cleared.
pub fn prune_to_single_sat<R: Rng + ?Sized>(
    matrix: &mut ConnectionMatrix,
    sat_order: &[usize],
    rng: &mut R,
) -> usize {
    let mut cleared = 0;

    for u in 0..matrix.n_users() {
        let candidates = matrix.sats_for_user(u, sat_order);
        if candidates.len() <= 1 {
            continue;
        }

        let Some(&chosen) = candidates.choose(rng) else {
            continue;
        };

        for &s in candidates.iter().filter(|&&s| s != chosen) {
            matrix.clear(s, u);
            cleared += 1;
        }

        debug!(
            "User index {} kept sat index {} of {} candidates",
            u,
            chosen,
            candidates.len()
        );
    }

    info!(
        "Pruning: {} surplus beams removed, {} remain",
        cleared,
        matrix.viable_count()
    );

    cleared
}
