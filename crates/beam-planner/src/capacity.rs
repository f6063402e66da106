//! Capacity capping and assignment extraction

use crate::matrix::ConnectionMatrix;
use crate::roster::Roster;
use crate::{Assignment, Beam, SatId, UserId};
use tracing::{debug, info};

/// Keep at most `max_users` beams per satellite
///
/// Rows are scanned in plain user index order, not ranked order: the first
/// `max_users` viable cells survive and every later one is cleared. Returns
/// the number of cells dropped.
pub fn cap_capacity(matrix: &mut ConnectionMatrix, max_users: usize) -> usize {
    let mut dropped = 0;

    for s in 0..matrix.n_sats() {
        let mut allocated = 0;
        for cell in matrix.row_mut(s).iter_mut().filter(|c| c.is_some()) {
            if allocated < max_users {
                allocated += 1;
            } else {
                *cell = None;
                dropped += 1;
            }
        }
        if allocated == max_users {
            debug!("Sat index {} at capacity ({} users)", s, max_users);
        }
    }

    info!("Capacity: {} beams dropped over the {} user limit", dropped, max_users);

    dropped
}

/// Convert surviving cells into a user → beam mapping
pub fn to_assignment(
    matrix: &ConnectionMatrix,
    users: &Roster<UserId>,
    sats: &Roster<SatId>,
) -> Assignment {
    matrix
        .viable_cells()
        .map(|(s, u, channel)| {
            (
                users.id(u),
                Beam {
                    sat: sats.id(s),
                    channel,
                },
            )
        })
        .collect()
}
