//! Pairwise interference resolution
//!
//! For every satellite, attached users are compared pairwise in ranked
//! order. A pair closer than the minimum separation that shares a channel is
//! a conflict, and the later user of the pair always loses:
//!
//! - [`ResolveMode::Permissive`] rotates the later user's channel.
//! - [`ResolveMode::Strict`] clears the later user's beam.
//!
//! A rotation is not re-checked against pairs already visited in the same
//! pass. The schedule is fixed: permissive passes first, one strict pass
//! last, so whatever rotation could not settle is removed.

use crate::geometry::{angle_of_units, unit};
use crate::matrix::ConnectionMatrix;
use crate::{Position, Result};
use std::ops::AddAssign;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    Permissive,
    Strict,
}

/// Conflicts resolved by one or more passes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassOutcome {
    pub rotated: usize,
    pub cleared: usize,
}

impl AddAssign for PassOutcome {
    fn add_assign(&mut self, other: Self) {
        self.rotated += other.rotated;
        self.cleared += other.cleared;
    }
}

/// Run one resolution pass over every satellite
pub fn resolve_interference(
    matrix: &mut ConnectionMatrix,
    users: &[Position],
    sats: &[Position],
    user_order: &[usize],
    sat_order: &[usize],
    min_separation_deg: f64,
    mode: ResolveMode,
) -> Result<PassOutcome> {
    let mut outcome = PassOutcome::default();

    for &s in sat_order {
        let attached = matrix.users_on_sat(s, user_order);
        if attached.len() < 2 {
            continue;
        }

        let beams = attached
            .iter()
            .map(|&u| unit(&(users[u] - sats[s])))
            .collect::<Result<Vec<Position>>>()?;

        for i in 0..attached.len() {
            for j in (i + 1)..attached.len() {
                let angle = angle_of_units(&beams[i], &beams[j]);
                if angle >= min_separation_deg {
                    continue;
                }

                let (u1, u2) = (attached[i], attached[j]);
                let shared = match (matrix.get(s, u1), matrix.get(s, u2)) {
                    (Some(c1), Some(c2)) if c1 == c2 => c2,
                    _ => continue,
                };

                match mode {
                    ResolveMode::Permissive => {
                        matrix.set(s, u2, shared.next());
                        outcome.rotated += 1;
                        debug!(
                            "Sat index {}: user index {} rotated {} -> {} ({:.2}° from user index {})",
                            s,
                            u2,
                            shared,
                            shared.next(),
                            angle,
                            u1
                        );
                    }
                    ResolveMode::Strict => {
                        matrix.clear(s, u2);
                        outcome.cleared += 1;
                        debug!(
                            "Sat index {}: user index {} dropped on {} ({:.2}° from user index {})",
                            s, u2, shared, angle, u1
                        );
                    }
                }
            }
        }
    }

    Ok(outcome)
}

/// Run `permissive_passes` permissive passes followed by one strict pass
pub fn resolve_schedule(
    matrix: &mut ConnectionMatrix,
    users: &[Position],
    sats: &[Position],
    user_order: &[usize],
    sat_order: &[usize],
    min_separation_deg: f64,
    permissive_passes: usize,
) -> Result<PassOutcome> {
    let mut total = PassOutcome::default();

    let modes = std::iter::repeat(ResolveMode::Permissive)
        .take(permissive_passes)
        .chain(std::iter::once(ResolveMode::Strict));

    for (pass, mode) in modes.enumerate() {
        let outcome = resolve_interference(
            matrix,
            users,
            sats,
            user_order,
            sat_order,
            min_separation_deg,
            mode,
        )?;
        info!(
            "Interference pass {} ({:?}): {} rotated, {} cleared",
            pass + 1,
            mode,
            outcome.rotated,
            outcome.cleared
        );
        total += outcome;
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Channel;

    /// One satellite at the origin looking down -z; users on the unit
    /// sphere below it at the given polar angles (degrees) along +x.
    fn fan(angles_deg: &[f64]) -> (Vec<Position>, Vec<Position>) {
        let sats = vec![Position::zeros()];
        let users = angles_deg
            .iter()
            .map(|a| {
                let r = a.to_radians();
                Position::new(r.sin(), 0.0, -r.cos())
            })
            .collect();
        (users, sats)
    }

    fn matrix_with(channels: &[Channel]) -> ConnectionMatrix {
        let mut m = ConnectionMatrix::new(1, channels.len());
        for (u, &c) in channels.iter().enumerate() {
            m.set(0, u, c);
        }
        m
    }

    fn single_pass(
        m: &mut ConnectionMatrix,
        users: &[Position],
        sats: &[Position],
        user_order: &[usize],
        mode: ResolveMode,
    ) -> PassOutcome {
        resolve_interference(m, users, sats, user_order, &[0], 10.0, mode).unwrap()
    }

    #[test]
    fn test_separated_users_untouched() {
        let (users, sats) = fan(&[0.0, 15.0, 30.0]);
        let mut m = matrix_with(&[Channel::A, Channel::A, Channel::A]);
        let out = single_pass(&mut m, &users, &sats, &[0, 1, 2], ResolveMode::Strict);
        assert_eq!(out, PassOutcome::default());
        assert_eq!(m.viable_count(), 3);
    }

    #[test]
    fn test_different_channels_do_not_conflict() {
        let (users, sats) = fan(&[0.0, 2.0]);
        let mut m = matrix_with(&[Channel::A, Channel::B]);
        let out = single_pass(&mut m, &users, &sats, &[0, 1], ResolveMode::Strict);
        assert_eq!(out.cleared, 0);
        assert_eq!(m.viable_count(), 2);
    }

    #[test]
    fn test_permissive_rotates_later_user() {
        let (users, sats) = fan(&[0.0, 2.0]);
        let mut m = matrix_with(&[Channel::D, Channel::D]);
        let out = single_pass(&mut m, &users, &sats, &[0, 1], ResolveMode::Permissive);
        assert_eq!(out.rotated, 1);
        assert_eq!(m.get(0, 0), Some(Channel::D));
        assert_eq!(m.get(0, 1), Some(Channel::A));
    }

    #[test]
    fn test_later_means_ranked_order_not_index() {
        let (users, sats) = fan(&[0.0, 2.0]);
        let mut m = matrix_with(&[Channel::B, Channel::B]);
        single_pass(&mut m, &users, &sats, &[1, 0], ResolveMode::Strict);
        assert_eq!(m.get(0, 1), Some(Channel::B));
        assert_eq!(m.get(0, 0), None);
    }

    #[test]
    fn test_strict_clears_later_user() {
        let (users, sats) = fan(&[0.0, 2.0, 4.0]);
        let mut m = matrix_with(&[Channel::C, Channel::C, Channel::C]);
        let out = single_pass(&mut m, &users, &sats, &[0, 1, 2], ResolveMode::Strict);
        // (0,1) clears 1, (0,2) clears 2, (1,2) no longer shares a channel
        assert_eq!(out.cleared, 2);
        assert_eq!(m.get(0, 0), Some(Channel::C));
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get(0, 2), None);
    }

    #[test]
    fn test_rotation_not_rechecked_within_pass() {
        // Three mutually close users: A, A, B.
        // (0,1): user 1 rotates A -> B. (0,2): A vs B, no conflict.
        // (1,2): B vs B, user 2 rotates B -> C.
        let (users, sats) = fan(&[0.0, 1.0, 2.0]);
        let mut m = matrix_with(&[Channel::A, Channel::A, Channel::B]);
        let out = single_pass(&mut m, &users, &sats, &[0, 1, 2], ResolveMode::Permissive);
        assert_eq!(out.rotated, 2);
        assert_eq!(m.get(0, 1), Some(Channel::B));
        assert_eq!(m.get(0, 2), Some(Channel::C));
    }

    #[test]
    fn test_schedule_settles_or_removes() {
        // Six mutually close users cannot fit four channels.
        let angles: Vec<f64> = (0..6).map(|i| i as f64 * 0.5).collect();
        let (users, sats) = fan(&angles);
        let mut m = matrix_with(&[Channel::A; 6]);
        let order: Vec<usize> = (0..6).collect();
        let out = resolve_schedule(&mut m, &users, &sats, &order, &[0], 10.0, 2).unwrap();
        assert!(out.rotated > 0);
        assert!(out.cleared > 0);

        // Survivors never share a channel
        let survivors: Vec<Channel> = m.row(0).iter().flatten().copied().collect();
        for i in 0..survivors.len() {
            for j in (i + 1)..survivors.len() {
                assert_ne!(survivors[i], survivors[j]);
            }
        }
        assert!(survivors.len() <= 4);
    }

    #[test]
    fn test_schedule_with_no_permissive_passes_is_strict_only() {
        let (users, sats) = fan(&[0.0, 1.0]);
        let mut m = matrix_with(&[Channel::A, Channel::A]);
        let out = resolve_schedule(&mut m, &users, &sats, &[0, 1], &[0], 10.0, 0).unwrap();
        assert_eq!(out.rotated, 0);
        assert_eq!(out.cleared, 1);
    }
}
