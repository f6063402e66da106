//! Independent solution checker
//!
//! Re-derives every acceptance rule straight from the scenario geometry,
//! without going through the solver's stages, so it can serve as the oracle
//! for any assignment: visibility, capacity, same-channel separation and
//! coverage. All violations are collected, not just the first.

use crate::{
    coverage, Assignment, Channel, SatId, Scenario, UserId, MAX_BEAM_ANGLE_DEG,
    MAX_USERS_PER_SAT, MIN_SEPARATION_DEG,
};
use nalgebra::Vector3;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Slack allowed on the separation check (degrees)
pub const ANGLE_TOLERANCE_DEG: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    UnknownUser {
        user: UserId,
    },
    UnknownSat {
        user: UserId,
        sat: SatId,
    },
    Degenerate {
        user: UserId,
        sat: SatId,
    },
    NotVisible {
        user: UserId,
        sat: SatId,
        angle_deg: f64,
    },
    OverCapacity {
        sat: SatId,
        assigned: usize,
    },
    TooClose {
        sat: SatId,
        channel: Channel,
        first: UserId,
        second: UserId,
        angle_deg: f64,
    },
    InsufficientCoverage {
        coverage: f64,
        required: f64,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::UnknownUser { user } => write!(f, "User {} is not in the scenario", user),
            Violation::UnknownSat { user, sat } => {
                write!(f, "User {} assigned to unknown satellite {}", user, sat)
            }
            Violation::Degenerate { user, sat } => {
                write!(f, "User {} and satellite {} have no defined beam direction", user, sat)
            }
            Violation::NotVisible {
                user,
                sat,
                angle_deg,
            } => write!(
                f,
                "User {} cannot see satellite {} ({:.2} degrees from vertical)",
                user, sat, angle_deg
            ),
            Violation::OverCapacity { sat, assigned } => write!(
                f,
                "Satellite {} cannot serve more than {} users ({} assigned)",
                sat, MAX_USERS_PER_SAT, assigned
            ),
            Violation::TooClose {
                sat,
                channel,
                first,
                second,
                angle_deg,
            } => write!(
                f,
                "Users {} and {} on satellite {} {} are too close ({:.2} degrees)",
                first, second, sat, channel, angle_deg
            ),
            Violation::InsufficientCoverage { coverage, required } => write!(
                f,
                "Too few users served ({:.2}% < {:.2}%)",
                coverage * 100.0,
                required * 100.0
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub served: usize,
    pub total_users: usize,
    pub coverage: f64,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Check an assignment against a scenario
pub fn validate(scenario: &Scenario, assignment: &Assignment) -> ValidationReport {
    let mut violations = Vec::new();
    let mut beams: BTreeMap<SatId, Vec<(UserId, Channel)>> = BTreeMap::new();

    for (&user, beam) in assignment {
        let Some(user_pos) = scenario.users.get(&user) else {
            violations.push(Violation::UnknownUser { user });
            continue;
        };
        let Some(sat_pos) = scenario.sats.get(&beam.sat) else {
            violations.push(Violation::UnknownSat {
                user,
                sat: beam.sat,
            });
            continue;
        };

        match (direction(user_pos), direction(&(sat_pos - user_pos))) {
            (Some(vertical), Some(to_sat)) => {
                let angle_deg = degrees_between(&vertical, &to_sat);
                if angle_deg >= MAX_BEAM_ANGLE_DEG {
                    violations.push(Violation::NotVisible {
                        user,
                        sat: beam.sat,
                        angle_deg,
                    });
                }
            }
            _ => violations.push(Violation::Degenerate {
                user,
                sat: beam.sat,
            }),
        }

        beams.entry(beam.sat).or_default().push((user, beam.channel));
    }

    for (&sat, sat_beams) in &beams {
        if sat_beams.len() > MAX_USERS_PER_SAT {
            violations.push(Violation::OverCapacity {
                sat,
                assigned: sat_beams.len(),
            });
        }

        let sat_pos = &scenario.sats[&sat];
        for (i, &(first, channel)) in sat_beams.iter().enumerate() {
            for &(second, other) in &sat_beams[i + 1..] {
                if channel != other {
                    continue;
                }
                let a = direction(&(scenario.users[&first] - sat_pos));
                let b = direction(&(scenario.users[&second] - sat_pos));
                let (Some(a), Some(b)) = (a, b) else {
                    // Already reported as degenerate above
                    continue;
                };
                let angle_deg = degrees_between(&a, &b);
                if angle_deg < MIN_SEPARATION_DEG - ANGLE_TOLERANCE_DEG {
                    violations.push(Violation::TooClose {
                        sat,
                        channel,
                        first,
                        second,
                        angle_deg,
                    });
                }
            }
        }
    }

    let served = assignment.len();
    let total_users = scenario.users.len();
    let coverage = coverage(served, total_users);
    if coverage < scenario.min_coverage {
        violations.push(Violation::InsufficientCoverage {
            coverage,
            required: scenario.min_coverage,
        });
    }

    ValidationReport {
        served,
        total_users,
        coverage,
        violations,
    }
}

fn direction(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    v.try_normalize(0.0)
}

fn degrees_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
}
