//! Seeded fuzz targets
//!
//! Each target draws a scenario from its case seed, runs the planner and
//! checks the outcome. The same seed always rebuilds the same scenario.

use crate::generators::{random_crowded_scenario, random_scenario};
use crate::runner::{FuzzConfig, FuzzResult, FuzzRunner};
use beam_planner::{
    solve, solve_with_stats, validate, Assignment, PlannerConfig, SatId, Scenario, UserId,
    MAX_USERS_PER_SAT,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use tracing::info;

pub type CheckFn = fn(&FuzzConfig, u64) -> Result<(), String>;

/// A named property checked once per case
#[derive(Clone, Copy)]
pub struct FuzzTarget {
    pub name: &'static str,
    pub description: &'static str,
    pub check: CheckFn,
}

pub fn all_targets() -> Vec<FuzzTarget> {
    vec![
        FuzzTarget {
            name: "assignment_invariants",
            description: "Every solution passes the validator",
            check: check_assignment_invariants,
        },
        FuzzTarget {
            name: "crowded_capacity",
            description: "A crowded satellite never serves more than 32 users",
            check: check_crowded_capacity,
        },
        FuzzTarget {
            name: "seeded_determinism",
            description: "Same inputs and seed give the same assignment",
            check: check_seeded_determinism,
        },
        FuzzTarget {
            name: "id_offset_invariance",
            description: "Shifting every id shifts the assignment and nothing else",
            check: check_id_offset_invariance,
        },
        FuzzTarget {
            name: "stage_accounting",
            description: "Stage counts add up to the served total",
            check: check_stage_accounting,
        },
    ]
}

pub fn find_target(name: &str) -> Option<FuzzTarget> {
    all_targets().into_iter().find(|t| t.name == name)
}

/// Run `targets` on `runner`, one result per target
pub fn run_targets(runner: &mut FuzzRunner, targets: &[FuzzTarget]) {
    for target in targets {
        let config = runner.config().clone();
        info!("Running {} ({} cases)", target.name, config.cases);
        let check = target.check;
        let result = runner.run(target.name, |seed| check(&config, seed));
        info!(
            "{}: {} passed, {} failed",
            result.name, result.cases_passed, result.cases_failed
        );
    }
}

/// Run every target with `config` and collect the results
pub fn run_all(config: FuzzConfig) -> Vec<FuzzResult> {
    let mut runner = FuzzRunner::new(config);
    run_targets(&mut runner, &all_targets());
    runner.into_results()
}

// ============================================================================
// Checks
// ============================================================================

fn sized_scenario(config: &FuzzConfig, rng: &mut StdRng) -> Scenario {
    let n_users = rng.gen_range(0..=config.max_users);
    let n_sats = rng.gen_range(0..=config.max_sats);
    random_scenario(rng, n_users, n_sats)
}

fn solve_seeded(scenario: &Scenario, seed: u64) -> Result<Assignment, String> {
    let mut rng = StdRng::seed_from_u64(seed);
    solve(&scenario.users, &scenario.sats, &mut rng).map_err(|e| e.to_string())
}

fn expect_valid(scenario: &Scenario, assignment: &Assignment) -> Result<(), String> {
    let report = validate(scenario, assignment);
    if report.is_valid() {
        return Ok(());
    }
    let messages: Vec<String> = report.violations.iter().map(|v| v.to_string()).collect();
    Err(format!(
        "{} users, {} sats: {}",
        scenario.users.len(),
        scenario.sats.len(),
        messages.join("; ")
    ))
}

fn check_assignment_invariants(config: &FuzzConfig, seed: u64) -> Result<(), String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let scenario = sized_scenario(config, &mut rng);
    let assignment = solve_seeded(&scenario, seed)?;
    expect_valid(&scenario, &assignment)
}

fn check_crowded_capacity(config: &FuzzConfig, seed: u64) -> Result<(), String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let upper = config.max_users.max(MAX_USERS_PER_SAT + 1);
    let n_users = rng.gen_range(MAX_USERS_PER_SAT + 1..=upper);
    let scenario = random_crowded_scenario(&mut rng, n_users);

    let assignment = solve_seeded(&scenario, seed)?;
    if assignment.len() > MAX_USERS_PER_SAT {
        return Err(format!("{} users served by one satellite", assignment.len()));
    }
    expect_valid(&scenario, &assignment)
}

fn check_seeded_determinism(config: &FuzzConfig, seed: u64) -> Result<(), String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let scenario = sized_scenario(config, &mut rng);

    let first = solve_seeded(&scenario, seed)?;
    let second = solve_seeded(&scenario, seed)?;
    if first != second {
        return Err(format!(
            "two runs differ ({} vs {} served)",
            first.len(),
            second.len()
        ));
    }
    Ok(())
}

fn check_id_offset_invariance(config: &FuzzConfig, seed: u64) -> Result<(), String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let scenario = sized_scenario(config, &mut rng);
    let offset = rng.gen_range(1i64..10_000);

    let shifted = Scenario {
        min_coverage: scenario.min_coverage,
        users: shift(&scenario.users, |id: &UserId| UserId(id.0 + offset)),
        sats: shift(&scenario.sats, |id: &SatId| SatId(id.0 + offset)),
    };

    let base = solve_seeded(&scenario, seed)?;
    let moved = solve_seeded(&shifted, seed)?;

    let expected: Assignment = base
        .iter()
        .map(|(user, beam)| {
            let mut beam = *beam;
            beam.sat = SatId(beam.sat.0 + offset);
            (UserId(user.0 + offset), beam)
        })
        .collect();
    if moved != expected {
        return Err(format!("assignment changed under id offset {}", offset));
    }
    Ok(())
}

fn shift<K: Ord, V: Clone>(map: &BTreeMap<K, V>, rekey: impl Fn(&K) -> K) -> BTreeMap<K, V> {
    map.iter().map(|(k, v)| (rekey(k), v.clone())).collect()
}

fn check_stage_accounting(config: &FuzzConfig, seed: u64) -> Result<(), String> {
    let mut rng = StdRng::seed_from_u64(seed);
    let scenario = sized_scenario(config, &mut rng);

    let mut solve_rng = StdRng::seed_from_u64(seed);
    let (assignment, stats) = solve_with_stats(
        &scenario.users,
        &scenario.sats,
        &PlannerConfig::default(),
        &mut solve_rng,
    )
    .map_err(|e| e.to_string())?;

    if stats.served != assignment.len() {
        return Err(format!(
            "stats report {} served, assignment has {}",
            stats.served,
            assignment.len()
        ));
    }
    if stats.pruned_beams > stats.users || stats.pruned_beams > stats.viable_beams {
        return Err(format!(
            "{} beams after pruning ({} users, {} viable)",
            stats.pruned_beams, stats.users, stats.viable_beams
        ));
    }
    let remaining = stats
        .pruned_beams
        .checked_sub(stats.interference_drops + stats.capacity_drops);
    if remaining != Some(stats.served) {
        return Err(format!(
            "{} pruned - {} interference - {} capacity != {} served",
            stats.pruned_beams, stats.interference_drops, stats.capacity_drops, stats.served
        ));
    }
    Ok(())
}
