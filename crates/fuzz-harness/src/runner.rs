//! Fuzz test runner
//!
//! Each case gets its own seed derived from the run seed, so any failure can
//! be replayed from the `input` it records.

use proptest::test_runner::RngSeed;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// ============================================================================
// Configuration
// ============================================================================

/// Fuzz test configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzConfig {
    /// Number of test cases to run per target
    pub cases: u64,
    /// Maximum shrink iterations on failure (proptest runs)
    pub max_shrink_iters: u32,
    /// Cases slower than this are logged
    pub slow_case_ms: u64,
    /// Base seed every case seed derives from; 0 is an ordinary seed
    pub seed: u64,
    /// Upper bound on users in a generated scenario
    pub max_users: usize,
    /// Upper bound on satellites in a generated scenario
    pub max_sats: usize,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            cases: 1_000,
            max_shrink_iters: 1000,
            slow_case_ms: 5000,
            seed: 0,
            max_users: 200,
            max_sats: 12,
        }
    }
}

impl FuzzConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cases(mut self, n: u64) -> Self {
        self.cases = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = s;
        self
    }

    pub fn max_shrink_iters(mut self, n: u32) -> Self {
        self.max_shrink_iters = n;
        self
    }

    pub fn slow_case_ms(mut self, ms: u64) -> Self {
        self.slow_case_ms = ms;
        self
    }

    pub fn max_users(mut self, n: usize) -> Self {
        self.max_users = n;
        self
    }

    pub fn max_sats(mut self, n: usize) -> Self {
        self.max_sats = n;
        self
    }

    /// Seed for case `i` of a run
    pub fn case_seed(&self, i: u64) -> u64 {
        self.seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(i)
    }

    /// Generate proptest config from this, seeded with `seed`
    pub fn to_proptest_config(&self) -> proptest::test_runner::Config {
        proptest::test_runner::Config {
            cases: u32::try_from(self.cases).unwrap_or(u32::MAX),
            max_shrink_iters: self.max_shrink_iters,
            rng_seed: RngSeed::Fixed(self.seed),
            ..proptest::test_runner::Config::default()
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Result of a fuzz test run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzResult {
    pub name: String,
    pub cases_run: u64,
    pub cases_passed: u64,
    pub cases_failed: u64,
    pub duration_ms: u64,
    /// Cases per second
    pub throughput: f64,
    pub failures: Vec<FuzzFailure>,
    pub passed: bool,
}

impl FuzzResult {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cases_run: 0,
            cases_passed: 0,
            cases_failed: 0,
            duration_ms: 0,
            throughput: 0.0,
            failures: Vec::new(),
            passed: true,
        }
    }

    pub fn record_pass(&mut self) {
        self.cases_run += 1;
        self.cases_passed += 1;
    }

    pub fn record_fail(&mut self, failure: FuzzFailure) {
        self.cases_run += 1;
        self.cases_failed += 1;
        self.passed = false;
        self.failures.push(failure);
    }

    pub fn finalize(&mut self, duration: Duration) {
        self.duration_ms = duration.as_millis() as u64;
        let secs = duration.as_secs_f64();
        if secs > 0.0 {
            self.throughput = self.cases_run as f64 / secs;
        }
    }

    /// Print summary to stdout
    pub fn print_summary(&self) {
        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║ Fuzz Test: {:<48} ║", self.name);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!(
            "║ Cases: {:>10} | Passed: {:>10} | Failed: {:>10} ║",
            self.cases_run, self.cases_passed, self.cases_failed
        );
        println!(
            "║ Duration: {:>7} ms | Throughput: {:>10.0} cases/sec   ║",
            self.duration_ms, self.throughput
        );
        println!(
            "║ Status: {:<52} ║",
            if self.passed { "✓ PASSED" } else { "✗ FAILED" }
        );
        println!("╚════════════════════════════════════════════════════════════╝");

        if !self.failures.is_empty() {
            println!("\nFailures:");
            for (i, f) in self.failures.iter().enumerate().take(5) {
                println!("  [{}] {}", i + 1, f.message);
                if let Some(ref input) = f.input {
                    println!("      Input: {}", input);
                }
            }
            if self.failures.len() > 5 {
                println!("  ... and {} more", self.failures.len() - 5);
            }
        }
    }
}

/// Details of a test failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzFailure {
    pub message: String,
    pub input: Option<String>,
    pub shrunk: bool,
}

// ============================================================================
// Runner
// ============================================================================

pub struct FuzzRunner {
    config: FuzzConfig,
    results: Vec<FuzzResult>,
}

impl FuzzRunner {
    pub fn new(config: FuzzConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(FuzzConfig::default())
    }

    pub fn config(&self) -> &FuzzConfig {
        &self.config
    }

    /// Run `test_fn` once per case, passing each case its seed
    pub fn run<F>(&mut self, name: &str, test_fn: F) -> &FuzzResult
    where
        F: Fn(u64) -> Result<(), String>,
    {
        let mut result = FuzzResult::new(name);
        let slow = Duration::from_millis(self.config.slow_case_ms);
        let start = Instant::now();

        for i in 0..self.config.cases {
            let seed = self.config.case_seed(i);
            let case_start = Instant::now();
            let outcome = test_fn(seed);
            let elapsed = case_start.elapsed();
            if elapsed > slow {
                warn!("{}: case {} took {} ms", name, i, elapsed.as_millis());
            }

            match outcome {
                Ok(()) => result.record_pass(),
                Err(msg) => {
                    debug!("{}: case {} failed: {}", name, i, msg);
                    result.record_fail(FuzzFailure {
                        message: msg,
                        input: Some(format!("case {} seed {}", i, seed)),
                        shrunk: false,
                    })
                }
            }
        }

        result.finalize(start.elapsed());
        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    pub fn results(&self) -> &[FuzzResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<FuzzResult> {
        self.results
    }

    /// Print summary of all tests
    pub fn print_all_summaries(&self) {
        for result in &self.results {
            result.print_summary();
            println!();
        }

        let total_cases: u64 = self.results.iter().map(|r| r.cases_run).sum();
        let total_passed: u64 = self.results.iter().map(|r| r.cases_passed).sum();
        let total_failed: u64 = self.results.iter().map(|r| r.cases_failed).sum();
        let all_passed = self.results.iter().all(|r| r.passed);

        println!("════════════════════════════════════════════════════════════════");
        println!(
            "TOTAL: {} tests, {} cases, {} passed, {} failed",
            self.results.len(),
            total_cases,
            total_passed,
            total_failed
        );
        println!(
            "OVERALL: {}",
            if all_passed { "✓ ALL PASSED" } else { "✗ SOME FAILED" }
        );
        println!("════════════════════════════════════════════════════════════════");
    }

    /// Export results to JSON
    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = FuzzConfig::default();
        assert_eq!(config.cases, 1_000);
        assert!(config.max_users > 0);
        assert_eq!(config.to_proptest_config().cases, 1_000);
    }

    #[test]
    fn test_case_seeds_differ() {
        let config = FuzzConfig::new().seed(42);
        assert_ne!(config.case_seed(0), config.case_seed(1));
        assert_eq!(config.case_seed(3), FuzzConfig::new().seed(42).case_seed(3));
    }

    #[test]
    fn test_zero_seed_is_deterministic() {
        let config = FuzzConfig::new().seed(0);
        assert_eq!(config.case_seed(5), 5);
        assert!(matches!(config.to_proptest_config().rng_seed, RngSeed::Fixed(0)));
        assert!(matches!(
            FuzzConfig::new().seed(9).to_proptest_config().rng_seed,
            RngSeed::Fixed(9)
        ));
    }

    #[test]
    fn test_runner_basic() {
        let mut runner = FuzzRunner::new(FuzzConfig::new().cases(250));

        let result = runner.run("test_always_pass", |_| Ok(()));
        assert!(result.passed);
        assert_eq!(result.cases_passed, 250);
    }

    #[test]
    fn test_runner_with_failures() {
        let config = FuzzConfig::new().cases(100);
        let mut runner = FuzzRunner::new(config);

        // Seed 0 gives case seeds 0..100
        let result = runner.run("test_some_fail", |seed| {
            if seed % 10 == 0 {
                Err(format!("Failed at {}", seed))
            } else {
                Ok(())
            }
        });

        assert!(!result.passed);
        assert_eq!(result.cases_failed, 10);
        assert_eq!(result.cases_passed, 90);
        assert_eq!(result.failures[1].input.as_deref(), Some("case 10 seed 10"));
    }

    #[test]
    fn test_export_json() {
        let mut runner = FuzzRunner::new(FuzzConfig::new().cases(3));
        runner.run("json", |_| Ok(()));
        let json = runner.export_json().unwrap();
        let back: Vec<FuzzResult> = serde_json::from_str(&json).unwrap();
        assert_eq!(back[0].cases_run, 3);
    }
}
