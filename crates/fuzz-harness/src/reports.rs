//! Fuzz run reporting and export
//!
//! Text, JSON, JUnit XML and Markdown renderings of a set of fuzz results,
//! for the terminal and for CI.

use crate::runner::FuzzResult;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
use std::process::Command;

/// Failures listed per target in Markdown output
const MARKDOWN_FAILURES: usize = 3;

/// Full run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzReport {
    /// Report timestamp (Unix ms)
    pub timestamp_ms: i64,
    /// Version of the planner under test
    pub planner_version: String,
    /// Base seed of the run, when known
    pub seed: Option<u64>,
    pub git_commit: Option<String>,
    pub git_branch: Option<String>,
    /// "CI" or "local"
    pub environment: String,
    pub total_duration_ms: u64,
    pub results: Vec<FuzzResult>,
    pub summary: ReportSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_tests: u32,
    pub tests_passed: u32,
    pub tests_failed: u32,
    pub total_cases: u64,
    pub cases_passed: u64,
    pub cases_failed: u64,
    /// Mean cases per second across targets
    pub avg_throughput: f64,
    /// Passed fraction of all cases (0-1)
    pub pass_rate: f64,
}

impl ReportSummary {
    fn from_results(results: &[FuzzResult]) -> Self {
        let total_tests = results.len() as u32;
        let tests_passed = results.iter().filter(|r| r.passed).count() as u32;

        let total_cases: u64 = results.iter().map(|r| r.cases_run).sum();
        let cases_passed: u64 = results.iter().map(|r| r.cases_passed).sum();

        let avg_throughput = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.throughput).sum::<f64>() / results.len() as f64
        };
        let pass_rate = if total_cases == 0 {
            0.0
        } else {
            cases_passed as f64 / total_cases as f64
        };

        Self {
            total_tests,
            tests_passed,
            tests_failed: total_tests - tests_passed,
            total_cases,
            cases_passed,
            cases_failed: results.iter().map(|r| r.cases_failed).sum(),
            avg_throughput,
            pass_rate,
        }
    }
}

impl FuzzReport {
    pub fn new(results: Vec<FuzzResult>) -> Self {
        Self {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            planner_version: env!("CARGO_PKG_VERSION").to_string(),
            seed: None,
            git_commit: git_output(&["rev-parse", "--short", "HEAD"]),
            git_branch: git_output(&["branch", "--show-current"]),
            environment: environment_name(),
            total_duration_ms: results.iter().map(|r| r.duration_ms).sum(),
            summary: ReportSummary::from_results(&results),
            results,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn all_passed(&self) -> bool {
        self.summary.tests_failed == 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Single-line JSON (for CI)
    pub fn to_json_compact(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// JUnit XML: one suite per target, failures attached to its test case
    pub fn to_junit_xml(&self) -> String {
        let mut xml = String::new();
        self.write_junit(&mut xml).expect("writing to a String");
        xml
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        self.write_markdown(&mut md).expect("writing to a String");
        md
    }

    /// Print to console
    pub fn print(&self) {
        println!("{}", self.to_markdown());
    }

    fn write_junit(&self, out: &mut impl Write) -> fmt::Result {
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            out,
            r#"<testsuites tests="{}" failures="{}" time="{:.3}">"#,
            self.summary.total_cases,
            self.summary.cases_failed,
            seconds(self.total_duration_ms)
        )?;

        for result in &self.results {
            let name = escape_xml(&result.name);
            let time = seconds(result.duration_ms);
            writeln!(
                out,
                r#"  <testsuite name="{}" tests="{}" failures="{}" time="{:.3}">"#,
                name, result.cases_run, result.cases_failed, time
            )?;

            if result.failures.is_empty() {
                writeln!(out, r#"    <testcase name="{}" time="{:.3}"/>"#, name, time)?;
            } else {
                writeln!(out, r#"    <testcase name="{}" time="{:.3}">"#, name, time)?;
                for failure in &result.failures {
                    writeln!(
                        out,
                        r#"      <failure message="{}">{}</failure>"#,
                        escape_xml(&failure.message),
                        escape_xml(failure.input.as_deref().unwrap_or(""))
                    )?;
                }
                writeln!(out, "    </testcase>")?;
            }

            writeln!(out, "  </testsuite>")?;
        }

        writeln!(out, "</testsuites>")
    }

    fn write_markdown(&self, out: &mut impl Write) -> fmt::Result {
        writeln!(out, "# Beam Planner Fuzz Report\n")?;
        if let Some(date) = chrono::DateTime::from_timestamp_millis(self.timestamp_ms) {
            writeln!(out, "**Date:** {}", date.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        writeln!(out, "**Planner:** {}", self.planner_version)?;
        if let Some(seed) = self.seed {
            writeln!(out, "**Seed:** {}", seed)?;
        }
        if let Some(commit) = &self.git_commit {
            writeln!(out, "**Commit:** `{}`", commit)?;
        }
        if let Some(branch) = &self.git_branch {
            writeln!(out, "**Branch:** `{}`", branch)?;
        }
        writeln!(out, "**Environment:** {}\n", self.environment)?;

        let s = &self.summary;
        writeln!(out, "## Summary\n")?;
        writeln!(out, "| Metric | Value |")?;
        writeln!(out, "|--------|-------|")?;
        writeln!(
            out,
            "| Targets | {} ({} passed, {} failed) |",
            s.total_tests, s.tests_passed, s.tests_failed
        )?;
        writeln!(
            out,
            "| Cases | {} ({} passed, {} failed) |",
            s.total_cases, s.cases_passed, s.cases_failed
        )?;
        writeln!(out, "| Pass Rate | {:.2}% |", s.pass_rate * 100.0)?;
        writeln!(out, "| Throughput | {:.0} cases/sec |", s.avg_throughput)?;
        writeln!(out, "| Duration | {} ms |\n", self.total_duration_ms)?;

        writeln!(out, "## Results\n")?;
        writeln!(out, "| Target | Cases | Passed | Failed | Status |")?;
        writeln!(out, "|--------|-------|--------|--------|--------|")?;
        for r in &self.results {
            writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                r.name,
                r.cases_run,
                r.cases_passed,
                r.cases_failed,
                if r.passed { "✓" } else { "✗" }
            )?;
        }

        let failed: Vec<_> = self.results.iter().filter(|r| !r.passed).collect();
        if failed.is_empty() {
            return Ok(());
        }

        writeln!(out, "\n## Failures\n")?;
        for r in failed {
            writeln!(out, "### {}\n", r.name)?;
            for (i, failure) in r.failures.iter().take(MARKDOWN_FAILURES).enumerate() {
                writeln!(out, "{}. `{}`", i + 1, failure.message)?;
                if let Some(input) = &failure.input {
                    writeln!(out, "   - Input: `{}`", input)?;
                }
            }
            if r.failures.len() > MARKDOWN_FAILURES {
                writeln!(out, "   - ... and {} more", r.failures.len() - MARKDOWN_FAILURES)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn environment_name() -> String {
    if std::env::var("CI").is_ok() {
        "CI".to_string()
    } else {
        "local".to_string()
    }
}

fn seconds(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::{FuzzFailure, FuzzResult};

    fn sample() -> FuzzReport {
        let mut ok = FuzzResult::new("assignment_invariants");
        for _ in 0..10 {
            ok.record_pass();
        }
        ok.duration_ms = 500;
        ok.throughput = 20.0;

        let mut bad = FuzzResult::new("seeded_determinism");
        for _ in 0..9 {
            bad.record_pass();
        }
        bad.record_fail(FuzzFailure {
            message: "Users 1 & 2 <too close>".to_string(),
            input: Some("case 3 seed 3".to_string()),
            shrunk: false,
        });
        bad.duration_ms = 1500;
        bad.throughput = 40.0;

        FuzzReport::new(vec![ok, bad])
    }

    #[test]
    fn test_report_summary() {
        let report = sample();

        assert_eq!(report.summary.total_tests, 2);
        assert_eq!(report.summary.tests_failed, 1);
        assert_eq!(report.summary.total_cases, 20);
        assert_eq!(report.summary.cases_failed, 1);
        assert!((report.summary.pass_rate - 0.95).abs() < 1e-12);
        assert!((report.summary.avg_throughput - 30.0).abs() < 1e-12);
        assert_eq!(report.total_duration_ms, 2000);
    }

    #[test]
    fn test_junit_escapes_failures() {
        let xml = sample().to_junit_xml();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<testsuites tests=\"20\" failures=\"1\" time=\"2.000\">"));
        assert!(xml.contains("Users 1 &amp; 2 &lt;too close&gt;"));
    }

    #[test]
    fn test_markdown_lists_failures() {
        let md = sample().to_markdown();
        assert!(md.contains("| Pass Rate | 95.00% |"));
        assert!(md.contains("### seeded_determinism"));
        assert!(!md.contains("### assignment_invariants"));
    }

    #[test]
    fn test_json_round_trip() {
        let report = sample();
        let back: FuzzReport = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(back.results.len(), 2);
        assert!(!report.to_json_compact().unwrap().contains('\n'));
    }

    #[test]
    fn test_seed_in_markdown() {
        let md = sample().with_seed(1234).to_markdown();
        assert!(md.contains("**Seed:** 1234"));
        assert!(!sample().all_passed());
    }

    #[test]
    fn test_empty_report() {
        let report = FuzzReport::new(Vec::new());
        assert_eq!(report.summary.pass_rate, 0.0);
        assert_eq!(report.summary.avg_throughput, 0.0);
    }
}
