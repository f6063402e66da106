//! Scenario loading
//!
//! Scenarios are plain text, one directive per line:
//!
//! ```text
//! # comment
//! min_coverage 0.95
//! sat 1 6921.0 0.0 0.0
//! user 1 6371.0 0.0 0.0
//! ```
//!
//! Anything after `#` is ignored, as are blank lines. Any other leading
//! token is rejected before solving starts.

use crate::{PlannerError, Position, Result, SatId, UserId};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};
use tracing::info;

/// Coverage required when a scenario does not say
pub const DEFAULT_MIN_COVERAGE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Served fraction required for acceptance (0-1)
    pub min_coverage: f64,
    pub users: BTreeMap<UserId, Position>,
    pub sats: BTreeMap<SatId, Position>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            min_coverage: DEFAULT_MIN_COVERAGE,
            users: BTreeMap::new(),
            sats: BTreeMap::new(),
        }
    }
}

impl Scenario {
    /// Parse scenario text
    pub fn parse(text: &str) -> Result<Self> {
        let mut scenario = Scenario::default();

        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let content = raw.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            let mut tokens = content.split_whitespace();
            let Some(directive) = tokens.next() else {
                continue;
            };

            match directive {
                "min_coverage" => {
                    scenario.min_coverage = parse_f64(&mut tokens, line, "min_coverage", "value")?;
                }
                "sat" => {
                    let (id, pos) = parse_node(&mut tokens, line, "sat")?;
                    if scenario.sats.insert(SatId(id), pos).is_some() {
                        return Err(PlannerError::DuplicateId {
                            line,
                            kind: "sat",
                            id,
                        });
                    }
                }
                "user" => {
                    let (id, pos) = parse_node(&mut tokens, line, "user")?;
                    if scenario.users.insert(UserId(id), pos).is_some() {
                        return Err(PlannerError::DuplicateId {
                            line,
                            kind: "user",
                            id,
                        });
                    }
                }
                other => {
                    return Err(PlannerError::InvalidToken {
                        line,
                        token: other.to_string(),
                    });
                }
            }
        }

        Ok(scenario)
    }

    /// Load a scenario file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading scenario from {:?}", path);

        let text = fs::read_to_string(path)?;
        let scenario = Self::parse(&text)?;

        info!(
            "Loaded {} users and {} sats (min coverage {:.2}%)",
            scenario.users.len(),
            scenario.sats.len(),
            scenario.min_coverage * 100.0
        );

        Ok(scenario)
    }
}

impl FromStr for Scenario {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Writes the scenario back in directive form
impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "min_coverage {}", self.min_coverage)?;
        for (id, p) in &self.sats {
            writeln!(f, "sat {} {} {} {}", id, p.x, p.y, p.z)?;
        }
        for (id, p) in &self.users {
            writeln!(f, "user {} {} {} {}", id, p.x, p.y, p.z)?;
        }
        Ok(())
    }
}

fn parse_node(
    tokens: &mut SplitWhitespace<'_>,
    line: usize,
    directive: &'static str,
) -> Result<(i64, Position)> {
    let raw_id = tokens.next().ok_or(PlannerError::MissingField {
        line,
        directive,
        field: "id",
    })?;
    let id = raw_id.parse::<i64>().map_err(|_| PlannerError::InvalidNumber {
        line,
        value: raw_id.to_string(),
    })?;

    let x = parse_f64(tokens, line, directive, "x coordinate")?;
    let y = parse_f64(tokens, line, directive, "y coordinate")?;
    let z = parse_f64(tokens, line, directive, "z coordinate")?;

    Ok((id, Position::new(x, y, z)))
}

fn parse_f64(
    tokens: &mut SplitWhitespace<'_>,
    line: usize,
    directive: &'static str,
    field: &'static str,
) -> Result<f64> {
    let raw = tokens.next().ok_or(PlannerError::MissingField {
        line,
        directive,
        field,
    })?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(PlannerError::InvalidNumber {
            line,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"
# Two sats, three users
min_coverage 0.75

sat 1 0 0 6921   # overhead
sat 2 6921 0 0
user 0 0 0 6371
user 1 10.5 -3.25 6370.9
user 2 6371 0 0
"#;

    #[test]
    fn test_parse_sample() {
        let scenario = Scenario::parse(SAMPLE).unwrap();
        assert_eq!(scenario.min_coverage, 0.75);
        assert_eq!(scenario.sats.len(), 2);
        assert_eq!(scenario.users.len(), 3);
        assert_eq!(scenario.sats[&SatId(1)], Position::new(0.0, 0.0, 6921.0));
        assert_eq!(scenario.users[&UserId(1)], Position::new(10.5, -3.25, 6370.9));
    }

    #[test]
    fn test_min_coverage_defaults_to_full() {
        let scenario: Scenario = "sat 0 0 0 1\n".parse().unwrap();
        assert_eq!(scenario.min_coverage, DEFAULT_MIN_COVERAGE);
        assert!(scenario.users.is_empty());
    }

    #[test]
    fn test_comments_and_blank_lines_only() {
        let scenario = Scenario::parse("\n   \n# nothing here\n\t# or here\n").unwrap();
        assert_eq!(scenario, Scenario::default());
    }

    #[test]
    fn test_invalid_token() {
        let err = Scenario::parse("sat 1 0 0 1\nground 2 0 0 1\n").unwrap_err();
        match err {
            PlannerError::InvalidToken { line, token } => {
                assert_eq!(line, 2);
                assert_eq!(token, "ground");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_coordinate() {
        let err = Scenario::parse("user 4 1.0 2.0\n").unwrap_err();
        assert!(matches!(
            err,
            PlannerError::MissingField {
                line: 1,
                directive: "user",
                field: "z coordinate"
            }
        ));
    }

    #[test]
    fn test_bad_numbers() {
        assert!(matches!(
            Scenario::parse("sat one 0 0 1").unwrap_err(),
            PlannerError::InvalidNumber { line: 1, .. }
        ));
        assert!(matches!(
            Scenario::parse("user 1 0 nan 1").unwrap_err(),
            PlannerError::InvalidNumber { .. }
        ));
        assert!(matches!(
            Scenario::parse("min_coverage lots").unwrap_err(),
            PlannerError::InvalidNumber { .. }
        ));
    }

    #[test]
    fn test_duplicate_id() {
        let err = Scenario::parse("user 1 0 0 1\nuser 1 0 0 2\n").unwrap_err();
        assert!(matches!(
            err,
            PlannerError::DuplicateId {
                line: 2,
                kind: "user",
                id: 1
            }
        ));
        // Same id for a user and a sat is fine
        assert!(Scenario::parse("user 1 0 0 1\nsat 1 0 0 2\n").is_ok());
    }

    #[test]
    fn test_display_parses_back() {
        let scenario = Scenario::parse(SAMPLE).unwrap();
        let reparsed = Scenario::parse(&scenario.to_string()).unwrap();
        assert_eq!(reparsed, scenario);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let scenario = Scenario::load(file.path()).unwrap();
        assert_eq!(scenario.users.len(), 3);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Scenario::load("/nonexistent/scenario.txt").unwrap_err();
        assert!(matches!(err, PlannerError::Io(_)));
    }

    #[test]
    fn test_bundled_scenarios_parse() {
        let ring = Scenario::parse(include_str!("../../../data/scenarios/single_sat_40_users.txt"))
            .unwrap();
        assert_eq!(ring.users.len(), 40);
        assert_eq!(ring.sats.len(), 1);
        assert_eq!(ring.min_coverage, 0.8);

        let leo = Scenario::parse(include_str!("../../../data/scenarios/leo_shell_small.txt"))
            .unwrap();
        assert_eq!(leo.users.len(), 300);
        assert_eq!(leo.sats.len(), 25);
    }
}
