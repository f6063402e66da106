//! Beam Planner Fuzz Harness
//!
//! Property-based testing infrastructure for the beam planner: scenario
//! generators, seeded fuzz targets that check every solution against the
//! independent validator, and a runner with CI-friendly reports.
//!
//! # Usage
//!
//! ```rust
//! use fuzz_harness::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn users_stay_on_the_ground(user in ground_user()) {
//!         prop_assert!(user.norm() > 6000.0);
//!     }
//! }
//! ```

pub mod generators;
pub mod reports;
pub mod runner;
pub mod targets;

pub mod prelude {
    pub use crate::generators::*;
    pub use crate::runner::{FuzzConfig, FuzzFailure, FuzzResult, FuzzRunner};
    pub use crate::targets::{all_targets, FuzzTarget};
    pub use proptest::prelude::*;
}

pub use proptest;
