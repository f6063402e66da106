//! Geometric primitives
//!
//! Positions are `nalgebra` vectors in a common Cartesian frame centred on
//! the Earth. Every normalization goes through [`unit`], which rejects
//! zero-length and non-finite vectors instead of producing NaN.

use crate::{PlannerError, Result};
use nalgebra::Vector3;

/// Cartesian position (any consistent length unit)
pub type Position = Vector3<f64>;

/// Unit vector in the direction of `v`
pub fn unit(v: &Position) -> Result<Position> {
    let mag = v.norm();
    if !mag.is_finite() || mag == 0.0 {
        return Err(PlannerError::DegenerateGeometry(format!(
            "cannot normalize vector ({:.3}, {:.3}, {:.3})",
            v.x, v.y, v.z
        )));
    }
    Ok(v / mag)
}

/// Angle in degrees between `(a - apex)` and `(c - apex)`
///
/// ```text
///   a       c
///    \     /
///     \   /
///      \ /
///     apex
/// ```
pub fn angle_between(apex: &Position, a: &Position, c: &Position) -> Result<f64> {
    let m = unit(&(a - apex))?;
    let n = unit(&(c - apex))?;
    Ok(angle_of_units(&m, &n))
}

/// Angle in degrees between two unit vectors
///
/// The dot product is clamped so rounding just past ±1 stays in the
/// arccosine domain.
pub fn angle_of_units(m: &Position, n: &Position) -> f64 {
    m.dot(n).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Angle between the user's local vertical and its direction to the satellite
pub fn off_boresight_deg(user: &Position, sat: &Position) -> Result<f64> {
    Ok(180.0 - angle_between(user, &Position::zeros(), sat)?)
}
