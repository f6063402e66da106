//! Directional ranking
//!
//! Orders positions by a scaled dot product with the all-ones basis vector:
//!
//! ```text
//! key(p) = p.x / s.x + p.y / s.y + p.z / s.z
//! s.k    = max(1, max |p.k| over the batch)
//! ```
//!
//! The order only fixes traversal and tie-breaks for later stages; it
//! carries no correctness guarantee.

use crate::Position;
use nalgebra::Vector3;
use tracing::debug;

/// Position index with its sort key
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub index: usize,
    pub key: f64,
}

/// Per-axis scale: largest absolute coordinate, floored at 1
pub fn axis_scale(positions: &[Position]) -> Vector3<f64> {
    positions.iter().fold(Vector3::repeat(1.0), |scale, p| {
        Vector3::new(
            scale.x.max(p.x.abs()),
            scale.y.max(p.y.abs()),
            scale.z.max(p.z.abs()),
        )
    })
}

/// Rank positions descending by scaled directional key
///
/// Equal keys keep their input order.
pub fn rank(positions: &[Position]) -> Vec<Ranked> {
    let scale = axis_scale(positions);
    let basis = Vector3::repeat(1.0);

    let mut ranked: Vec<Ranked> = positions
        .iter()
        .enumerate()
        .map(|(index, p)| Ranked {
            index,
            key: p.component_div(&scale).dot(&basis),
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.key.total_cmp(&a.key));

    debug!(
        "Ranked {} positions (scale {:.3}, {:.3}, {:.3})",
        ranked.len(),
        scale.x,
        scale.y,
        scale.z
    );

    ranked
}

/// Indices only, in ranked order
pub fn ranked_order(positions: &[Position]) -> Vec<usize> {
    rank(positions).into_iter().map(|r| r.index).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_scale_floors_at_one() {
        let positions = vec![Position::new(0.5, -0.25, 0.0), Position::new(-0.1, 0.2, 0.3)];
        assert_eq!(axis_scale(&positions), Vector3::new(1.0, 1.0, 1.0));

        let positions = vec![Position::new(-8.0, 2.0, 0.5), Position::new(4.0, -3.0, 0.1)];
        assert_eq!(axis_scale(&positions), Vector3::new(8.0, 3.0, 1.0));
    }

    #[test]
    fn test_rank_descending_by_scaled_key() {
        let positions = vec![
            Position::new(-10.0, 0.0, 0.0), // key -1.0
            Position::new(10.0, 5.0, 0.0),  // key 1.0 + 0.5
            Position::new(0.0, 10.0, 0.0),  // key 1.0
        ];
        let ranked = rank(&positions);
        let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
        assert!((ranked[0].key - 1.5).abs() < 1e-12);
        assert!((ranked[2].key + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rank_ties_keep_input_order() {
        let positions = vec![
            Position::new(1.0, 0.0, 0.0),
            Position::new(0.0, 1.0, 0.0),
            Position::new(0.0, 0.0, 1.0),
            Position::new(2.0, 2.0, 2.0),
        ];
        // Scale (2, 2, 2): first three tie at 0.5, last is 3.0
        assert_eq!(ranked_order(&positions), vec![3, 0, 1, 2]);
    }

    #[test]
    fn test_rank_with_nan_keys_still_orders() {
        let positions: Vec<Position> = (0..64)
            .map(|i| {
                let x = if i % 7 == 0 { f64::NAN } else { i as f64 };
                Position::new(x, 1.0, 2.0)
            })
            .collect();
        let mut order = ranked_order(&positions);
        assert_eq!(order.len(), 64);
        order.sort_unstable();
        assert_eq!(order, (0..64).collect::<Vec<_>>());
    }

    #[test]
    fn test_rank_empty() {
        assert!(rank(&[]).is_empty());
    }

    #[test]
    fn test_rank_is_deterministic() {
        let positions: Vec<Position> = (0..50)
            .map(|i| {
                let t = i as f64 * 0.37;
                Position::new(t.cos() * 7000.0, t.sin() * 7000.0, (t * 0.5).sin() * 300.0)
            })
            .collect();
        assert_eq!(rank(&positions), rank(&positions));
    }
}
