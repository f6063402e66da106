//! Scenario generators for property-based testing
//!
//! Ground users sit on a spherical Earth, satellites on a shell above it.
//! Every generated position is away from the origin and no satellite ever
//! shares a position with a user, so the solver's geometry is always defined.

use beam_planner::{Position, SatId, Scenario, UserId};
use proptest::prelude::*;
use rand::Rng;
use std::ops::Range;

/// Mean Earth radius (km)
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Latitude band the generated users and satellites share
pub const REGION_LAT_DEG: Range<f64> = 25.0..45.0;
/// Longitude band the generated users and satellites share
pub const REGION_LON_DEG: Range<f64> = -10.0..10.0;

/// Low Earth orbit altitudes (km)
pub const LEO_ALTITUDE_KM: Range<f64> = 400.0..1200.0;

/// Spherical coordinates to an Earth-centred position
pub fn geodetic_position(lat_deg: f64, lon_deg: f64, radius_km: f64) -> Position {
    let (lat, lon) = (lat_deg.to_radians(), lon_deg.to_radians());
    Position::new(
        radius_km * lat.cos() * lon.cos(),
        radius_km * lat.cos() * lon.sin(),
        radius_km * lat.sin(),
    )
}

/// Build a scenario with ids counted up from `first_id`
pub fn build_scenario(
    users: Vec<Position>,
    sats: Vec<Position>,
    first_id: i64,
    min_coverage: f64,
) -> Scenario {
    Scenario {
        min_coverage,
        users: (first_id..).map(UserId).zip(users).collect(),
        sats: (first_id..).map(SatId).zip(sats).collect(),
    }
}

// ============================================================================
// Position Strategies
// ============================================================================

pub fn latitude_deg() -> impl Strategy<Value = f64> {
    REGION_LAT_DEG
}

pub fn longitude_deg() -> impl Strategy<Value = f64> {
    REGION_LON_DEG
}

pub fn altitude_km() -> impl Strategy<Value = f64> {
    LEO_ALTITUDE_KM
}

/// User on the ground inside the region
pub fn ground_user() -> impl Strategy<Value = Position> {
    (latitude_deg(), longitude_deg())
        .prop_map(|(lat, lon)| geodetic_position(lat, lon, EARTH_RADIUS_KM))
}

/// Satellite in low orbit over the region
pub fn leo_satellite() -> impl Strategy<Value = Position> {
    (latitude_deg(), longitude_deg(), altitude_km())
        .prop_map(|(lat, lon, alt)| geodetic_position(lat, lon, EARTH_RADIUS_KM + alt))
}

/// Users packed within a fraction of a degree of each other, so that
/// same-channel beams collide
pub fn user_cluster(max_users: usize) -> impl Strategy<Value = Vec<Position>> {
    (
        latitude_deg(),
        longitude_deg(),
        prop::collection::vec((-0.3f64..0.3, -0.3f64..0.3), 1..=max_users),
    )
        .prop_map(|(lat, lon, offsets)| {
            offsets
                .into_iter()
                .map(|(dlat, dlon)| geodetic_position(lat + dlat, lon + dlon, EARTH_RADIUS_KM))
                .collect()
        })
}

/// Non-zero vector with components in a bounded range
pub fn nonzero_vector() -> impl Strategy<Value = Position> {
    (-1e4f64..1e4, -1e4f64..1e4, -1e4f64..1e4)
        .prop_map(|(x, y, z)| Position::new(x, y, z))
        .prop_filter("vector must have length", |v| v.norm() > 1e-3)
}

// ============================================================================
// Scenario Strategies
// ============================================================================

/// Id offset: zero-based, one-based or arbitrary
pub fn first_id() -> impl Strategy<Value = i64> {
    prop_oneof![Just(0i64), Just(1i64), -1000i64..1000]
}

/// Scattered users under a handful of satellites, no coverage requirement
pub fn scenario(max_users: usize, max_sats: usize) -> impl Strategy<Value = Scenario> {
    (
        prop::collection::vec(ground_user(), 0..=max_users),
        prop::collection::vec(leo_satellite(), 0..=max_sats),
        first_id(),
    )
        .prop_map(|(users, sats, first)| build_scenario(users, sats, first, 0.0))
}

/// One satellite directly over a dense cluster of users
pub fn crowded_scenario(max_users: usize) -> impl Strategy<Value = Scenario> {
    (user_cluster(max_users), altitude_km(), first_id()).prop_map(|(users, alt, first)| {
        let centre = users
            .iter()
            .fold(Position::zeros(), |acc, p| acc + p)
            .normalize();
        let sat = centre * (EARTH_RADIUS_KM + alt);
        build_scenario(users, vec![sat], first, 0.0)
    })
}

// ============================================================================
// Seeded Generation (for the CLI runner)
// ============================================================================

/// Random scattered scenario drawn from `rng`
pub fn random_scenario<R: Rng + ?Sized>(rng: &mut R, n_users: usize, n_sats: usize) -> Scenario {
    let users = (0..n_users)
        .map(|_| {
            geodetic_position(
                rng.gen_range(REGION_LAT_DEG),
                rng.gen_range(REGION_LON_DEG),
                EARTH_RADIUS_KM,
            )
        })
        .collect();
    let sats = (0..n_sats)
        .map(|_| {
            geodetic_position(
                rng.gen_range(REGION_LAT_DEG),
                rng.gen_range(REGION_LON_DEG),
                EARTH_RADIUS_KM + rng.gen_range(LEO_ALTITUDE_KM),
            )
        })
        .collect();
    let first = rng.gen_range(-1000i64..1000);
    build_scenario(users, sats, first, 0.0)
}

/// Random single-satellite scenario with users packed under it
pub fn random_crowded_scenario<R: Rng + ?Sized>(rng: &mut R, n_users: usize) -> Scenario {
    let lat = rng.gen_range(REGION_LAT_DEG);
    let lon = rng.gen_range(REGION_LON_DEG);
    let users = (0..n_users)
        .map(|_| {
            geodetic_position(
                lat + rng.gen_range(-2.0..2.0),
                lon + rng.gen_range(-2.0..2.0),
                EARTH_RADIUS_KM,
            )
        })
        .collect();
    let sat = geodetic_position(lat, lon, EARTH_RADIUS_KM + rng.gen_range(LEO_ALTITUDE_KM));
    build_scenario(users, vec![sat], 0, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    proptest! {
        #[test]
        fn test_ground_user_on_surface(p in ground_user()) {
            prop_assert!((p.norm() - EARTH_RADIUS_KM).abs() < 1e-6);
        }

        #[test]
        fn test_satellite_above_surface(p in leo_satellite()) {
            let alt = p.norm() - EARTH_RADIUS_KM;
            prop_assert!(alt >= LEO_ALTITUDE_KM.start - 1e-6);
            prop_assert!(alt < LEO_ALTITUDE_KM.end + 1e-6);
        }

        #[test]
        fn test_scenario_ids_are_contiguous(s in scenario(20, 5)) {
            if let (Some(first), Some(last)) = (s.users.keys().next(), s.users.keys().last()) {
                prop_assert_eq!(last.0 - first.0 + 1, s.users.len() as i64);
            }
        }
    }

    #[test]
    fn test_geodetic_axes() {
        let p = geodetic_position(0.0, 0.0, 10.0);
        assert!((p - Position::new(10.0, 0.0, 0.0)).norm() < 1e-9);
        let q = geodetic_position(90.0, 0.0, 10.0);
        assert!((q - Position::new(0.0, 0.0, 10.0)).norm() < 1e-9);
    }

    #[test]
    fn test_random_scenario_is_seeded() {
        let a = random_scenario(&mut StdRng::seed_from_u64(7), 30, 4);
        let b = random_scenario(&mut StdRng::seed_from_u64(7), 30, 4);
        assert_eq!(a, b);
        assert_eq!(a.users.len(), 30);
        assert_eq!(a.sats.len(), 4);
    }
}
