//! Randomised coordinates around a reference point
//!
//! Used to synthesise demo and test point sets. Distances are converted to
//! degrees with a flat 1 km ≈ 0.009009° approximation, so the results are
//! only meaningful well away from the poles and the antimeridian. Nothing is
//! wrapped or clamped.

use rand::Rng;

use crate::core::{constants::DEGREES_PER_METER, geo::LatLng};

/// The six ways a jittered point can be displaced from its center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JitterDirection {
    NorthEast,
    SouthWest,
    NorthWest,
    SouthEast,
    West,
    South,
}

impl JitterDirection {
    pub const ALL: [JitterDirection; 6] = [
        JitterDirection::NorthEast,
        JitterDirection::SouthWest,
        JitterDirection::NorthWest,
        JitterDirection::SouthEast,
        JitterDirection::West,
        JitterDirection::South,
    ];

    /// Latitude and longitude signs of this direction
    pub fn signs(self) -> (f64, f64) {
        match self {
            JitterDirection::NorthEast => (1.0, 1.0),
            JitterDirection::SouthWest => (-1.0, -1.0),
            JitterDirection::NorthWest => (1.0, -1.0),
            JitterDirection::SouthEast => (-1.0, 1.0),
            JitterDirection::West => (0.0, -1.0),
            JitterDirection::South => (-1.0, 0.0),
        }
    }

    /// Applies a degree offset to `center` along this direction
    pub fn apply(self, center: LatLng, offset_degrees: f64) -> LatLng {
        let (lat_sign, lng_sign) = self.signs();
        center.offset(lat_sign * offset_degrees, lng_sign * offset_degrees)
    }
}

/// Converts a distance in meters to the approximate degree offset
pub fn meters_to_degrees(meters: f64) -> f64 {
    meters * DEGREES_PER_METER
}

/// Returns a random coordinate between `min_meters` and `max_meters` away
/// from `center`, using the thread-local generator.
pub fn jitter(center: LatLng, min_meters: u32, max_meters: u32) -> LatLng {
    jitter_with(&mut rand::thread_rng(), center, min_meters, max_meters)
}

/// Same as [`jitter`] with a caller-supplied random source
pub fn jitter_with<R: Rng + ?Sized>(
    rng: &mut R,
    center: LatLng,
    min_meters: u32,
    max_meters: u32,
) -> LatLng {
    let (low, high) = if min_meters <= max_meters {
        (min_meters, max_meters)
    } else {
        log::warn!(
            "jitter bounds reversed ({} > {}), swapping",
            min_meters,
            max_meters
        );
        (max_meters, min_meters)
    };

    let meters = rng.gen_range(low..=high);
    let direction = JitterDirection::ALL[rng.gen_range(0..JitterDirection::ALL.len())];
    direction.apply(center, meters_to_degrees(meters as f64))
}

/// Generates `count` jittered points around `center`
pub fn scatter(center: LatLng, count: usize, min_meters: u32, max_meters: u32) -> Vec<LatLng> {
    scatter_with(&mut rand::thread_rng(), center, count, min_meters, max_meters)
}

pub fn scatter_with<R: Rng + ?Sized>(
    rng: &mut R,
    center: LatLng,
    count: usize,
    min_meters: u32,
    max_meters: u32,
) -> Vec<LatLng> {
    (0..count)
        .map(|_| jitter_with(rng, center, min_meters, max_meters))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_directions_are_distinct() {
        let center = LatLng::new(0.0, 0.0);
        let moved: Vec<_> = JitterDirection::ALL
            .iter()
            .map(|d| d.apply(center, 1.0))
            .collect();
        for (i, a) in moved.iter().enumerate() {
            for b in &moved[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_meters_to_degrees() {
        assert!((meters_to_degrees(1000.0) - 0.00900900900901).abs() < 1e-15);
        assert_eq!(meters_to_degrees(0.0), 0.0);
    }

    #[test]
    fn test_zero_distance_returns_center() {
        let mut rng = StdRng::seed_from_u64(7);
        let center = LatLng::new(63.1224, -150.4048);
        for _ in 0..50 {
            assert_eq!(jitter_with(&mut rng, center, 0, 0), center);
        }
    }

    #[test]
    fn test_distance_band() {
        let mut rng = StdRng::seed_from_u64(42);
        let center = LatLng::new(40.0, -100.0);
        let (min, max) = (200, 800);
        for _ in 0..500 {
            let p = jitter_with(&mut rng, center, min, max);
            let d_lat = (p.lat - center.lat).abs();
            let d_lng = (p.lng - center.lng).abs();
            let offset = d_lat.max(d_lng);
            assert!(offset >= meters_to_degrees(min as f64) - 1e-12);
            assert!(offset <= meters_to_degrees(max as f64) + 1e-12);
        }
    }

    #[test]
    fn test_reversed_bounds_are_swapped() {
        let mut rng = StdRng::seed_from_u64(3);
        let center = LatLng::new(10.0, 10.0);
        let p = jitter_with(&mut rng, center, 500, 500);
        let q = jitter_with(&mut rng, center, 600, 400);
        assert_ne!(p, center);
        let offset = (q.lat - center.lat).abs().max((q.lng - center.lng).abs());
        assert!(offset >= meters_to_degrees(400.0) - 1e-12);
        assert!(offset <= meters_to_degrees(600.0) + 1e-12);
    }

    #[test]
    fn test_scatter_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = scatter_with(&mut rng, LatLng::new(0.0, 0.0), 25, 10, 100);
        assert_eq!(points.len(), 25);
    }
}
