#![cfg(test)]

extern crate std;

use glam::DVec3;

use crate::StateVectors;

mod seeders;

mod angles;
mod propagation;

const RANDOM_ITERATIONS: usize = 1000;

const EARTH_MU: f64 = 398600.4418;

/// The International Space Station, in km and km/s.
fn iss() -> StateVectors {
    StateVectors {
        position: DVec3::new(859.07256, -4137.20368, 5295.56871),
        velocity: DVec3::new(7.37289205, 2.08223573, 0.439999794),
    }
}

/// Periapsis state of an equatorial orbit of eccentricity `ecc` with a
/// periapsis radius of 7000 km around the Earth.
fn periapsis_state(ecc: f64) -> StateVectors {
    let radius = 7000.0;

    StateVectors {
        position: DVec3::new(radius, 0.0, 0.0),
        velocity: DVec3::new(0.0, (EARTH_MU * (1.0 + ecc) / radius).sqrt(), 0.0),
    }
}
