//! Lat/lng geometry for the drone scheduler. Positions are stored as
//! (lat, lng) offset by [`COORD_BIAS`] so internal arithmetic stays near the
//! origin, then converted to an approximate metric projection for distance
//! and movement. No great-circle correction, matching the original
//! implementation: acceptable over the scale of a single wind farm.

use serde::{Deserialize, Serialize};

/// Subtracted from raw (lat, lng) before any arithmetic. Grounded in
/// `drone_scheduling/drone.py`'s `COORD_BIAS`, the south-west corner of the
/// reference map.
pub const COORD_BIAS: Point = Point { lat: 53.65, lng: 1.5 };

/// Degrees-of-latitude to metres and degrees-of-longitude to metres, at the
/// reference map's latitude. Grounded in `drone_scheduling/utils.py`.
pub const MFACTOR_LAT: f64 = 0.45 / 50_000.0;
pub const MFACTOR_LONG: f64 = 0.9 / 59_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lng: f64,
}

impl Point {
    pub fn new(lat: f64, lng: f64) -> Self {
        Point { lat, lng }
    }

    pub fn biased(self) -> Point {
        Point::new(self.lat - COORD_BIAS.lat, self.lng - COORD_BIAS.lng)
    }

    pub fn unbiased(self) -> Point {
        Point::new(self.lat + COORD_BIAS.lat, self.lng + COORD_BIAS.lng)
    }

    fn to_metres(self) -> (f64, f64) {
        (self.lat / MFACTOR_LAT, self.lng / MFACTOR_LONG)
    }

    /// Euclidean distance between two biased points, in the metric
    /// projection (metres).
    pub fn distance_metres(self, other: Point) -> f64 {
        let (x1, y1) = self.to_metres();
        let (x2, y2) = other.to_metres();
        ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt()
    }

    pub fn sub(self, other: Point) -> Point {
        Point::new(self.lat - other.lat, self.lng - other.lng)
    }

    pub fn add(self, other: Point) -> Point {
        Point::new(self.lat + other.lat, self.lng + other.lng)
    }

    pub fn scale(self, s: f64) -> Point {
        Point::new(self.lat * s, self.lng * s)
    }

    pub fn magnitude(self) -> f64 {
        (self.lat.powi(2) + self.lng.powi(2)).sqrt()
    }

    /// `self` normalised to unit length in (lat,lng)-degree space. Returns
    /// the zero vector unchanged, matching the original `norm()` helper's
    /// guard against dividing by a zero magnitude.
    pub fn normalized(self) -> Point {
        let mag = self.magnitude();
        if mag == 0.0 {
            self
        } else {
            self.scale(1.0 / mag)
        }
    }
}

/// Given the candidate's position and a list of `(id, position)` pairs of
/// idle peers, picks the index of the closest one, breaking ties by the
/// lower id per the spec's tie-breaking rule. Returns `None` if the list is
/// empty.
pub fn closest_by_distance<I>(target: Point, candidates: I) -> Option<usize>
where
    I: IntoIterator<Item = (u64, Point)>,
{
    candidates
        .into_iter()
        .enumerate()
        .map(|(idx, (id, pos))| (idx, id, target.distance_metres(pos)))
        .min_by(|a, b| match a.2.partial_cmp(&b.2).unwrap() {
            std::cmp::Ordering::Equal => a.1.cmp(&b.1),
            other => other,
        })
        .map(|(idx, _, _)| idx)
}
