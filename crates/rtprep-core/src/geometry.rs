//! 3-D points for the geometric checks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A point in patient coordinates (mm).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dz.mul_add(dz, dx.mul_add(dx, dy * dy)).sqrt()
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Point3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

/// Renders as `x,y,z`, the form used in manifests and reports.
impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.x, self.y, self.z)
    }
}

impl FromStr for Point3 {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let parts = raw.split(',').map(str::trim).collect::<Vec<_>>();
        let [x, y, z] = parts.as_slice() else {
            return Err(format!("expected 'x,y,z', found {} component(s)", parts.len()));
        };
        let parse = |value: &str| {
            value
                .parse::<f64>()
                .map_err(|error| format!("'{value}': {error}"))
        };
        Ok(Self::new(parse(x)?, parse(y)?, parse(z)?))
    }
}
