use serde::{Deserialize, Serialize};
use crate::errors::ConfigError;

/// Metres per degree of latitude, also used for longitude at the equator
const METRES_PER_DEGREE: f64 = 111_320.0;

/// A named (lon, lat) location, e.g. a city
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NamedPoint {
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

impl NamedPoint {
    /// Checks that the point is a valid geographic position
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lon.abs() > 180.0 || self.lat.abs() > 90.0 {
            return Err(ConfigError(format!("point {} out of range", self.name)));
        }
        Ok(())
    }
}

/// A closed polygon given as (lon, lat) vertices.
/// The ring is closed on construction, i.e. the last vertex equals the first.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "RegionDef")]
pub struct Region {
    vertices: Vec<[f64; 2]>,
}

#[derive(Deserialize)]
struct RegionDef {
    vertices: Vec<[f64; 2]>,
}

impl TryFrom<RegionDef> for Region {
    type Error = ConfigError;

    fn try_from(def: RegionDef) -> Result<Self, Self::Error> {
        Region::polygon(def.vertices)
    }
}

impl Region {
    /// Returns a region from a list of vertices
    ///
    /// # Arguments
    ///
    /// * 'vertices' - (lon, lat) pairs, at least three distinct points
    pub fn polygon(mut vertices: Vec<[f64; 2]>) -> Result<Region, ConfigError> {
        if let (Some(first), Some(last)) = (vertices.first(), vertices.last()) {
            if first != last {
                vertices.push(*first);
            }
        }
        if vertices.len() < 4 {
            return Err(ConfigError::from("region needs at least three vertices"));
        }
        if vertices.iter().any(|[lon, lat]| lon.abs() > 180.0 || lat.abs() > 90.0) {
            return Err(ConfigError::from("region vertex out of range"));
        }

        Ok(Region { vertices })
    }

    /// Returns a rectangular region
    ///
    /// # Arguments
    ///
    /// * 'west' - min longitude
    /// * 'south' - min latitude
    /// * 'east' - max longitude
    /// * 'north' - max latitude
    pub fn rectangle(west: f64, south: f64, east: f64, north: f64) -> Result<Region, ConfigError> {
        if west >= east || south >= north {
            return Err(ConfigError::from("rectangle bounds are empty"));
        }
        Region::polygon(vec![[west, south], [east, south], [east, north], [west, north]])
    }

    /// Returns the square bounding box of a circle with a diameter of size_km around a point
    ///
    /// # Arguments
    ///
    /// * 'lon' - longitude of the center
    /// * 'lat' - latitude of the center
    /// * 'size_km' - side length of the square in kilometers
    pub fn cell(lon: f64, lat: f64, size_km: f64) -> Result<Region, ConfigError> {
        if size_km <= 0.0 {
            return Err(ConfigError::from("cell size must be positive"));
        }
        let half_side = size_km / 2.0 * 1000.0;
        let d_lat = half_side / METRES_PER_DEGREE;
        let d_lon = half_side / (METRES_PER_DEGREE * lat.to_radians().cos());

        Region::rectangle(lon - d_lon, lat - d_lat, lon + d_lon, lat + d_lat)
    }

    /// Returns the closed vertex ring
    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_is_closed() {
        let region = Region::polygon(vec![[4.12, 51.94], [4.47, 51.94], [4.47, 52.123]]).unwrap();
        assert_eq!(region.vertices().len(), 4);
        assert_eq!(region.vertices()[0], region.vertices()[3]);
    }

    #[test]
    fn polygon_rejects_too_few_vertices() {
        assert!(Region::polygon(vec![[4.12, 51.94], [4.47, 51.94]]).is_err());
        assert!(Region::polygon(Vec::new()).is_err());
    }

    #[test]
    fn polygon_rejects_out_of_range() {
        assert!(Region::polygon(vec![[190.0, 0.0], [1.0, 0.0], [1.0, 1.0]]).is_err());
    }

    #[test]
    fn cell_is_centered_square() {
        let region = Region::cell(-0.133, 51.501, 70.0).unwrap();
        let v = region.vertices();
        let d_lat = 35_000.0 / METRES_PER_DEGREE;

        assert_eq!(v.len(), 5);
        assert!((v[0][1] - (51.501 - d_lat)).abs() < 1e-9);
        assert!((v[2][1] - (51.501 + d_lat)).abs() < 1e-9);
        assert!(((v[0][0] + v[2][0]) / 2.0 + 0.133).abs() < 1e-9);
        // degrees of longitude are shorter than latitude this far north
        assert!(v[2][0] - v[0][0] > v[2][1] - v[0][1]);
    }

    #[test]
    fn point_validation() {
        let berlin = NamedPoint { name: "Berlin".to_string(), lon: 13.405, lat: 52.52 };
        assert!(berlin.validate().is_ok());

        let swapped = NamedPoint { name: "Berlin".to_string(), lon: 13.405, lat: 152.52 };
        assert!(swapped.validate().unwrap_err().to_string().contains("Berlin"));
    }

    #[test]
    fn region_from_toml() {
        let region: Region = toml::from_str("vertices = [[4.12, 51.94], [4.47, 51.94], [4.47, 52.123], [4.12, 52.123]]").unwrap();
        assert_eq!(region.vertices().len(), 5);

        let bad: Result<Region, _> = toml::from_str("vertices = [[4.12, 51.94]]");
        assert!(bad.is_err());
    }
}
