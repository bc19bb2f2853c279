use anyhow::{Context, Result, anyhow, bail};
use geo::{Coord, MapCoords, Polygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};

/// Spatial reference systems understood by the importer and the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Srid {
    /// EPSG:4326, lon/lat degrees on WGS84.
    Wgs84,
    /// EPSG:4269, lon/lat degrees on NAD83.
    Nad83,
    /// EPSG:900913 (a.k.a. 3857), spherical mercator meters.
    WebMercator,
}

/// Reference system of every stored zone polygon.
pub const STORAGE_SRID: Srid = Srid::WebMercator;

impl Srid {
    /// Look up a supported EPSG code.
    pub fn from_epsg(code: u32) -> Result<Self> {
        match code {
            4326 => Ok(Srid::Wgs84),
            4269 => Ok(Srid::Nad83),
            900913 | 3857 => Ok(Srid::WebMercator),
            _ => bail!("unsupported EPSG code: {code} (expected 4326, 4269, 900913 or 3857)"),
        }
    }

    /// Canonical EPSG code.
    pub fn epsg(self) -> u32 {
        match self {
            Srid::Wgs84 => 4326,
            Srid::Nad83 => 4269,
            Srid::WebMercator => 900913,
        }
    }

    /// Geographic systems take degrees in and give degrees out (radians inside PROJ).
    #[inline] fn is_geographic(self) -> bool { !matches!(self, Srid::WebMercator) }

    fn proj4(self) -> &'static str {
        match self {
            Srid::Wgs84 => "+proj=longlat +datum=WGS84 +no_defs +type=crs",
            Srid::Nad83 => "+proj=longlat +datum=NAD83 +no_defs +type=crs",
            Srid::WebMercator => "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs +type=crs",
        }
    }
}

/// A coordinate transform between two reference systems.
///
/// Zone polygons and query points must go through the same transform into
/// [`STORAGE_SRID`], otherwise containment tests drift near the edges.
pub struct Projection {
    from: Srid,
    to: Srid,
    source: Proj4,
    target: Proj4,
}

impl Projection {
    pub fn new(from: Srid, to: Srid) -> Result<Self> {
        let build = |srid: Srid| Proj4::from_proj_string(srid.proj4())
            .with_context(|| anyhow!("failed to build PROJ.4 for EPSG:{}", srid.epsg()));

        Ok(Self { from, to, source: build(from)?, target: build(to)? })
    }

    /// Transform into the storage reference system.
    pub fn to_storage(from: Srid) -> Result<Self> { Self::new(from, STORAGE_SRID) }

    /// Transform a single coordinate.
    pub fn coord(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        if self.from == self.to {
            return Ok(coord);
        }

        let mut point = if self.from.is_geographic() {
            (coord.x.to_radians(), coord.y.to_radians(), 0.0)
        } else {
            (coord.x, coord.y, 0.0)
        };

        transform(&self.source, &self.target, &mut point)
            .with_context(|| format!("CRS transform failed for ({}, {})", coord.x, coord.y))?;

        Ok(if self.to.is_geographic() {
            Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
        } else {
            Coord { x: point.0, y: point.1 }
        })
    }

    /// Transform every ring of a polygon.
    pub fn polygon(&self, polygon: &Polygon<f64>) -> Result<Polygon<f64>> {
        polygon.try_map_coords(|coord| self.coord(coord))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Contains, Point, polygon};

    #[test]
    fn epsg_codes_round_trip() {
        for code in [4326, 4269, 900913] {
            assert_eq!(Srid::from_epsg(code).unwrap().epsg(), code);
        }
        assert_eq!(Srid::from_epsg(3857).unwrap(), Srid::WebMercator);
        assert!(Srid::from_epsg(2154).is_err());
    }

    #[test]
    fn identity_transform_is_exact() {
        let projection = Projection::new(Srid::WebMercator, Srid::WebMercator).unwrap();
        let coord = Coord { x: 123.5, y: -42.25 };
        assert_eq!(projection.coord(coord).unwrap(), coord);
    }

    #[test]
    fn mercator_origin_and_orientation() {
        let projection = Projection::to_storage(Srid::Wgs84).unwrap();

        let origin = projection.coord(Coord { x: 0.0, y: 0.0 }).unwrap();
        assert!(origin.x.abs() < 1e-6 && origin.y.abs() < 1e-6);

        let north_east = projection.coord(Coord { x: 10.0, y: 10.0 }).unwrap();
        assert!(north_east.x > 1_000_000.0 && north_east.y > 1_000_000.0);
    }

    #[test]
    fn containment_survives_reprojection() {
        let projection = Projection::to_storage(Srid::Wgs84).unwrap();
        let square = polygon![(x: 0.0, y: 0.0), (x: 0.0, y: 10.0), (x: 10.0, y: 10.0), (x: 10.0, y: 0.0)];
        let projected = projection.polygon(&square).unwrap();

        let inside = projection.coord(Coord { x: 5.0, y: 5.0 }).unwrap();
        let outside = projection.coord(Coord { x: 15.0, y: 5.0 }).unwrap();
        assert!(projected.contains(&Point::from(inside)));
        assert!(!projected.contains(&Point::from(outside)));
    }
}
