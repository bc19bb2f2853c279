use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow, bail};
use geo::{Coord, LineString, Polygon};
use shapefile::Shape;
use shapefile::dbase::{FieldValue, Record};

use crate::common::{read_shapefile, require_file_exists};
use crate::error::{Error, Result};
use crate::geom::wkt::polygon_to_wkt;
use crate::types::ZoneId;

/// Build a polygon from a flat point array and its part offsets: the first
/// part is the exterior ring, every later part is a hole. Part `i` spans
/// `points[parts[i]..parts[i + 1]]`, the last part runs to the end.
pub(crate) fn split_rings(parts: &[usize], points: &[Coord<f64>]) -> Polygon<f64> {
    let mut rings = parts.iter().enumerate().map(|(i, &start)| {
        let end = parts.get(i + 1).copied().unwrap_or(points.len()).min(points.len());
        LineString::from(points[start.min(end)..end].to_vec())
    });
    let exterior = rings.next().unwrap_or_else(|| LineString::new(vec![]));
    Polygon::new(exterior, rings.collect())
}

/// Zone id stored in a dBase attribute; must be integral.
fn zone_id(record: &Record, field: &str) -> anyhow::Result<ZoneId> {
    let integral = |value: f64| {
        if value.is_finite() && value.fract() == 0.0 {
            Ok(ZoneId(value as i64))
        } else {
            Err(anyhow!("field {field} holds non-integral id {value}"))
        }
    };
    match record.get(field) {
        Some(FieldValue::Numeric(Some(n))) => integral(*n),
        Some(FieldValue::Double(n)) => integral(*n),
        Some(FieldValue::Float(Some(n))) => integral(*n as f64),
        Some(FieldValue::Integer(n)) => Ok(ZoneId(*n as i64)),
        Some(FieldValue::Character(Some(s))) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(id) => Ok(ZoneId(id)),
                Err(_) => integral(s.parse().with_context(|| format!("field {field} holds {s:?}"))?),
            }
        }
        Some(other) => bail!("field {field} holds unsupported value {other:?}"),
        None => bail!("missing field: {field}"),
    }
}

/// Reads zone polygons from a polygon shapefile, keyed by an id attribute.
pub struct ShapefileImporter {
    path: PathBuf,
    id_field: String,
    verbose: u8,
}

impl ShapefileImporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), id_field: "ID".to_string(), verbose: 0 }
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Polygons by zone id, in the shapefile's own reference system.
    ///
    /// Every record must be a plain polygon; anything else aborts the read.
    /// When an id repeats, the later record wins.
    pub fn zone_shapes(&self) -> Result<BTreeMap<ZoneId, Polygon<f64>>> {
        require_file_exists(&self.path)?;
        let items = read_shapefile(&self.path)?;

        let mut zones = BTreeMap::new();
        for (record_no, (shape, record)) in items.iter().enumerate() {
            let Shape::Polygon(polygon) = shape else {
                return Err(Error::UnsupportedShape {
                    path: self.path.clone(),
                    record: record_no,
                    shape_type: format!("{:?}", shape.shapetype()),
                });
            };

            let id = zone_id(record, &self.id_field)
                .with_context(|| format!("record {record_no} of {}", self.path.display()))?;

            let mut parts = Vec::with_capacity(polygon.rings().len());
            let mut points = Vec::new();
            for ring in polygon.rings() {
                parts.push(points.len());
                points.extend(ring.points().iter().map(|p| Coord { x: p.x, y: p.y }));
            }

            if zones.insert(id, split_rings(&parts, &points)).is_some() && self.verbose > 0 {
                eprintln!("[import] zone {id} appears more than once in {}; keeping record {record_no}",
                    self.path.display());
            }
        }

        if self.verbose > 0 {
            eprintln!("[import] read {} zone polygons from {}", zones.len(), self.path.display());
        }
        Ok(zones)
    }

    /// Zone polygons rendered as well-known text.
    pub fn zone_wkt(&self) -> Result<BTreeMap<ZoneId, String>> {
        Ok(self.zone_shapes()?.iter().map(|(&id, polygon)| (id, polygon_to_wkt(polygon))).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(points: &[(f64, f64)]) -> Vec<Coord<f64>> {
        points.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    #[test]
    fn single_part_has_no_holes() {
        let points = coords(&[(0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (0.0, 0.0)]);
        let polygon = split_rings(&[0], &points);
        assert_eq!(polygon.exterior().0, points);
        assert!(polygon.interiors().is_empty());
    }

    #[test]
    fn later_parts_become_holes() {
        let points = coords(&[
            (0.0, 0.0), (0.0, 10.0), (10.0, 10.0), (10.0, 0.0), (0.0, 0.0),
            (2.0, 2.0), (4.0, 2.0), (4.0, 4.0), (2.0, 2.0),
            (6.0, 6.0), (8.0, 6.0), (8.0, 8.0), (6.0, 6.0),
        ]);
        let polygon = split_rings(&[0, 5, 9], &points);
        assert_eq!(polygon.exterior().0.len(), 5);
        assert_eq!(polygon.interiors().len(), 2);
        assert_eq!(polygon.interiors()[0].0, points[5..9].to_vec());
        assert_eq!(polygon.interiors()[1].0, points[9..].to_vec());
    }

    #[test]
    fn open_ring_is_closed() {
        let points = coords(&[(0.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let polygon = split_rings(&[0], &points);
        assert_eq!(polygon.exterior().0.first(), polygon.exterior().0.last());
    }

    #[test]
    fn ids_come_from_any_numeric_or_text_field() {
        let mut record = Record::default();
        record.insert("ID".to_string(), FieldValue::Numeric(Some(12.0)));
        assert_eq!(zone_id(&record, "ID").unwrap(), ZoneId(12));

        record.insert("ID".to_string(), FieldValue::Character(Some(" 7 ".to_string())));
        assert_eq!(zone_id(&record, "ID").unwrap(), ZoneId(7));

        record.insert("ID".to_string(), FieldValue::Integer(-3));
        assert_eq!(zone_id(&record, "ID").unwrap(), ZoneId(-3));

        record.insert("ID".to_string(), FieldValue::Numeric(Some(1.5)));
        assert!(zone_id(&record, "ID").is_err());
        assert!(zone_id(&record, "ZONE").is_err());
    }
}
