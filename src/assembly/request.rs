use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::error::{Error, Result};
use crate::types::{RealEstateTypeId, ZoneId};

/// Named scalar overrides attached to a location or a unit.
pub type Overrides = BTreeMap<String, f64>;

/// Longitude/latitude in degrees (EPSG:4326).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lng: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lng: f64, lat: f64) -> Self { Self { lng, lat } }

    fn check(&self) -> std::result::Result<(), String> {
        if !self.lng.is_finite() || !self.lat.is_finite() {
            return Err(format!("coordinates must be finite, got ({}, {})", self.lng, self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(format!("longitude {} is outside [-180, 180]", self.lng));
        }
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(format!("latitude {} is outside [-90, 90]", self.lat));
        }
        Ok(())
    }
}

/// A requested real-estate unit at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    #[serde(rename = "type")]
    pub ty: RealEstateTypeId,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: Overrides,
}

impl Unit {
    pub fn new(ty: RealEstateTypeId) -> Self { Self { ty, overrides: Overrides::new() } }
}

/// A query location: a position and the units requested there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub position: Position,
    pub units: Vec<Unit>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: Overrides,
}

impl Location {
    pub fn new(lng: f64, lat: f64, units: impl IntoIterator<Item = RealEstateTypeId>) -> Self {
        Self {
            position: Position::new(lng, lat),
            units: units.into_iter().map(Unit::new).collect(),
            overrides: Overrides::new(),
        }
    }
}

/// One (position, requested type) pair of a request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueryPoint {
    /// 1-based, in request expansion order.
    pub index: usize,
    pub position: Position,
    pub ty: RealEstateTypeId,
    pub zone: Option<ZoneId>,
}

impl QueryPoint {
    /// Expand every unit of every location into a numbered point.
    ///
    /// Fails on the first location whose coordinates are unusable.
    pub fn flatten(locations: &[Location]) -> Result<Vec<QueryPoint>> {
        let mut points = Vec::new();
        for (i, location) in locations.iter().enumerate() {
            location.position.check()
                .map_err(|reason| Error::InvalidLocation { index: i + 1, reason })?;

            for unit in &location.units {
                points.push(QueryPoint {
                    index: points.len() + 1,
                    position: location.position,
                    ty: unit.ty,
                    zone: None,
                });
            }
        }
        Ok(points)
    }
}

fn number(value: &Json) -> Option<f64> {
    match value {
        Json::Number(n) => n.as_f64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn integer(value: &Json) -> Option<i64> {
    match value {
        Json::Number(n) => n.as_i64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Numeric members other than `reserved` become overrides; anything else is dropped.
fn overrides(object: &Map<String, Json>, reserved: &[&str]) -> Overrides {
    object.iter()
        .filter(|(key, _)| !reserved.contains(&key.as_str()))
        .filter_map(|(key, value)| number(value).map(|v| (key.clone(), v)))
        .collect()
}

fn parse_unit(value: &Json) -> Option<Unit> {
    let object = value.as_object()?;
    let ty = integer(object.get("type")?)?;
    Some(Unit { ty: RealEstateTypeId(ty), overrides: overrides(object, &["type"]) })
}

fn parse_location(value: &Json) -> Option<Location> {
    let object = value.as_object()?;
    let lng = number(object.get("lng")?)?;
    let lat = number(object.get("lat")?)?;
    let units = object.get("units")
        .and_then(Json::as_array)
        .map(|units| units.iter().filter_map(parse_unit).collect())
        .unwrap_or_default();

    Some(Location {
        position: Position::new(lng, lat),
        units,
        overrides: overrides(object, &["lng", "lat", "units"]),
    })
}

/// Read a request document: either an array of locations or an object with a
/// `locations` array. Each location is `{lng, lat, units: [{type, ..}], ..}`.
///
/// Locations without numeric `lng`/`lat` and units without an integral `type`
/// are skipped rather than failing the request.
pub fn parse_locations(request: &Json) -> Vec<Location> {
    let items = match request {
        Json::Array(items) => Some(items),
        Json::Object(object) => object.get("locations").and_then(Json::as_array),
        _ => None,
    };
    items.map(|items| items.iter().filter_map(parse_location).collect()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_numbers_units_across_locations() {
        let locations = vec![
            Location::new(-70.56, 41.84, [RealEstateTypeId(1), RealEstateTypeId(2)]),
            Location::new(-70.54, 41.81, [RealEstateTypeId(3)]),
        ];
        let points = QueryPoint::flatten(&locations).unwrap();
        assert_eq!(points.iter().map(|p| p.index).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(points[1].ty, RealEstateTypeId(2));
        assert_eq!(points[2].position, Position::new(-70.54, 41.81));
        assert!(points.iter().all(|p| p.zone.is_none()));
    }

    #[test]
    fn flatten_rejects_unusable_coordinates() {
        let locations = vec![
            Location::new(1.0, 1.0, [RealEstateTypeId(1)]),
            Location::new(f64::NAN, 1.0, [RealEstateTypeId(1)]),
        ];
        assert!(matches!(QueryPoint::flatten(&locations), Err(Error::InvalidLocation { index: 2, .. })));

        let far = vec![Location::new(0.0, 91.0, [RealEstateTypeId(1)])];
        assert!(matches!(QueryPoint::flatten(&far), Err(Error::InvalidLocation { index: 1, .. })));
    }

    #[test]
    fn location_without_units_yields_no_points() {
        let locations = vec![Location::new(1.0, 1.0, [])];
        assert!(QueryPoint::flatten(&locations).unwrap().is_empty());
    }

    #[test]
    fn parser_drops_malformed_entries() {
        let request = json!({
            "locations": [
                {"lng": -70.56, "lat": "41.84", "price": 12.5, "note": "x",
                 "units": [{"type": 1, "rent": "3.5"}, {"type": "house"}, {"rent": 1.0}]},
                {"lng": "west", "lat": 41.0, "units": [{"type": 1}]},
                {"lat": 41.0},
                "nonsense"
            ]
        });
        let locations = parse_locations(&request);
        assert_eq!(locations.len(), 1);

        let location = &locations[0];
        assert_eq!(location.position, Position::new(-70.56, 41.84));
        assert_eq!(location.overrides, Overrides::from([("price".to_string(), 12.5)]));
        assert_eq!(location.units.len(), 1);
        assert_eq!(location.units[0].ty, RealEstateTypeId(1));
        assert_eq!(location.units[0].overrides.get("rent"), Some(&3.5));
    }

    #[test]
    fn parser_accepts_bare_array() {
        let locations = parse_locations(&json!([{"lng": 1, "lat": 2, "units": [{"type": 4}]}]));
        assert_eq!(locations, vec![Location::new(1.0, 2.0, [RealEstateTypeId(4)])]);
        assert!(parse_locations(&json!(42)).is_empty());
    }
}
