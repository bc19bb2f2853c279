use std::collections::BTreeMap;

use geo::{BoundingRect, Contains, Coord, Point, Polygon};
use rstar::{RTree, AABB};

use crate::geom::ZoneEnvelope;
use crate::types::{ModelId, ZoneId};

/// A zone polygon (in the storage reference system) and its attribute vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub area: Polygon<f64>,
    pub data: Vec<f64>,
}

/// Zone polygons and attribute vectors of every model, with an R-tree over
/// their bounding boxes for containment queries.
#[derive(Debug, Default)]
pub struct GeometryStore {
    zones: BTreeMap<(ModelId, ZoneId), Zone>,
    rtree: RTree<ZoneEnvelope>,
}

impl GeometryStore {
    /// Bulk insert the zones of one model.
    pub(crate) fn insert(&mut self, model: ModelId, zones: impl IntoIterator<Item = Zone>) {
        for zone in zones {
            if let Some(bbox) = zone.area.bounding_rect() {
                self.rtree.insert(ZoneEnvelope::new(model, zone.id, bbox));
            }
            self.zones.insert((model, zone.id), zone);
        }
    }

    pub fn zone(&self, model: ModelId, id: ZoneId) -> Option<&Zone> {
        self.zones.get(&(model, id))
    }

    /// Zones of a model in id order.
    pub fn zones(&self, model: ModelId) -> impl Iterator<Item = &Zone> {
        self.zones.range((model, ZoneId::MIN)..=(model, ZoneId::MAX)).map(|(_, zone)| zone)
    }

    /// The zone of `model` whose polygon contains `coord`, if any.
    ///
    /// Points on a polygon boundary are not contained. When polygons overlap,
    /// the smallest zone id among the containing zones wins.
    pub fn containing(&self, model: ModelId, coord: Coord<f64>) -> Option<ZoneId> {
        let point = Point::from(coord);
        self.rtree
            .locate_in_envelope_intersecting(&AABB::from_point([coord.x, coord.y]))
            .filter(|envelope| envelope.model() == model)
            .filter(|envelope| self.zone(model, envelope.zone())
                .is_some_and(|zone| zone.area.contains(&point)))
            .map(|envelope| envelope.zone())
            .min()
    }

    /// Resolve a batch of indexed planar points, returning `(index, zone)` in input order.
    /// Points outside every zone of the model are omitted.
    pub fn containing_all(&self, model: ModelId, coords: &[(usize, Coord<f64>)]) -> Vec<(usize, ZoneId)> {
        coords.iter()
            .filter_map(|&(i, coord)| self.containing(model, coord).map(|zone| (i, zone)))
            .collect()
    }
}
