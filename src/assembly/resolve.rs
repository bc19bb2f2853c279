use geo::Coord;

use crate::assembly::Position;
use crate::common::{Projection, Srid};
use crate::error::{Error, Result};
use crate::store::GeometryStore;
use crate::types::{ModelId, ZoneId};

/// Maps request positions (EPSG:4326) to the zones of one model.
pub struct ZoneResolver<'a> {
    geometry: &'a GeometryStore,
    projection: Projection,
}

impl<'a> ZoneResolver<'a> {
    pub fn new(geometry: &'a GeometryStore) -> Result<Self> {
        let projection = Projection::to_storage(Srid::Wgs84).map_err(Error::Store)?;
        Ok(Self { geometry, projection })
    }

    /// Resolve every position in one pass, returning `(input index, zone)`
    /// pairs in input order. Positions outside every zone are left out, as
    /// are positions the storage projection cannot represent (the poles).
    pub fn resolve(&self, model: ModelId, positions: &[Position]) -> Vec<(usize, ZoneId)> {
        let coords = positions.iter().enumerate()
            .filter_map(|(i, p)| {
                let coord = self.projection.coord(Coord { x: p.lng, y: p.lat }).ok()?;
                (coord.x.is_finite() && coord.y.is_finite()).then_some((i, coord))
            })
            .collect::<Vec<_>>();
        self.geometry.containing_all(model, &coords)
    }
}
