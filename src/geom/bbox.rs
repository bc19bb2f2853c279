use geo::Rect;
use rstar::{RTreeObject, AABB};

use crate::types::{ModelId, ZoneId};

/// A zone's bounding box in the R-tree, keyed back to the zone by (model, zone).
#[derive(Debug, Clone)]
pub(crate) struct ZoneEnvelope {
    model: ModelId,
    zone: ZoneId,
    bbox: Rect<f64>,
}

impl ZoneEnvelope {
    pub(crate) fn new(model: ModelId, zone: ZoneId, bbox: Rect<f64>) -> Self {
        Self { model, zone, bbox }
    }

    #[inline] pub(crate) fn model(&self) -> ModelId { self.model }

    #[inline] pub(crate) fn zone(&self) -> ZoneId { self.zone }
}

impl RTreeObject for ZoneEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}
