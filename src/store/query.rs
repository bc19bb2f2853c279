use std::ops::RangeInclusive;

use crate::store::{FactKey, FactTable, ZoneAgentKey, ZoneTypeAgentKey, ZoneTypeKey, ZoneTypeMarketKey};
use crate::types::{AgentId, MarketId, ModelId, RealEstateTypeId, ZoneId};

/// One resolved query point, bound as a join parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PointParam {
    /// 1-based point number, as emitted in output records.
    pub index: usize,
    pub zone: ZoneId,
    pub ty: RealEstateTypeId,
}

/// Keys that can be selected by a (model, zone, type) point parameter.
pub trait PointKey: FactKey {
    fn point_range(model: ModelId, point: &PointParam) -> RangeInclusive<Self>;
}

impl PointKey for ZoneTypeKey {
    fn point_range(model: ModelId, point: &PointParam) -> RangeInclusive<Self> {
        let key = (model, point.zone, point.ty);
        key..=key
    }
}

impl PointKey for ZoneTypeAgentKey {
    fn point_range(model: ModelId, point: &PointParam) -> RangeInclusive<Self> {
        (model, point.zone, point.ty, AgentId::MIN)..=(model, point.zone, point.ty, AgentId::MAX)
    }
}

impl PointKey for ZoneTypeMarketKey {
    fn point_range(model: ModelId, point: &PointParam) -> RangeInclusive<Self> {
        (model, point.zone, point.ty, MarketId::MIN)..=(model, point.zone, point.ty, MarketId::MAX)
    }
}

/// Agents-zones rows join on the zone only; the requested type is ignored.
impl PointKey for ZoneAgentKey {
    fn point_range(model: ModelId, point: &PointParam) -> RangeInclusive<Self> {
        (model, point.zone, AgentId::MIN)..=(model, point.zone, AgentId::MAX)
    }
}

/// The resolved point set of one request, sorted by point number.
#[derive(Debug, Clone, Default)]
pub struct PointParams {
    points: Vec<PointParam>,
}

impl PointParams {
    pub fn new(points: impl IntoIterator<Item = PointParam>) -> Self {
        let mut points = points.into_iter().collect::<Vec<_>>();
        points.sort();
        Self { points }
    }

    #[inline] pub fn len(&self) -> usize { self.points.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.points.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &PointParam> { self.points.iter() }

    /// Bulk join of the point set against `table`, scoped to `model`.
    ///
    /// Rows come back ordered by point number, then by primary key. A point
    /// matching nothing contributes no rows.
    pub fn join<'t, K: PointKey, V>(&'t self, table: &'t FactTable<K, V>, model: ModelId)
        -> impl Iterator<Item = (&'t PointParam, &'t K, &'t V)> + 't
    {
        self.points.iter().flat_map(move |point| {
            table.range(K::point_range(model, point)).map(move |(key, value)| (point, key, value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(index: usize, zone: i64, ty: i64) -> PointParam {
        PointParam { index, zone: ZoneId(zone), ty: RealEstateTypeId(ty) }
    }

    #[test]
    fn join_is_ordered_by_point_then_key() {
        let mut table: FactTable<ZoneTypeAgentKey, f64> = FactTable::default();
        for (zone, agent) in [(1, 2), (1, 1), (2, 1)] {
            table.insert((ModelId(1), ZoneId(zone), RealEstateTypeId(1), AgentId(agent)), agent as f64);
        }

        let params = PointParams::new([point(2, 1, 1), point(1, 2, 1)]);
        let rows = params.join(&table, ModelId(1))
            .map(|(p, key, _)| (p.index, key.1.0, key.3.0))
            .collect::<Vec<_>>();
        assert_eq!(rows, vec![(1, 2, 1), (2, 1, 1), (2, 1, 2)]);
    }

    #[test]
    fn join_never_crosses_models() {
        let mut table: FactTable<ZoneTypeKey, f64> = FactTable::default();
        table.insert((ModelId(1), ZoneId(1), RealEstateTypeId(1)), 1.0);
        table.insert((ModelId(2), ZoneId(1), RealEstateTypeId(1)), 2.0);

        let params = PointParams::new([point(1, 1, 1)]);
        let rows = params.join(&table, ModelId(2)).collect::<Vec<_>>();
        assert_eq!(rows.len(), 1);
        assert!(rows.iter().all(|(_, key, value)| key.model() == ModelId(2) && **value == 2.0));
    }

    #[test]
    fn zone_agent_join_ignores_type() {
        let mut table: FactTable<ZoneAgentKey, f64> = FactTable::default();
        table.insert((ModelId(1), ZoneId(3), AgentId(1)), 1.0);

        let params = PointParams::new([point(1, 3, 7), point(2, 4, 7)]);
        assert_eq!(params.join(&table, ModelId(1)).count(), 1);
    }
}
