use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::types::{AgentId, AggregateId, AttribId, MarketId, ModelId, RealEstateTypeId, ZoneId};

/// Number of parameters of a bid function row (LINEAPAR .. EXPPAR_Y).
pub const BID_FUNCTION_PARAMS: usize = 11;
/// Number of parameters of a rent function row (SCALEPAR .. EXPPAR_Y).
pub const RENT_FUNCTION_PARAMS: usize = 8;

pub type BidFunction = [f64; BID_FUNCTION_PARAMS];
pub type RentFunction = [f64; RENT_FUNCTION_PARAMS];

pub type AgentKey = (ModelId, AgentId);
pub type ZoneTypeKey = (ModelId, ZoneId, RealEstateTypeId);
pub type ZoneTypeAgentKey = (ModelId, ZoneId, RealEstateTypeId, AgentId);
pub type ZoneTypeMarketKey = (ModelId, ZoneId, RealEstateTypeId, MarketId);
pub type ZoneAgentKey = (ModelId, ZoneId, AgentId);

/// An agent of a model; `data` follows the model's agents header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub market: MarketId,
    pub aggregate: AggregateId,
    pub upper_bound: f64,
    pub data: Vec<f64>,
}

/// Accessibility and attractiveness of a zone for an agent; `data` follows
/// the model's agents-zones header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentZone {
    pub acc: f64,
    pub att: f64,
    pub data: Vec<f64>,
}

/// Component of a composite key, with bounds for prefix scans.
pub trait KeyPart: Ord + Copy {
    const LOWEST: Self;
    const HIGHEST: Self;
}

macro_rules! key_part {
    ($($ty:ty),*) => {$(
        impl KeyPart for $ty {
            const LOWEST: Self = <$ty>::MIN;
            const HIGHEST: Self = <$ty>::MAX;
        }
    )*};
}

key_part!(ZoneId, AgentId, RealEstateTypeId, MarketId, AggregateId, AttribId);

/// A primary key whose leading component is the model id.
pub trait FactKey: Ord + Copy {
    fn model(&self) -> ModelId;
    fn lower(model: ModelId) -> Self;
    fn upper(model: ModelId) -> Self;
}

impl<A: KeyPart> FactKey for (ModelId, A) {
    fn model(&self) -> ModelId { self.0 }
    fn lower(model: ModelId) -> Self { (model, A::LOWEST) }
    fn upper(model: ModelId) -> Self { (model, A::HIGHEST) }
}

impl<A: KeyPart, B: KeyPart> FactKey for (ModelId, A, B) {
    fn model(&self) -> ModelId { self.0 }
    fn lower(model: ModelId) -> Self { (model, A::LOWEST, B::LOWEST) }
    fn upper(model: ModelId) -> Self { (model, A::HIGHEST, B::HIGHEST) }
}

impl<A: KeyPart, B: KeyPart, C: KeyPart> FactKey for (ModelId, A, B, C) {
    fn model(&self) -> ModelId { self.0 }
    fn lower(model: ModelId) -> Self { (model, A::LOWEST, B::LOWEST, C::LOWEST) }
    fn upper(model: ModelId) -> Self { (model, A::HIGHEST, B::HIGHEST, C::HIGHEST) }
}

/// One relation of the fact table family, ordered by primary key.
#[derive(Debug, Clone)]
pub struct FactTable<K, V> {
    rows: BTreeMap<K, V>,
}

impl<K, V> Default for FactTable<K, V> {
    fn default() -> Self { Self { rows: BTreeMap::new() } }
}

impl<K: FactKey, V> FactTable<K, V> {
    pub(crate) fn insert(&mut self, key: K, value: V) {
        self.rows.insert(key, value);
    }

    pub fn get(&self, key: &K) -> Option<&V> { self.rows.get(key) }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    /// Rows of one model, in key order.
    pub fn model(&self, model: ModelId) -> impl Iterator<Item = (&K, &V)> {
        self.rows.range(K::lower(model)..=K::upper(model))
    }

    /// Rows whose keys fall in an inclusive range, in key order.
    pub fn range(&self, range: RangeInclusive<K>) -> impl Iterator<Item = (&K, &V)> {
        self.rows.range(range)
    }
}

/// Every per-model relation consumed by the assembly engine.
#[derive(Debug, Default)]
pub struct FactTableSet {
    pub agents: FactTable<AgentKey, Agent>,
    pub agents_zones: FactTable<ZoneAgentKey, AgentZone>,
    pub bids_adjustments: FactTable<ZoneTypeAgentKey, f64>,
    pub bids_functions: FactTable<(ModelId, MarketId, AggregateId, AttribId), BidFunction>,
    pub demand: FactTable<AgentKey, f64>,
    pub demand_exogenous_cutoff: FactTable<ZoneTypeAgentKey, f64>,
    pub real_estates_zones: FactTable<ZoneTypeMarketKey, Vec<f64>>,
    pub rent_adjustments: FactTable<ZoneTypeKey, f64>,
    pub rent_functions: FactTable<(ModelId, MarketId, AttribId), RentFunction>,
    pub subsidies: FactTable<ZoneTypeAgentKey, f64>,
    pub supply: FactTable<ZoneTypeKey, f64>,
}
