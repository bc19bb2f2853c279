use std::collections::BTreeSet;
use std::fmt::Debug;

use geo::{LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::{BidFunction, Headers, RentFunction};
use crate::types::{AgentId, AggregateId, AttribId, MarketId, RealEstateTypeId, ZoneId};

fn empty_polygon() -> Polygon<f64> { Polygon::new(LineString::new(vec![]), vec![]) }

/// A zone row; `area` is in the storage reference system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneRow {
    pub id: ZoneId,
    pub data: Vec<f64>,
    #[serde(skip, default = "empty_polygon")]
    pub area: Polygon<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRow {
    pub id: AgentId,
    pub market: MarketId,
    pub aggregate: AggregateId,
    pub upper_bound: f64,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentZoneRow {
    pub agent: AgentId,
    pub zone: ZoneId,
    pub acc: f64,
    pub att: f64,
    pub data: Vec<f64>,
}

/// A scalar measure keyed by (real-estate type, zone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTypeValue {
    pub ty: RealEstateTypeId,
    pub zone: ZoneId,
    pub value: f64,
}

/// A scalar measure keyed by (agent, real-estate type, zone).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneTypeAgentValue {
    pub agent: AgentId,
    pub ty: RealEstateTypeId,
    pub zone: ZoneId,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealEstateZoneRow {
    pub ty: RealEstateTypeId,
    pub zone: ZoneId,
    pub market: MarketId,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentValue {
    pub agent: AgentId,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidFunctionRow {
    pub market: MarketId,
    pub aggregate: AggregateId,
    pub attrib: AttribId,
    pub params: BidFunction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RentFunctionRow {
    pub market: MarketId,
    pub attrib: AttribId,
    pub params: RentFunction,
}

/// Everything that makes up one Model, committed to the store as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelBatch {
    pub name: String,
    pub headers: Headers,
    pub zones: Vec<ZoneRow>,
    pub agents: Vec<AgentRow>,
    pub agents_zones: Vec<AgentZoneRow>,
    pub bids_adjustments: Vec<ZoneTypeAgentValue>,
    pub bids_functions: Vec<BidFunctionRow>,
    pub demand: Vec<AgentValue>,
    pub demand_exogenous_cutoff: Vec<ZoneTypeAgentValue>,
    pub real_estates_zones: Vec<RealEstateZoneRow>,
    pub rent_adjustments: Vec<ZoneTypeValue>,
    pub rent_functions: Vec<RentFunctionRow>,
    pub subsidies: Vec<ZoneTypeAgentValue>,
    pub supply: Vec<ZoneTypeValue>,
}

/// Ids of the zones and agents a batch defines; fact rows may only reference these.
struct References {
    zones: BTreeSet<ZoneId>,
    agents: BTreeSet<AgentId>,
}

impl References {
    fn zone(&self, table: &'static str, zone: ZoneId) -> Result<()> {
        if !self.zones.contains(&zone) {
            return Err(Error::integrity(table, format!("zone {zone} is not a zone of this model")));
        }
        Ok(())
    }

    fn agent(&self, table: &'static str, agent: AgentId) -> Result<()> {
        if !self.agents.contains(&agent) {
            return Err(Error::integrity(table, format!("agent {agent} is not an agent of this model")));
        }
        Ok(())
    }

    fn zone_type_agent(&self, table: &'static str, rows: &[ZoneTypeAgentValue]) -> Result<()> {
        for row in rows {
            self.zone(table, row.zone)?;
            self.agent(table, row.agent)?;
        }
        unique(table, rows.iter().map(|row| (row.zone, row.ty, row.agent)))?;
        Ok(())
    }
}

/// Collect keys, rejecting duplicates.
fn unique<K: Ord + Debug>(table: &'static str, keys: impl IntoIterator<Item = K>) -> Result<BTreeSet<K>> {
    let mut seen = BTreeSet::new();
    for key in keys {
        if seen.contains(&key) {
            return Err(Error::integrity(table, format!("duplicate key {key:?}")));
        }
        seen.insert(key);
    }
    Ok(seen)
}

/// Attribute vectors must match their header column for column.
fn width(table: &'static str, header: &[String], data: &[f64], row: impl Debug) -> Result<()> {
    if data.len() != header.len() {
        return Err(Error::integrity(table, format!(
            "row {row:?} has {} attributes, header has {}", data.len(), header.len()
        )));
    }
    Ok(())
}

impl ModelBatch {
    pub fn new(name: impl Into<String>, headers: Headers) -> Self {
        Self { name: name.into(), headers, ..Self::default() }
    }

    /// Check keys, composite references and attribute widths of the whole batch.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::integrity("models", "model name is empty"));
        }

        for zone in &self.zones {
            width("zones", &self.headers.zones, &zone.data, zone.id)?;
            if zone.area.exterior().0.len() < 4 {
                return Err(Error::integrity("zones", format!("zone {} has no polygon", zone.id)));
            }
        }
        for agent in &self.agents {
            width("agents", &self.headers.agents, &agent.data, agent.id)?;
        }

        let refs = References {
            zones: unique("zones", self.zones.iter().map(|zone| zone.id))?,
            agents: unique("agents", self.agents.iter().map(|agent| agent.id))?,
        };

        for row in &self.agents_zones {
            refs.zone("agents_zones", row.zone)?;
            refs.agent("agents_zones", row.agent)?;
            width("agents_zones", &self.headers.agents_zones, &row.data, (row.agent, row.zone))?;
        }
        unique("agents_zones", self.agents_zones.iter().map(|row| (row.zone, row.agent)))?;

        for row in &self.real_estates_zones {
            refs.zone("real_estates_zones", row.zone)?;
            width("real_estates_zones", &self.headers.real_estates_zones, &row.data, (row.ty, row.zone))?;
        }
        unique("real_estates_zones", self.real_estates_zones.iter().map(|row| (row.zone, row.ty, row.market)))?;

        for (table, rows) in [("rent_adjustments", &self.rent_adjustments), ("supply", &self.supply)] {
            for row in rows {
                refs.zone(table, row.zone)?;
            }
            unique(table, rows.iter().map(|row| (row.zone, row.ty)))?;
        }

        refs.zone_type_agent("bids_adjustments", &self.bids_adjustments)?;
        refs.zone_type_agent("demand_exogenous_cutoff", &self.demand_exogenous_cutoff)?;
        refs.zone_type_agent("subsidies", &self.subsidies)?;

        for row in &self.demand {
            refs.agent("demand", row.agent)?;
        }
        unique("demand", self.demand.iter().map(|row| row.agent))?;

        unique("bids_functions", self.bids_functions.iter().map(|row| (row.market, row.aggregate, row.attrib)))?;
        unique("rent_functions", self.rent_functions.iter().map(|row| (row.market, row.attrib)))?;

        Ok(())
    }

    /// Real-estate types referenced anywhere in the batch.
    pub(crate) fn real_estate_types(&self) -> BTreeSet<RealEstateTypeId> {
        let zone_type_agent = [&self.bids_adjustments, &self.demand_exogenous_cutoff, &self.subsidies];
        self.rent_adjustments.iter().chain(&self.supply).map(|row| row.ty)
            .chain(zone_type_agent.into_iter().flatten().map(|row| row.ty))
            .chain(self.real_estates_zones.iter().map(|row| row.ty))
            .collect()
    }

    /// Markets referenced anywhere in the batch.
    pub(crate) fn markets(&self) -> BTreeSet<MarketId> {
        self.agents.iter().map(|row| row.market)
            .chain(self.real_estates_zones.iter().map(|row| row.market))
            .chain(self.bids_functions.iter().map(|row| row.market))
            .chain(self.rent_functions.iter().map(|row| row.market))
            .collect()
    }
}
