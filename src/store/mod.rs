mod batch;
mod catalog;
mod facts;
mod geometry;
mod persist;
mod query;

use std::sync::{RwLock, RwLockReadGuard};

use anyhow::anyhow;

pub use batch::*;
pub use catalog::{Headers, Model, ModelCatalog};
pub use facts::*;
pub use geometry::{GeometryStore, Zone};
pub use query::{PointKey, PointParam, PointParams};

use crate::error::{Error, Result};
use crate::types::ModelId;

/// Everything the store holds, guarded as a unit.
#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) catalog: ModelCatalog,
    pub(crate) geometry: GeometryStore,
    pub(crate) facts: FactTableSet,
}

impl Tables {
    /// Insert a validated batch under a fresh model id. Cannot fail.
    fn apply(&mut self, batch: ModelBatch) -> ModelId {
        let id = self.catalog.next_id();
        self.apply_as(id, batch);
        id
    }

    /// Insert a validated batch under a given model id.
    pub(crate) fn apply_as(&mut self, id: ModelId, batch: ModelBatch) {
        self.catalog.register_types(batch.real_estate_types());
        self.catalog.register_markets(batch.markets());

        let ModelBatch {
            name, headers, zones, agents, agents_zones, bids_adjustments, bids_functions, demand,
            demand_exogenous_cutoff, real_estates_zones, rent_adjustments, rent_functions, subsidies, supply,
        } = batch;
        self.catalog.insert(Model { id, name, headers });

        self.geometry.insert(id, zones.into_iter().map(|row| Zone { id: row.id, area: row.area, data: row.data }));

        let facts = &mut self.facts;
        for row in agents {
            facts.agents.insert((id, row.id), Agent {
                market: row.market,
                aggregate: row.aggregate,
                upper_bound: row.upper_bound,
                data: row.data,
            });
        }
        for row in agents_zones {
            facts.agents_zones.insert((id, row.zone, row.agent), AgentZone { acc: row.acc, att: row.att, data: row.data });
        }
        for row in real_estates_zones {
            facts.real_estates_zones.insert((id, row.zone, row.ty, row.market), row.data);
        }
        for row in rent_adjustments {
            facts.rent_adjustments.insert((id, row.zone, row.ty), row.value);
        }
        for row in supply {
            facts.supply.insert((id, row.zone, row.ty), row.value);
        }
        for row in bids_adjustments {
            facts.bids_adjustments.insert((id, row.zone, row.ty, row.agent), row.value);
        }
        for row in demand_exogenous_cutoff {
            facts.demand_exogenous_cutoff.insert((id, row.zone, row.ty, row.agent), row.value);
        }
        for row in subsidies {
            facts.subsidies.insert((id, row.zone, row.ty, row.agent), row.value);
        }
        for row in demand {
            facts.demand.insert((id, row.agent), row.value);
        }
        for row in bids_functions {
            facts.bids_functions.insert((id, row.market, row.aggregate, row.attrib), row.params);
        }
        for row in rent_functions {
            facts.rent_functions.insert((id, row.market, row.attrib), row.params);
        }
    }
}

/// The spatial-query-capable relational store.
///
/// Readers take a [`Connection`] per request; writers commit whole models
/// through [`Database::commit`], which either applies everything or nothing.
#[derive(Debug, Default)]
pub struct Database {
    tables: RwLock<Tables>,
    verbose: u8,
}

impl Database {
    pub fn new() -> Self { Self::default() }

    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    /// Acquire a scoped read connection; released when dropped.
    pub fn connect(&self) -> Result<Connection<'_>> {
        let tables = self.tables.read()
            .map_err(|_| Error::Store(anyhow!("store lock poisoned")))?;
        Ok(Connection { tables })
    }

    /// Validate and insert one model, returning its new id.
    pub fn commit(&self, batch: ModelBatch) -> Result<ModelId> {
        batch.validate()?;

        let mut tables = self.tables.write()
            .map_err(|_| Error::Store(anyhow!("store lock poisoned")))?;
        if tables.catalog.find(&batch.name).is_some() {
            return Err(Error::ModelExists(batch.name));
        }

        let name = batch.name.clone();
        let zones = batch.zones.len();
        let id = tables.apply(batch);
        if self.verbose > 0 {
            eprintln!("[store] committed model {name:?} as {id} ({zones} zones)");
        }
        Ok(id)
    }

    pub(crate) fn from_tables(tables: Tables) -> Self {
        Self { tables: RwLock::new(tables), verbose: 0 }
    }
}

/// A read view of the store held for the duration of one request.
pub struct Connection<'a> {
    tables: RwLockReadGuard<'a, Tables>,
}

impl Connection<'_> {
    pub fn catalog(&self) -> &ModelCatalog { &self.tables.catalog }

    pub fn geometry(&self) -> &GeometryStore { &self.tables.geometry }

    pub fn facts(&self) -> &FactTableSet { &self.tables.facts }

    /// Look up a model by name, failing with [`Error::ModelNotFound`].
    pub fn model(&self, name: &str) -> Result<&Model> {
        self.catalog().find(name).ok_or_else(|| Error::ModelNotFound(name.to_string()))
    }

    pub(crate) fn tables(&self) -> &Tables { &self.tables }
}
