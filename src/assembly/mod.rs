mod request;
mod resolve;
mod table;

pub use request::{Location, Overrides, Position, QueryPoint, Unit, parse_locations};
pub use resolve::ZoneResolver;
pub use table::{Category, Dataset, Table};

use crate::error::Result;
use crate::store::{
    Connection, Database, FactTable, Model, PointParam, PointParams, ZoneTypeAgentKey, ZoneTypeKey,
};
use crate::types::{ModelId, Value};

#[inline]
fn point_number(point: &PointParam) -> Value { Value::Int(point.index as i64) }

/// Builds the per-category input tables of the simulation engine for a set
/// of query locations.
///
/// Each [`AssemblyEngine::get`] call holds one store connection for its whole
/// duration and drops it on return, on success or failure.
pub struct AssemblyEngine<'db> {
    db: &'db Database,
    verbose: u8,
}

impl<'db> AssemblyEngine<'db> {
    pub fn new(db: &'db Database) -> Self { Self { db, verbose: 0 } }

    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    /// Assemble every category for `locations` against the model named `model_name`.
    pub fn get(&self, model_name: &str, locations: &[Location]) -> Result<Dataset> {
        let mut points = QueryPoint::flatten(locations)?;

        let conn = self.db.connect()?;
        let model = conn.model(model_name)?;

        let positions = points.iter().map(|point| point.position).collect::<Vec<_>>();
        let resolved = ZoneResolver::new(conn.geometry())?.resolve(model.id, &positions);
        for &(i, zone) in &resolved {
            points[i].zone = Some(zone);
        }
        if self.verbose > 0 {
            eprintln!("[assemble] model {model_name:?}: {} points, {} inside a zone", points.len(), resolved.len());
        }
        if self.verbose > 1 {
            for point in points.iter().filter(|point| point.zone.is_none()) {
                eprintln!("[assemble] point {} ({}, {}) is outside every zone of the model",
                    point.index, point.position.lng, point.position.lat);
            }
        }

        let params = PointParams::new(points.iter().filter_map(|point| {
            point.zone.map(|zone| PointParam { index: point.index, zone, ty: point.ty })
        }));

        let assembly = Assembly { conn: &conn, model, params: &params };
        let tables = [
            assembly.zones()?,
            assembly.agents()?,
            assembly.agents_zones()?,
            assembly.zone_type_agent(Category::BidsAdjustments, &conn.facts().bids_adjustments)?,
            assembly.bids_functions()?,
            assembly.demand()?,
            assembly.zone_type_agent(Category::DemandExogenousCutoff, &conn.facts().demand_exogenous_cutoff)?,
            assembly.real_estates_zones()?,
            assembly.zone_type(Category::RentAdjustments, &conn.facts().rent_adjustments)?,
            assembly.rent_functions()?,
            assembly.zone_type_agent(Category::Subsidies, &conn.facts().subsidies)?,
            assembly.zone_type(Category::Supply, &conn.facts().supply)?,
        ];

        if self.verbose > 1 {
            for table in &tables {
                eprintln!("[assemble] {}: {} records", table.category(), table.len());
            }
        }
        Ok(tables.into_iter().map(|table| (table.category(), table)).collect())
    }
}

/// Per-request join state: one model, one resolved point set.
struct Assembly<'a> {
    conn: &'a Connection<'a>,
    model: &'a Model,
    params: &'a PointParams,
}

impl Assembly<'_> {
    fn id(&self) -> ModelId { self.model.id }

    /// One record per resolved point: the point number and its zone's attributes.
    fn zones(&self) -> Result<Table> {
        let mut table = Table::new(Category::Zones, &self.model.headers.zones);
        for point in self.params.iter() {
            if let Some(zone) = self.conn.geometry().zone(self.id(), point.zone) {
                table.push([point_number(point)], &zone.data)?;
            }
        }
        Ok(table)
    }

    /// Every agent of the model; independent of zone resolution.
    fn agents(&self) -> Result<Table> {
        let mut table = Table::new(Category::Agents, &self.model.headers.agents);
        for (&(_, id), agent) in self.conn.facts().agents.model(self.id()) {
            table.push([
                Value::from(id),
                Value::from(agent.market),
                Value::from(agent.aggregate),
                Value::Float(agent.upper_bound),
            ], &agent.data)?;
        }
        Ok(table)
    }

    fn agents_zones(&self) -> Result<Table> {
        let mut table = Table::new(Category::AgentsZones, &self.model.headers.agents_zones);
        for (point, &(_, _, agent), row) in self.params.join(&self.conn.facts().agents_zones, self.id()) {
            table.push([
                Value::from(agent),
                point_number(point),
                Value::Float(row.acc),
                Value::Float(row.att),
            ], &row.data)?;
        }
        Ok(table)
    }

    fn bids_functions(&self) -> Result<Table> {
        let mut table = Table::new(Category::BidsFunctions, &[]);
        for (&(_, market, aggregate, attrib), params) in self.conn.facts().bids_functions.model(self.id()) {
            table.push([Value::from(market), Value::from(aggregate), Value::from(attrib)], params)?;
        }
        Ok(table)
    }

    fn demand(&self) -> Result<Table> {
        let mut table = Table::new(Category::Demand, &[]);
        for (&(_, agent), &demand) in self.conn.facts().demand.model(self.id()) {
            table.push([Value::from(agent), Value::Float(demand)], &[])?;
        }
        Ok(table)
    }

    fn real_estates_zones(&self) -> Result<Table> {
        let mut table = Table::new(Category::RealEstatesZones, &self.model.headers.real_estates_zones);
        for (point, &(_, _, ty, market), data) in self.params.join(&self.conn.facts().real_estates_zones, self.id()) {
            table.push([Value::from(ty), point_number(point), Value::from(market)], data)?;
        }
        Ok(table)
    }

    fn rent_functions(&self) -> Result<Table> {
        let mut table = Table::new(Category::RentFunctions, &[]);
        for (&(_, market, attrib), params) in self.conn.facts().rent_functions.model(self.id()) {
            table.push([Value::from(market), Value::from(attrib)], params)?;
        }
        Ok(table)
    }

    /// `[type, point#, value]` records of a (zone, type) keyed measure.
    fn zone_type(&self, category: Category, facts: &FactTable<ZoneTypeKey, f64>) -> Result<Table> {
        let mut table = Table::new(category, &[]);
        for (point, &(_, _, ty), &value) in self.params.join(facts, self.id()) {
            table.push([Value::from(ty), point_number(point), Value::Float(value)], &[])?;
        }
        Ok(table)
    }

    /// `[agent, type, point#, value]` records of a (zone, type, agent) keyed measure.
    fn zone_type_agent(&self, category: Category, facts: &FactTable<ZoneTypeAgentKey, f64>) -> Result<Table> {
        let mut table = Table::new(category, &[]);
        for (point, &(_, _, ty, agent), &value) in self.params.join(facts, self.id()) {
            table.push([Value::from(agent), Value::from(ty), point_number(point), Value::Float(value)], &[])?;
        }
        Ok(table)
    }
}
