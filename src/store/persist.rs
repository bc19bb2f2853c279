use std::path::Path;

use anyhow::{Context, ensure};
use geo::Polygon;
use serde::{Deserialize, Serialize};

use crate::common::{ensure_dir_exists, require_dir_exists};
use crate::error::{Error, Result};
use crate::geom::wkb::{read_polygons, write_polygons};
use crate::pack::{DiskPack, Manifest, PackSink, PackSource, put_json};
use crate::store::*;
use crate::types::{MarketId, ModelId, RealEstateTypeId};

const CATALOG: &str = "catalog.json";

fn tables_path(model: ModelId) -> String { format!("models/{model}/tables.json") }

fn zones_path(model: ModelId) -> String { format!("models/{model}/zones.wkb") }

#[derive(Debug, Serialize, Deserialize)]
struct CatalogEntry {
    id: ModelId,
    name: String,
}

/// Contents of catalog.json: model identities and the global enumerations.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    models: Vec<CatalogEntry>,
    real_estate_types: Vec<RealEstateTypeId>,
    markets: Vec<MarketId>,
}

impl Tables {
    /// Rebuild the batch a model was committed from.
    pub(crate) fn extract(&self, model: &Model) -> ModelBatch {
        let id = model.id;
        let facts = &self.facts;
        let zone_type = |table: &FactTable<ZoneTypeKey, f64>| table.model(id)
            .map(|(&(_, zone, ty), &value)| ZoneTypeValue { ty, zone, value })
            .collect::<Vec<_>>();
        let zone_type_agent = |table: &FactTable<ZoneTypeAgentKey, f64>| table.model(id)
            .map(|(&(_, zone, ty, agent), &value)| ZoneTypeAgentValue { agent, ty, zone, value })
            .collect::<Vec<_>>();

        ModelBatch {
            name: model.name.clone(),
            headers: model.headers.clone(),
            zones: self.geometry.zones(id)
                .map(|zone| ZoneRow { id: zone.id, data: zone.data.clone(), area: zone.area.clone() })
                .collect(),
            agents: facts.agents.model(id)
                .map(|(&(_, agent), row)| AgentRow {
                    id: agent,
                    market: row.market,
                    aggregate: row.aggregate,
                    upper_bound: row.upper_bound,
                    data: row.data.clone(),
                })
                .collect(),
            agents_zones: facts.agents_zones.model(id)
                .map(|(&(_, zone, agent), row)| AgentZoneRow {
                    agent, zone, acc: row.acc, att: row.att, data: row.data.clone(),
                })
                .collect(),
            bids_adjustments: zone_type_agent(&facts.bids_adjustments),
            bids_functions: facts.bids_functions.model(id)
                .map(|(&(_, market, aggregate, attrib), &params)| BidFunctionRow { market, aggregate, attrib, params })
                .collect(),
            demand: facts.demand.model(id)
                .map(|(&(_, agent), &value)| AgentValue { agent, value })
                .collect(),
            demand_exogenous_cutoff: zone_type_agent(&facts.demand_exogenous_cutoff),
            real_estates_zones: facts.real_estates_zones.model(id)
                .map(|(&(_, zone, ty, market), data)| RealEstateZoneRow { ty, zone, market, data: data.clone() })
                .collect(),
            rent_adjustments: zone_type(&facts.rent_adjustments),
            rent_functions: facts.rent_functions.model(id)
                .map(|(&(_, market, attrib), &params)| RentFunctionRow { market, attrib, params })
                .collect(),
            subsidies: zone_type_agent(&facts.subsidies),
            supply: zone_type(&facts.supply),
        }
    }
}

fn write_tables(tables: &Tables, sink: &mut dyn PackSink) -> anyhow::Result<Manifest> {
    let mut manifest = Manifest::new();

    for model in tables.catalog.models() {
        let batch = tables.extract(model);
        let areas = batch.zones.iter().map(|zone| zone.area.clone()).collect::<Vec<Polygon<f64>>>();

        let rel = zones_path(model.id);
        let wkb = write_polygons(&areas, true)
            .with_context(|| format!("Failed to encode zones of model {}", model.name))?;
        sink.put(&rel, &wkb)?;
        manifest.add_file(&rel, &wkb);

        let rel = tables_path(model.id);
        let bytes = put_json(sink, &rel, &batch)?;
        manifest.add_file(&rel, &bytes);

        manifest.count("models", 1);
        manifest.count("zones", batch.zones.len());
        manifest.count("agents", batch.agents.len());
    }

    let catalog = CatalogFile {
        models: tables.catalog.models()
            .map(|model| CatalogEntry { id: model.id, name: model.name.clone() })
            .collect(),
        real_estate_types: tables.catalog.real_estate_types().iter().copied().collect(),
        markets: tables.catalog.markets().iter().copied().collect(),
    };
    let bytes = put_json(sink, CATALOG, &catalog)?;
    manifest.add_file(CATALOG, &bytes);

    manifest.write(sink)?;
    Ok(manifest)
}

fn read_tables(src: &dyn PackSource) -> anyhow::Result<Tables> {
    let manifest = Manifest::read(src)?;
    let catalog: CatalogFile = manifest.get_json(src, CATALOG)?;

    let mut tables = Tables::default();
    for entry in catalog.models {
        let mut batch: ModelBatch = manifest.get_json(src, &tables_path(entry.id))?;
        ensure!(batch.name == entry.name, "model {} is named {:?} in its tables", entry.id, batch.name);

        let areas = read_polygons(&manifest.get_verified(src, &zones_path(entry.id))?)
            .with_context(|| format!("Failed to decode zones of model {}", entry.name))?;
        ensure!(areas.len() == batch.zones.len(),
            "model {} has {} zone rows but {} polygons", entry.name, batch.zones.len(), areas.len());
        for (zone, area) in batch.zones.iter_mut().zip(areas) {
            zone.area = area;
        }

        batch.validate()?;
        tables.apply_as(entry.id, batch);
    }
    tables.catalog.register_types(catalog.real_estate_types);
    tables.catalog.register_markets(catalog.markets);
    Ok(tables)
}

impl Database {
    /// Write the whole store to a pack directory.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        ensure_dir_exists(dir)?;
        self.write_to_pack(&mut DiskPack::new(dir))?;
        if self.verbose > 0 {
            eprintln!("[store] saved to {}", dir.display());
        }
        Ok(())
    }

    /// Load a store from a pack directory written by [`Database::save`].
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        require_dir_exists(dir)?;
        Self::read_from_pack(&DiskPack::new(dir))
    }

    pub fn write_to_pack(&self, sink: &mut dyn PackSink) -> Result<()> {
        let conn = self.connect()?;
        write_tables(conn.tables(), sink).map_err(Error::Store)?;
        Ok(())
    }

    /// Load a store, verifying every file against the pack manifest.
    pub fn read_from_pack(src: &dyn PackSource) -> Result<Self> {
        read_tables(src).map(Self::from_tables).map_err(Error::Store)
    }
}
