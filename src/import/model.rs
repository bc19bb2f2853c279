use std::path::PathBuf;

use anyhow::Context;

use crate::common::{CsvTable, Projection, Srid, require_dir_exists};
use crate::error::{Error, Result};
use crate::import::ShapefileImporter;
use crate::store::*;
use crate::types::{AgentId, AggregateId, AttribId, MarketId, ModelId, RealEstateTypeId, ZoneId};

/// One data row of a CSV table, with errors pointing at its file line.
struct Row<'a> {
    table: &'a CsvTable,
    index: usize,
}

impl Row<'_> {
    fn cells(&self) -> &[f64] { &self.table.rows[self.index] }

    fn error(&self, reason: impl Into<String>) -> Error {
        Error::InvalidRow { path: self.table.path.clone(), line: self.table.line(self.index), reason: reason.into() }
    }

    fn value(&self, col: usize) -> Result<f64> {
        self.cells().get(col).copied()
            .ok_or_else(|| self.error(format!("missing column {}", col + 1)))
    }

    /// An id column; must hold an integral value.
    fn id(&self, col: usize) -> Result<i64> {
        let value = self.value(col)?;
        if !value.is_finite() || value.fract() != 0.0 {
            return Err(self.error(format!("column {} holds non-integral id {value}", col + 1)));
        }
        Ok(value as i64)
    }

    /// Every column from `col` on.
    fn rest(&self, col: usize) -> Vec<f64> {
        self.cells().get(col..).map(<[f64]>::to_vec).unwrap_or_default()
    }

    /// Exactly `N` columns starting at `col`.
    fn array<const N: usize>(&self, col: usize) -> Result<[f64; N]> {
        let rest = self.rest(col);
        let got = rest.len();
        rest.try_into().map_err(|_| self.error(format!("expected {N} parameters, found {got}")))
    }
}

fn rows(table: &CsvTable) -> impl Iterator<Item = Row<'_>> {
    (0..table.rows.len()).map(move |index| Row { table, index })
}

/// Imports one model from a directory of semicolon-delimited CSV files and a
/// polygon shapefile named after the model.
pub struct ModelImporter {
    dir: PathBuf,
    name: String,
    srid: Srid,
    verbose: u8,
}

impl ModelImporter {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self { dir: dir.into(), name: name.into(), srid: Srid::Wgs84, verbose: 0 }
    }

    /// Reference system of the shapefile coordinates (default EPSG:4326).
    pub fn with_srid(mut self, srid: Srid) -> Self {
        self.srid = srid;
        self
    }

    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn shapefile_path(&self) -> PathBuf { self.dir.join(format!("{}.shp", self.name)) }

    fn path(&self, file: &str) -> PathBuf { self.dir.join(file) }

    fn table(&self, file: &str) -> Result<CsvTable> {
        let path = self.path(file);
        let table = CsvTable::read(&path)?;
        if self.verbose > 1 {
            eprintln!("[import] {}: {} columns, {} rows", path.display(), table.header.len(), table.rows.len());
        }
        Ok(table)
    }

    fn optional_table(&self, file: &str) -> Result<Option<CsvTable>> {
        if !self.path(file).is_file() {
            if self.verbose > 1 {
                eprintln!("[import] {file} not present, skipping");
            }
            return Ok(None);
        }
        self.table(file).map(Some)
    }

    /// Read and reproject everything into a batch, without touching any store.
    pub fn read(&self) -> Result<ModelBatch> {
        require_dir_exists(&self.dir)?;

        let zones = self.table("zones.csv")?;
        let agents = self.table("agents.csv")?;
        let agents_zones = self.table("agents_zones.csv")?;
        let real_estates_zones = self.table("real_estates_zones.csv")?;
        let rent_adjustments = self.table("rent_adjustments.csv")?;
        rent_adjustments.header_after(3)?;

        let headers = Headers {
            zones: zones.header_after(1)?,
            agents: agents.header_after(4)?,
            agents_zones: agents_zones.header_after(4)?,
            real_estates_zones: real_estates_zones.header_after(3)?,
        };
        let mut batch = ModelBatch::new(self.name.clone(), headers);

        let shapefile = ShapefileImporter::new(self.shapefile_path()).with_verbose(self.verbose);
        let shapes = shapefile.zone_shapes()?;
        let projection = Projection::to_storage(self.srid)?;

        for row in rows(&zones) {
            let id = ZoneId(row.id(0)?);
            let polygon = shapes.get(&id).ok_or_else(|| Error::MissingZoneGeometry {
                path: shapefile.path().to_path_buf(),
                zone: id,
            })?;
            let area = projection.polygon(polygon)
                .with_context(|| format!("Failed to reproject zone {id} from EPSG:{}", self.srid.epsg()))?;
            batch.zones.push(ZoneRow { id, data: row.rest(1), area });
        }

        for row in rows(&agents) {
            batch.agents.push(AgentRow {
                id: AgentId(row.id(0)?),
                market: MarketId(row.id(1)?),
                aggregate: AggregateId(row.id(2)?),
                upper_bound: row.value(3)?,
                data: row.rest(4),
            });
        }

        for row in rows(&agents_zones) {
            batch.agents_zones.push(AgentZoneRow {
                agent: AgentId(row.id(0)?),
                zone: ZoneId(row.id(1)?),
                acc: row.value(2)?,
                att: row.value(3)?,
                data: row.rest(4),
            });
        }

        for row in rows(&real_estates_zones) {
            batch.real_estates_zones.push(RealEstateZoneRow {
                ty: RealEstateTypeId(row.id(0)?),
                zone: ZoneId(row.id(1)?),
                market: MarketId(row.id(2)?),
                data: row.rest(3),
            });
        }

        batch.rent_adjustments = zone_type_values(&rent_adjustments)?;
        if let Some(table) = self.optional_table("supply.csv")? {
            batch.supply = zone_type_values(&table)?;
        }
        if let Some(table) = self.optional_table("bids_adjustments.csv")? {
            batch.bids_adjustments = zone_type_agent_values(&table)?;
        }
        if let Some(table) = self.optional_table("demand_exogenous_cutoff.csv")? {
            batch.demand_exogenous_cutoff = zone_type_agent_values(&table)?;
        }
        if let Some(table) = self.optional_table("subsidies.csv")? {
            batch.subsidies = zone_type_agent_values(&table)?;
        }
        if let Some(table) = self.optional_table("demand.csv")? {
            for row in rows(&table) {
                batch.demand.push(AgentValue { agent: AgentId(row.id(0)?), value: row.value(1)? });
            }
        }
        if let Some(table) = self.optional_table("bids_functions.csv")? {
            for row in rows(&table) {
                batch.bids_functions.push(BidFunctionRow {
                    market: MarketId(row.id(0)?),
                    aggregate: AggregateId(row.id(1)?),
                    attrib: AttribId(row.id(2)?),
                    params: row.array(3)?,
                });
            }
        }
        if let Some(table) = self.optional_table("rent_functions.csv")? {
            for row in rows(&table) {
                batch.rent_functions.push(RentFunctionRow {
                    market: MarketId(row.id(0)?),
                    attrib: AttribId(row.id(1)?),
                    params: row.array(2)?,
                });
            }
        }

        if self.verbose > 0 {
            eprintln!("[import] model {:?}: {} zones, {} agents, {} rent adjustments",
                self.name, batch.zones.len(), batch.agents.len(), batch.rent_adjustments.len());
        }
        Ok(batch)
    }

    /// Read the model and commit it as a single unit; nothing is stored on failure.
    pub fn import(&self, db: &Database) -> Result<ModelId> {
        let batch = self.read()?;
        let id = db.commit(batch)?;
        if self.verbose > 0 {
            eprintln!("[import] imported {:?} from {} as model {id}", self.name, self.dir.display());
        }
        Ok(id)
    }
}

/// Rows laid out as `V_IDX; I_IDX; value`.
fn zone_type_values(table: &CsvTable) -> Result<Vec<ZoneTypeValue>> {
    rows(table)
        .map(|row| Ok(ZoneTypeValue {
            ty: RealEstateTypeId(row.id(0)?),
            zone: ZoneId(row.id(1)?),
            value: row.value(2)?,
        }))
        .collect()
}

/// Rows laid out as `H_IDX; V_IDX; I_IDX; value`.
fn zone_type_agent_values(table: &CsvTable) -> Result<Vec<ZoneTypeAgentValue>> {
    rows(table)
        .map(|row| Ok(ZoneTypeAgentValue {
            agent: AgentId(row.id(0)?),
            ty: RealEstateTypeId(row.id(1)?),
            zone: ZoneId(row.id(2)?),
            value: row.value(3)?,
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn table(contents: &str) -> (tempfile::TempDir, CsvTable) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, contents).unwrap();
        let table = CsvTable::read(&path).unwrap();
        (dir, table)
    }

    #[test]
    fn ids_must_be_integral() {
        let (_dir, table) = table("\"V_IDX\";\"I_IDX\";\"NREST\"\n1.00;2.00;0.5\n1.50;2.00;0.5\n");
        let err = zone_type_values(&table).unwrap_err();
        assert!(matches!(err, Error::InvalidRow { line: 3, .. }));
    }

    #[test]
    fn zone_type_agent_layout() {
        let (_dir, table) = table("\"H_IDX\";\"V_IDX\";\"I_IDX\";\"BIDADJ\"\n4;2;9;0.25\n");
        let rows = zone_type_agent_values(&table).unwrap();
        assert_eq!(rows, vec![ZoneTypeAgentValue {
            agent: AgentId(4), ty: RealEstateTypeId(2), zone: ZoneId(9), value: 0.25,
        }]);
    }

    #[test]
    fn function_rows_need_every_parameter() {
        let (_dir, table) = table("\"IDMARKET\";\"IDATTRIB\";\"SCALEPAR\"\n1;1;0.4\n");
        let row = rows(&table).next().unwrap();
        assert!(matches!(row.array::<RENT_FUNCTION_PARAMS>(2), Err(Error::InvalidRow { line: 2, .. })));
        assert_eq!(row.array::<1>(2).unwrap(), [0.4]);
    }

    #[test]
    fn missing_directory_is_an_error() {
        let importer = ModelImporter::new("/nonexistent/model/dir", "m1");
        assert!(importer.read().is_err());
    }
}
