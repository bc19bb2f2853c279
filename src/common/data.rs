use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use polars::{
    frame::DataFrame,
    io::SerReader,
    prelude::{CsvReadOptions, DataType},
};
use shapefile::{Reader, Shape, dbase::Record};

/// A semicolon-delimited CSV file: its header row and its data rows as numbers.
#[derive(Debug, Clone)]
pub(crate) struct CsvTable {
    pub path: PathBuf,
    pub header: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl CsvTable {
    /// Read a semicolon-delimited CSV file with one header row and numeric data rows.
    pub(crate) fn read(path: &Path) -> Result<Self> {
        let df = read_from_semicolon_csv(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            header: df.get_column_names().iter().map(|name| name.to_string()).collect(),
            rows: numeric_rows(&df, path)?,
        })
    }

    /// Header columns after dropping `skip` leading key columns.
    pub(crate) fn header_after(&self, skip: usize) -> Result<Vec<String>> {
        if self.header.len() < skip {
            bail!("{}: expected at least {skip} key columns, found {}", self.path.display(), self.header.len());
        }
        Ok(self.header[skip..].to_vec())
    }

    /// File line number (1-based, header included) of the data row at `row`.
    #[inline] pub(crate) fn line(&self, row: usize) -> usize { row + 2 }
}

/// Reads a semicolon-delimited CSV file from `path` into a Polars DataFrame.
pub(crate) fn read_from_semicolon_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;

    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|po| po.with_separator(b';'))
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("Failed to parse CSV file: {}", path.display()))
}

/// Convert every column to f64 and transpose into row-major order.
fn numeric_rows(df: &DataFrame, path: &Path) -> Result<Vec<Vec<f64>>> {
    let columns = df.get_columns().iter()
        .map(|column| {
            let cast = column.cast(&DataType::Float64)
                .with_context(|| format!("{}: column {} is not numeric", path.display(), column.name()))?;
            Ok(cast.f64()?.into_iter().collect::<Vec<Option<f64>>>())
        })
        .collect::<Result<Vec<_>>>()?;

    (0..df.height())
        .map(|row| {
            columns.iter().enumerate()
                .map(|(col, values)| match values[row] {
                    Some(value) => Ok(value),
                    None => bail!(
                        "{}:{}: empty or non-numeric value in column {}",
                        path.display(), row + 2, df.get_column_names()[col]
                    ),
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

/// Reads all shapes + attribute records from a given `.shp` file path.
pub(crate) fn read_shapefile(path: &Path) -> Result<Vec<(Shape, Record)>> {
    let mut reader = Reader::from_path(path)
        .with_context(|| format!("Failed to open shapefile: {}", path.display()))?;

    let mut items = Vec::with_capacity(reader.shape_count()?);
    for result in reader.iter_shapes_and_records() {
        let (shape, record) = result.context("Error reading shape+record")?;
        items.push((shape, record));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_quoted_header_and_numeric_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.csv");
        fs::write(&path, "\"I_IDX\";\"INDAREA\";\"COMAREA\"\n1.00;2.7441056;0.4679935\n2.00;1.5;0\n").unwrap();

        let table = CsvTable::read(&path).unwrap();
        assert_eq!(table.header, vec!["I_IDX", "INDAREA", "COMAREA"]);
        assert_eq!(table.header_after(1).unwrap(), vec!["INDAREA", "COMAREA"]);
        assert_eq!(table.rows, vec![vec![1.0, 2.7441056, 0.4679935], vec![2.0, 1.5, 0.0]]);
    }

    #[test]
    fn late_decimal_in_integral_column_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zones.csv");
        let mut contents = String::from("\"I_IDX\";\"INDAREA\"\n");
        for i in 1..=150 {
            let value = if i == 140 { "0.5" } else { "0" };
            contents.push_str(&format!("{i};{value}\n"));
        }
        fs::write(&path, contents).unwrap();

        let table = CsvTable::read(&path).unwrap();
        assert_eq!(table.rows.len(), 150);
        assert_eq!(table.rows[139], vec![140.0, 0.5]);
        assert_eq!(table.rows[149], vec![150.0, 0.0]);
    }

    #[test]
    fn non_numeric_cell_reports_its_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("supply.csv");
        fs::write(&path, "\"V_IDX\";\"I_IDX\";\"NREST\"\n1;1;4\n1;2;many\n").unwrap();

        let err = CsvTable::read(&path).unwrap_err();
        assert!(format!("{err:#}").contains(":3:"), "{err:#}");
    }

    #[test]
    fn header_only_file_has_no_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agents.csv");
        fs::write(&path, "\"IDAGENT\";\"IDMARKET\";\"IDAGGRA\";\"UPPERBB\";\"HHINC\"\n").unwrap();

        let table = CsvTable::read(&path).unwrap();
        assert_eq!(table.header_after(4).unwrap(), vec!["HHINC"]);
        assert!(table.rows.is_empty());
    }

    #[test]
    fn too_few_key_columns_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real_estates_zones.csv");
        fs::write(&path, "\"V_IDX\";\"I_IDX\"\n1;1\n").unwrap();

        let table = CsvTable::read(&path).unwrap();
        assert!(table.header_after(3).is_err());
    }
}
