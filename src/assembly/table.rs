use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::Value;

/// Output categories consumed by the simulation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Agents,
    AgentsZones,
    BidsAdjustments,
    BidsFunctions,
    Demand,
    DemandExogenousCutoff,
    RealEstatesZones,
    RentAdjustments,
    RentFunctions,
    Subsidies,
    Supply,
    Zones,
}

impl Category {
    pub const ALL: [Category; 12] = [
        Category::Agents,
        Category::AgentsZones,
        Category::BidsAdjustments,
        Category::BidsFunctions,
        Category::Demand,
        Category::DemandExogenousCutoff,
        Category::RealEstatesZones,
        Category::RentAdjustments,
        Category::RentFunctions,
        Category::Subsidies,
        Category::Supply,
        Category::Zones,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Category::Agents => "agents",
            Category::AgentsZones => "agents_zones",
            Category::BidsAdjustments => "bids_adjustments",
            Category::BidsFunctions => "bids_functions",
            Category::Demand => "demand",
            Category::DemandExogenousCutoff => "demand_exogenous_cutoff",
            Category::RealEstatesZones => "real_estates_zones",
            Category::RentAdjustments => "rent_adjustments",
            Category::RentFunctions => "rent_functions",
            Category::Subsidies => "subsidies",
            Category::Supply => "supply",
            Category::Zones => "zones",
        }
    }

    /// Fixed leading columns of the category's header.
    pub fn fixed_header(self) -> &'static [&'static str] {
        match self {
            Category::Agents => &["IDAGENT", "IDMARKET", "IDAGGRA", "UPPERBB"],
            Category::AgentsZones => &["H_IDX", "I_IDX", "ACC", "P_LN_ATT"],
            Category::BidsAdjustments => &["H_IDX", "V_IDX", "I_IDX", "BIDADJ"],
            Category::BidsFunctions => &[
                "IDMARKET", "IDAGGRA", "IDATTRIB", "LINEAPAR", "CAGENT_X", "CREST_X", "CACC_X",
                "CZONES_X", "EXPPAR_X", "CAGENT_Y", "CREST_Y", "CACC_Y", "CZONES_Y", "EXPPAR_Y",
            ],
            Category::Demand => &["H_IDX", "DEMAND"],
            Category::DemandExogenousCutoff => &["H_IDX", "V_IDX", "I_IDX", "DCUTOFF"],
            Category::RealEstatesZones => &["V_IDX", "I_IDX", "M_IDX"],
            Category::RentAdjustments => &["V_IDX", "I_IDX", "RENTADJ"],
            Category::RentFunctions => &[
                "IDMARKET", "IDATTRIB", "SCALEPAR", "LINEAPAR", "CREST_X",
                "CZONES_X", "EXPPAR_X", "CREST_Y", "CZONES_Y", "EXPPAR_Y",
            ],
            Category::Subsidies => &["H_IDX", "V_IDX", "I_IDX", "SUBSIDIES"],
            Category::Supply => &["V_IDX", "I_IDX", "NREST"],
            Category::Zones => &["I_IDX"],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// A header plus records whose width always matches it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    #[serde(skip)]
    category: Category,
    header: Vec<String>,
    records: Vec<Vec<Value>>,
}

impl Table {
    /// Empty table with the category's fixed columns followed by `dynamic` ones.
    pub fn new(category: Category, dynamic: &[String]) -> Self {
        let header = category.fixed_header().iter()
            .map(|column| column.to_string())
            .chain(dynamic.iter().cloned())
            .collect();
        Self { category, header, records: Vec::new() }
    }

    pub fn category(&self) -> Category { self.category }

    pub fn header(&self) -> &[String] { &self.header }

    pub fn records(&self) -> &[Vec<Value>] { &self.records }

    #[inline] pub fn len(&self) -> usize { self.records.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.records.is_empty() }

    /// Append a record of fixed `values` followed by the attribute vector `data`.
    pub fn push(&mut self, values: impl IntoIterator<Item = Value>, data: &[f64]) -> Result<()> {
        let record = values.into_iter()
            .chain(data.iter().map(|&v| Value::Float(v)))
            .collect::<Vec<_>>();
        if record.len() != self.header.len() {
            return Err(Error::RecordWidth {
                category: self.category.name(),
                expected: self.header.len(),
                got: record.len(),
            });
        }
        self.records.push(record);
        Ok(())
    }
}

/// Every output table of one request, keyed by category.
pub type Dataset = BTreeMap<Category, Table>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_fixed_then_dynamic() {
        let table = Table::new(Category::Zones, &["INDAREA".to_string(), "COMAREA".to_string()]);
        assert_eq!(table.header(), ["I_IDX", "INDAREA", "COMAREA"]);
        assert!(table.is_empty());
    }

    #[test]
    fn push_rejects_wrong_width() {
        let mut table = Table::new(Category::Supply, &[]);
        table.push([Value::Int(1), Value::Int(1), Value::Float(3.0)], &[]).unwrap();
        let err = table.push([Value::Int(1)], &[2.0]).unwrap_err();
        assert!(matches!(err, Error::RecordWidth { category: "supply", expected: 3, got: 2 }));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn dataset_serializes_by_category_name() {
        let mut dataset = Dataset::new();
        let mut table = Table::new(Category::Demand, &[]);
        table.push([Value::Int(1), Value::Float(10562.5)], &[]).unwrap();
        dataset.insert(Category::Demand, table);
        dataset.insert(Category::DemandExogenousCutoff, Table::new(Category::DemandExogenousCutoff, &[]));

        let json = serde_json::to_value(&dataset).unwrap();
        assert_eq!(json["demand"]["header"], serde_json::json!(["H_IDX", "DEMAND"]));
        assert_eq!(json["demand"]["records"], serde_json::json!([[1, 10562.5]]));
        assert_eq!(json["demand_exogenous_cutoff"]["records"], serde_json::json!([]));
    }

    #[test]
    fn names_match_serde_names() {
        for category in Category::ALL {
            assert_eq!(serde_json::to_value(category).unwrap(), serde_json::json!(category.name()));
        }
    }
}
