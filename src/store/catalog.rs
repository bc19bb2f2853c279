use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::types::{MarketId, ModelId, RealEstateTypeId};

/// Ordered column names of each variable-width attribute category of a Model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headers {
    pub zones: Vec<String>,
    pub agents: Vec<String>,
    pub agents_zones: Vec<String>,
    pub real_estates_zones: Vec<String>,
}

/// A named, independently schemed simulation scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub id: ModelId,
    pub name: String,
    pub headers: Headers,
}

/// Model identities and headers, plus the global reference enumerations.
#[derive(Debug, Default)]
pub struct ModelCatalog {
    models: BTreeMap<ModelId, Model>,
    by_name: AHashMap<String, ModelId>,
    real_estate_types: BTreeSet<RealEstateTypeId>,
    markets: BTreeSet<MarketId>,
}

impl ModelCatalog {
    /// Look up a model by name.
    pub fn find(&self, name: &str) -> Option<&Model> {
        self.by_name.get(name).and_then(|id| self.models.get(id))
    }

    pub fn get(&self, id: ModelId) -> Option<&Model> { self.models.get(&id) }

    /// All models in id order.
    pub fn models(&self) -> impl Iterator<Item = &Model> { self.models.values() }

    pub fn real_estate_types(&self) -> &BTreeSet<RealEstateTypeId> { &self.real_estate_types }

    pub fn markets(&self) -> &BTreeSet<MarketId> { &self.markets }

    /// Next free surrogate id.
    pub(crate) fn next_id(&self) -> ModelId {
        self.models.keys().next_back().map_or(ModelId(1), |id| ModelId(id.0 + 1))
    }

    pub(crate) fn insert(&mut self, model: Model) {
        self.by_name.insert(model.name.clone(), model.id);
        self.models.insert(model.id, model);
    }

    pub(crate) fn register_types(&mut self, types: impl IntoIterator<Item = RealEstateTypeId>) {
        self.real_estate_types.extend(types);
    }

    pub(crate) fn register_markets(&mut self, markets: impl IntoIterator<Item = MarketId>) {
        self.markets.extend(markets);
    }
}
