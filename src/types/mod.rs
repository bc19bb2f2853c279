mod ids;
mod value;

pub use ids::{AgentId, AggregateId, AttribId, MarketId, ModelId, RealEstateTypeId, ZoneId};
pub use value::Value;
