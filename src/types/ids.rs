use std::fmt;

use serde::{Deserialize, Serialize};

use super::Value;

/// Declare a transparent integer key with the bounds needed for range scans.
macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            pub const MIN: Self = Self(<$inner>::MIN);
            pub const MAX: Self = Self(<$inner>::MAX);
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
        }

        impl From<$name> for Value {
            fn from(id: $name) -> Self { Value::Int(id.0 as i64) }
        }
    };
}

id_type!(
    /// Surrogate key of a Model, assigned by the store at commit.
    ModelId(u32)
);
id_type!(
    /// Zone identifier; unique only within its Model.
    ZoneId(i64)
);
id_type!(
    /// Agent identifier; unique only within its Model.
    AgentId(i64)
);
id_type!(
    /// Global real-estate type enumeration.
    RealEstateTypeId(i64)
);
id_type!(
    /// Global market enumeration.
    MarketId(i64)
);
id_type!(
    /// Agent aggregation group.
    AggregateId(i64)
);
id_type!(
    /// Attribute selector used by bid and rent functions.
    AttribId(i64)
);
