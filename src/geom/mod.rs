mod bbox;
pub(crate) mod wkb;
pub(crate) mod wkt;

pub(crate) use bbox::ZoneEnvelope;
