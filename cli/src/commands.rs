pub mod import;
pub mod models;
pub mod query;
pub mod shapes;
