mod model;
mod shapes;

pub use model::ModelImporter;
pub use shapes::ShapefileImporter;
