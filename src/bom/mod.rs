pub mod builder;
pub mod models;

pub use builder::BomBuilder;
pub use models::Bom;
