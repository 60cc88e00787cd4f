pub mod helpers;
pub mod renderer;

pub use renderer::{BomRenderer, DEFAULT_TEMPLATE};
