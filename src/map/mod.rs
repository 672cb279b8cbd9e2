mod geometry;
mod projection;
mod renderer;

pub use projection::Viewport;
pub use renderer::{MapLayers, MapRenderer, PinCell};
