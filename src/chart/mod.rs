mod renderer;
mod surface;

pub use renderer::{ChartHandle, ChartOptions, ChartType};
pub use surface::{Surface, SvgSurface, TextAnchor};
