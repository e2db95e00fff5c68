mod debounce;
mod events;
mod state;

pub use debounce::Debouncer;
pub use events::Event;
pub use state::{ChartId, DashboardApp};
