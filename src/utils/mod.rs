mod progress;

pub use progress::{MultiProgressExt, ProgressTemplate};
