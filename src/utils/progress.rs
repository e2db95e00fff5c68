use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

const MESSAGE_TEMPLATE: &str = "{spinner} {wide_msg}";
const STEPS_TEMPLATE: &str = "{spinner} {msg:18} {wide_bar} {pos}/{len}";

pub trait MultiProgressExt {
    fn add_with_style(&self, pb: ProgressBar, style: ProgressStyle) -> ProgressBar;
}

impl MultiProgressExt for MultiProgress {
    fn add_with_style(&self, pb: ProgressBar, style: ProgressStyle) -> ProgressBar {
        let pb = self.add(pb);
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

pub struct ProgressTemplate;

impl ProgressTemplate {
    pub fn message() -> ProgressStyle {
        ProgressStyle::with_template(MESSAGE_TEMPLATE).unwrap()
    }

    pub fn steps() -> ProgressStyle {
        ProgressStyle::with_template(STEPS_TEMPLATE)
            .unwrap()
            .progress_chars("#>-")
    }
}
