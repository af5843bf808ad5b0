pub mod tracker;
pub mod window;

pub use tracker::CorrectionTracker;
pub use window::{open_errors_in_window, OpenError, OpenErrorDay, DEFAULT_WINDOW_DAYS};
