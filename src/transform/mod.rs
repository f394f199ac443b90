pub mod band;
pub mod window;

pub use band::{Band, BandBounds, Extremum, FilteredSnapshot, filter_band};
pub use window::TimeWindow;
