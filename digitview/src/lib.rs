//! Building blocks of the digitview command line interface: the surfaces a
//! pixel grid is shown on and the loss report printed for a prediction.
pub mod display;
pub mod report;

pub use display::{format_grid, select_viewer, DisplayError, DisplayResult, Viewer, WINDOW_TITLE};
pub use report::{LossReport, Vector, DEFAULT_PREDICTED, DEFAULT_TARGET};
