//! Numeric core for inspecting MNIST style digits: loading 28x28 pixel grids,
//! activation functions and cost functions to score predictions.
pub mod activations;
pub mod cost;
pub mod pixel_grid;

pub use activations::Activation;
pub use cost::{der_mse, mse, Cost, LossError, LossResult};
pub use pixel_grid::{load_grid, load_grid_at, GridError, GridResult, PixelGrid};

pub type ImagePrecision = f32;
pub type LossPrecision = f64;
