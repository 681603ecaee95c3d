//! Surfaces a pixel grid can be shown on.
//!
//! The real surface is a window that blocks until a key is pressed. Headless runs
//! write a png instead, or skip displaying altogether.
use image::ImageError;
use log::info;
use ml::pixel_grid::{grid_to_image, PixelGrid};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Title of the window the grid is shown in
pub const WINDOW_TITLE: &str = "data";

pub type DisplayResult<T> = Result<T, DisplayError>;

#[derive(Error, Debug)]
pub enum DisplayError {
    #[error("Could not write image:\n {0}.")]
    Image(#[from] ImageError),
    #[error("Window could not be shown:\n {0}.")]
    Window(String),
    #[error("Built without window support. Rebuild with the `window` feature, or pass --png or --no-display.")]
    WindowUnavailable,
}

/// Renders every value of the grid. ndarray collapses arrays with more than 500
/// elements to `...` unless the alternate flag is set.
pub fn format_grid(grid: &PixelGrid) -> String {
    format!("{:#}", grid)
}

/// Trait for everything that can show a grid to the user
pub trait Viewer {
    /// Shows the grid. Returns once the user is done looking at it.
    fn show(&mut self, title: &str, grid: &PixelGrid) -> DisplayResult<()>;
}

/// Writes the grid as an 8-bit grayscale png.
pub struct PngViewer {
    path: PathBuf,
}

impl PngViewer {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Viewer for PngViewer {
    fn show(&mut self, title: &str, grid: &PixelGrid) -> DisplayResult<()> {
        grid_to_image(grid).save(&self.path)?;
        info!("Wrote {:?} to {}", title, self.path.display());
        Ok(())
    }
}

/// Shows nothing.
pub struct NullViewer {}

impl Viewer for NullViewer {
    fn show(&mut self, _: &str, _: &PixelGrid) -> DisplayResult<()> {
        Ok(())
    }
}

#[cfg(feature = "window")]
pub use window::WindowViewer;

#[cfg(feature = "window")]
mod window {
    use super::{DisplayError, DisplayResult, Viewer};
    use log::debug;
    use minifb::{Key, KeyRepeat, Scale, Window, WindowOptions};
    use ml::pixel_grid::{grid_to_image, PixelGrid};
    use std::time::Duration;

    /// Opens a window and blocks until a key is pressed or the window is closed.
    /// The window is closed again when `show` returns.
    pub struct WindowViewer {
        scale: Scale,
    }

    impl WindowViewer {
        pub fn new() -> Self {
            Self { scale: Scale::X16 }
        }
    }

    impl Default for WindowViewer {
        fn default() -> Self {
            Self::new()
        }
    }

    fn window_error(e: minifb::Error) -> DisplayError {
        DisplayError::Window(e.to_string())
    }

    impl Viewer for WindowViewer {
        fn show(&mut self, title: &str, grid: &PixelGrid) -> DisplayResult<()> {
            let img = grid_to_image(grid);
            let (width, height) = (img.width() as usize, img.height() as usize);
            // minifb wants 0RGB
            let buffer: Vec<u32> = img
                .pixels()
                .map(|p| {
                    let v = p.0[0] as u32;
                    (v << 16) | (v << 8) | v
                })
                .collect();

            let mut window = Window::new(
                title,
                width,
                height,
                WindowOptions {
                    scale: self.scale,
                    ..WindowOptions::default()
                },
            )
            .map_err(window_error)?;
            window.limit_update_rate(Some(Duration::from_micros(16600)));

            debug!("Waiting for a key press in window {:?}", title);
            let mut pressed: Vec<Key> = Vec::new();
            while window.is_open() && pressed.is_empty() {
                window
                    .update_with_buffer(&buffer, width, height)
                    .map_err(window_error)?;
                pressed = window.get_keys_pressed(KeyRepeat::No);
            }
            debug!("Closing window {:?} after keys {:?}", title, pressed);
            Ok(())
        }
    }
}

/// Returns the windowed viewer, if this build has one.
#[cfg(feature = "window")]
pub fn window_viewer() -> DisplayResult<Box<dyn Viewer>> {
    Ok(Box::new(WindowViewer::new()))
}

/// Returns the windowed viewer, if this build has one.
#[cfg(not(feature = "window"))]
pub fn window_viewer() -> DisplayResult<Box<dyn Viewer>> {
    Err(DisplayError::WindowUnavailable)
}

/// Picks the viewer for the `show` command. `no_display` wins over `png`,
/// and the window is used when neither is given.
pub fn select_viewer(png: Option<&Path>, no_display: bool) -> DisplayResult<Box<dyn Viewer>> {
    if no_display {
        return Ok(Box::new(NullViewer {}));
    }
    match png {
        Some(path) => Ok(Box::new(PngViewer::new(path))),
        None => window_viewer(),
    }
}
