//! Command line interface for looking at 28x28 digit dumps and scoring
//! classifier outputs against their labels.

use digitview::{
    format_grid, select_viewer, LossReport, Vector, DEFAULT_PREDICTED, DEFAULT_TARGET, WINDOW_TITLE,
};
use env_logger::Builder;
use log::{debug, info};
use ml::{load_grid_at, Cost};
use quicli::prelude::*;
use std::path::PathBuf;
use structopt::StructOpt;

/// Prints a digit dump and shows it as a grayscale image
#[derive(Debug, StructOpt)]
struct ShowOpts {
    /// Path to the digit: 784 whitespace separated values in [0, 1] (.txt), an .npy array
    /// of 784 values, a 28x28 .png/.jpg, or an MNIST *idx3-ubyte image file
    #[structopt(parse(from_os_str), default_value = "data.txt")]
    file: PathBuf,
    /// Which digit of an idx3-ubyte file to show
    #[structopt(short = "i", long = "index", default_value = "0")]
    index: usize,
    /// Writes the image to this png instead of opening a window
    #[structopt(long = "png", parse(from_os_str))]
    png: Option<PathBuf>,
    /// Only prints the grid, shows nothing
    #[structopt(long = "no-display")]
    no_display: bool,
    #[structopt(flatten)]
    verbosity: Verbosity,
}

/// Prints the mean squared error of a prediction and its derivative
#[derive(Debug, StructOpt)]
struct LossOpts {
    /// Predicted vector, comma separated. Defaults to a fixed 10 class prediction
    #[structopt(short = "p", long = "predicted")]
    predicted: Option<Vector>,
    /// Target vector, comma separated. Defaults to the one-hot label of the digit 6
    #[structopt(short = "t", long = "target")]
    target: Option<Vector>,
    /// Additional cost to print (mse, cross-entropy)
    #[structopt(short = "c", long = "cost", default_value = "mse")]
    cost: Cost,
    #[structopt(flatten)]
    verbosity: Verbosity,
}

/// Inspect digit dumps and score predictions.
#[derive(Debug, StructOpt)]
#[structopt(name = "digitview")]
enum Digitview {
    #[structopt(
        name = "show",
        about = "Prints a 28x28 digit and shows it in a window until a key is pressed."
    )]
    Show(ShowOpts),
    #[structopt(
        name = "loss",
        about = "Prints the mean squared error and its derivative, one per line."
    )]
    Loss(LossOpts),
}

/// Trait for the subcommands that digitview uses
trait DigitviewOpts {
    /// Performs the subcommand
    fn run(&self) -> CliResult;
    /// Returns the verbosity command
    fn get_verbosity(&self) -> &Verbosity;
    /// Sets up logging
    fn setup_env_logger(&self) -> CliResult {
        let mut builder = Builder::from_default_env();

        builder
            .filter(None, self.get_verbosity().log_level().to_level_filter())
            .init();

        Ok(())
    }
}

impl DigitviewOpts for ShowOpts {
    fn run(&self) -> CliResult {
        let grid = load_grid_at(&self.file, self.index)?;
        info!("Loaded grid of shape {:?} from {}", grid.dim(), self.file.display());
        println!("{}", format_grid(&grid));

        let mut viewer = select_viewer(self.png.as_deref(), self.no_display)?;
        viewer.show(WINDOW_TITLE, &grid)?;
        Ok(())
    }

    fn get_verbosity(&self) -> &Verbosity {
        &self.verbosity
    }
}

impl DigitviewOpts for LossOpts {
    fn run(&self) -> CliResult {
        let predicted = self
            .predicted
            .as_ref()
            .map_or(&DEFAULT_PREDICTED[..], Vector::as_slice);
        let target = self
            .target
            .as_ref()
            .map_or(&DEFAULT_TARGET[..], Vector::as_slice);
        debug!("predicted = {:?}, target = {:?}", predicted, target);

        let report = LossReport::new(predicted, target, self.cost)?;
        println!("{}", report);
        Ok(())
    }

    fn get_verbosity(&self) -> &Verbosity {
        &self.verbosity
    }
}

impl DigitviewOpts for Digitview {
    fn run(&self) -> CliResult {
        match self {
            Digitview::Show(c) => c.run(),
            Digitview::Loss(c) => c.run(),
        }
    }

    fn get_verbosity(&self) -> &Verbosity {
        match self {
            Digitview::Show(c) => c.get_verbosity(),
            Digitview::Loss(c) => c.get_verbosity(),
        }
    }
}

fn main() -> CliResult {
    let args = Digitview::from_args();
    args.setup_env_logger()?;
    args.run()
}
