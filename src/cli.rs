//! Command-line definitions.

use clap::Parser;
use loadtest_populate_map::MapPopulateArgs;
use std::fmt;

/// Printed when the mode argument is absent.
pub const MISSING_MODE_USAGE: &str = "You should pass an argument to run: fill or size";

/// Printed when the mode argument is not one of the known modes.
pub const WRONG_MODE_USAGE: &str = "Wrong argument, you should pass: fill or size";

#[derive(Parser, Debug, Clone)]
#[command(name = "map-loadtest")]
#[command(about = "Fill a distributed key-value map with random entries or report its size")]
#[command(version)]
pub struct Cli {
    /// What to run: "fill" writes random entries until interrupted, "size" prints the entry count
    #[arg(value_name = "MODE")]
    pub mode: Option<String>,

    #[command(flatten)]
    pub args: MapPopulateArgs,
}

/// The two workloads the tool can run.
///
/// Parsed by hand rather than through clap so that an unknown mode prints
/// a usage line and exits cleanly instead of failing argument parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Fill,
    Size,
}

impl Mode {
    /// Resolve the positional argument. The error is the usage line to print.
    pub fn from_arg(arg: Option<&str>) -> Result<Self, &'static str> {
        match arg {
            None => Err(MISSING_MODE_USAGE),
            Some("fill") => Ok(Mode::Fill),
            Some("size") => Ok(Mode::Size),
            Some(_) => Err(WRONG_MODE_USAGE),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Fill => write!(f, "fill"),
            Mode::Size => write!(f, "size"),
        }
    }
}
