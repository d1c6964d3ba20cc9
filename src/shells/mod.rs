//! shells — radial windows and redshift partitioning.
//!
//! Purpose
//! -------
//! Describe the radial extent of each shell as a sampled window function and
//! distribute a redshift distribution over the shells, so that per-shell
//! fields can be combined into projected quantities such as galaxy number
//! density.
//!
//! Key behaviors
//! -------------
//! - [`RadialWindow`]: validated, piecewise-linear `w(z)`; [`tophat_windows`]
//!   builds contiguous unit-height shells from a grid of edges, and
//!   [`weighted_tophat_windows`] the same shells shaped by a weight `w(z)`.
//! - [`partition`]: per-shell weights `∫ n(z) w_i(z) dz` with the
//!   distribution's total and the resulting coverage error.
//!
//! Conventions
//! -----------
//! - Redshift samples are strictly increasing; functions are zero outside
//!   their samples.
//! - Shell order follows window order.

pub mod errors;
pub mod partition;
pub mod window;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::errors::{ShellError, ShellResult};
pub use self::partition::{Partition, partition};
pub use self::window::{RadialWindow, TOPHAT_DZ, tophat_windows, weighted_tophat_windows};

pub mod prelude {
    pub use super::errors::{ShellError, ShellResult};
    pub use super::partition::{Partition, partition};
    pub use super::window::{RadialWindow, tophat_windows, weighted_tophat_windows};
}
