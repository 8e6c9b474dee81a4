//! Ensemble statistics over member indicator results.
//!
//! Members are indicator results of the same indicator from different
//! climate models, already on a common grid. Each position of the
//! indicator and delta cubes is summarised across members with the mean,
//! standard deviation, maximum, minimum, count of non-missing members and a
//! configurable set of percentiles.
//!
//! # Quick Start
//!
//! ```no_run
//! use kapy_ensemble::{EnsembleConfig, combine_ensemble};
//! # fn members() -> Vec<kapy_indicators::IndicatorResult> { unimplemented!() }
//!
//! let config = EnsembleConfig::new().with_percentiles(vec![10.0, 90.0]);
//! let stats = combine_ensemble(&members(), &config).unwrap();
//! for name in stats.field_names() {
//!     println!("{name}");
//! }
//! ```

mod combine;
mod config;
mod error;

pub use combine::{EnsembleStatistics, combine_ensemble};
pub use config::EnsembleConfig;
pub use error::EnsembleError;

use kapy_indicators::IndicatorResult;

/// Cube shape with the grid split into its lat and lon extents.
fn member_shape(m: &IndicatorResult) -> (usize, usize, usize, usize) {
    let (n_bins, n_seasons, _) = m.axes().shape();
    let (ny, nx) = m.axes().grid().shape();
    (n_bins, n_seasons, ny, nx)
}

/// Validates the members passed to [`combine_ensemble`].
fn validate_members(members: &[IndicatorResult]) -> Result<(), EnsembleError> {
    // 1. At least one member.
    let Some(first) = members.first() else {
        return Err(EnsembleError::EmptyEnsemble);
    };

    for (member, m) in members.iter().enumerate().skip(1) {
        // 2. Same cube shape, including the grid layout.
        if member_shape(m) != member_shape(first) {
            return Err(EnsembleError::ShapeMismatch {
                member,
                id: m.id().to_string(),
                expected: member_shape(first),
                got: member_shape(m),
            });
        }

        // 3. Same bin and season labels.
        let dimension = if m.axes().bins() != first.axes().bins() {
            Some(first.axes().bins().dimension())
        } else if m.axes().seasons() != first.axes().seasons() {
            Some("seasonID")
        } else {
            None
        };
        if let Some(dimension) = dimension {
            return Err(EnsembleError::AxisMismatch {
                member,
                id: m.id().to_string(),
                dimension: dimension.to_string(),
            });
        }

        // 4. Same units.
        if m.units() != first.units() {
            return Err(EnsembleError::UnitsMismatch {
                member,
                id: m.id().to_string(),
                expected: first.units().to_string(),
                got: m.units().to_string(),
            });
        }
    }

    Ok(())
}
