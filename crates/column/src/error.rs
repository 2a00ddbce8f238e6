//! Error taxonomy for column construction, flow propagation and sampling.
//!
//! Dead-end flow is not an error: dropped volume is reported through
//! [`crate::flow::FlowReport`] and the simulation carries on.

use thiserror::Error;

/// Errors raised by the simulation core.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ColumnError {
    /// A parameter is outside its admissible range. Raised before any work.
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig {
        /// Name of the offending parameter.
        field: &'static str,
        /// Human-readable description of the violated range.
        reason: String,
    },

    /// The requested grid does not fit in memory.
    #[error("out of resources: cannot allocate a column of {cells} cells")]
    OutOfResources {
        /// Requested cell count (saturated at `u128::MAX` on overflow).
        cells: u128,
    },

    /// The injection cell lies outside the circular cross-section.
    #[error("injection cell ({x}, {y}, 0) is not a free cell")]
    InjectionNotFree { x: usize, y: usize },

    /// Sampling was requested on a column whose flow has not been propagated.
    #[error("column flow has not been propagated; call propagate_flow first")]
    NotPropagated,

    /// A tracer reached a cell with no wet downstream neighbour.
    #[error("no descent path from cell ({x}, {y}, {z})")]
    NoDescentPath { x: usize, y: usize, z: usize },
}

impl ColumnError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ColumnError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ColumnError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_value() {
        let err = ColumnError::invalid("diameter", "must be positive, got 0");
        assert_eq!(
            err.to_string(),
            "invalid configuration: diameter must be positive, got 0"
        );

        let err = ColumnError::NoDescentPath { x: 2, y: 3, z: 4 };
        assert!(err.to_string().contains("(2, 3, 4)"));
    }
}
