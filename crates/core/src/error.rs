use thiserror::Error;

/// Errors that abort an invocation before any host mutation
///
/// Internal pipeline invariants (partition coverage, minimum region duration,
/// absorption termination) are not represented here: a violated invariant is
/// an implementation bug and halts via assertion instead of being reported as
/// a recoverable error.
#[derive(Debug, Error)]
pub enum PlanError {
    /// Rejected configuration; no analysis was attempted
    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: String,
    },

    /// Loudness meter could not produce a usable reading for the clip
    #[error("loudness measurement failed for clip {clip}")]
    MeasurementFailed { clip: String },

    /// A collaborator (peak source, mutation sink) failed
    #[error("host operation failed for clip {clip}")]
    Host {
        clip: String,
        #[source]
        source: anyhow::Error,
    },
}

impl PlanError {
    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        PlanError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = PlanError::invalid_config("ceiling_db", "must be a finite number");
        assert_eq!(
            err.to_string(),
            "invalid configuration: ceiling_db must be a finite number"
        );
    }

    #[test]
    fn test_measurement_failed_names_clip() {
        let err = PlanError::MeasurementFailed {
            clip: "item-7".to_string(),
        };
        assert!(err.to_string().contains("item-7"));
    }
}
