//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Error taxonomy for the power profile generation engine."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// Parameters rejected before any sampling took place.
    #[error("invalid parameter `{field}`: {reason}")]
    Validation { field: &'static str, reason: String },
    #[error("numeric domain error: {0}")]
    NumericDomain(String),
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

impl SimError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        SimError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn domain(message: impl Into<String>) -> Self {
        SimError::NumericDomain(message.into())
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Checks that `value` is finite and not negative.
pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(SimError::validation(field, format!("{value} is not finite")));
    }
    if value < 0.0 {
        return Err(SimError::validation(field, format!("{value} must not be negative")));
    }
    Ok(value)
}

pub(crate) fn ensure_positive(field: &'static str, value: f64) -> Result<f64> {
    ensure_non_negative(field, value)?;
    if value == 0.0 {
        return Err(SimError::validation(field, "must be greater than zero"));
    }
    Ok(value)
}

/// Checks that `value` lies in the lower-open unit interval `(0, 1]`.
pub(crate) fn ensure_unit_fraction(field: &'static str, value: f64) -> Result<f64> {
    ensure_positive(field, value)?;
    if value > 1.0 {
        return Err(SimError::validation(field, format!("{value} exceeds 1")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_negative_rejects_nan_and_negatives() {
        assert!(ensure_non_negative("x", 0.0).is_ok());
        assert!(ensure_non_negative("x", -0.5).is_err());
        assert!(ensure_non_negative("x", f64::NAN).is_err());
        assert!(ensure_non_negative("x", f64::INFINITY).is_err());
    }

    #[test]
    fn unit_fraction_is_lower_open() {
        assert!(ensure_unit_fraction("yield", 1.0).is_ok());
        assert!(ensure_unit_fraction("yield", 0.85).is_ok());
        assert!(ensure_unit_fraction("yield", 0.0).is_err());
        assert!(ensure_unit_fraction("yield", 1.01).is_err());
    }

    #[test]
    fn validation_message_names_field() {
        let err = ensure_positive("mix_minutes", 0.0).unwrap_err();
        assert!(err.to_string().contains("mix_minutes"));
    }
}
