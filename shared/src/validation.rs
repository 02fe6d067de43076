//! Validation utilities for the Warehouse Operations Platform
//!
//! Field-shape rules live on the request types (`validator` derive); the
//! functions here cover rules that span several fields or need the domain
//! error type.

use chrono::NaiveDate;
use validator::ValidationError;

use crate::error::{DomainError, DomainResult};

// ============================================================================
// `validator` custom rules
// ============================================================================

/// Reject strings that are empty after trimming
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}

// ============================================================================
// Domain rules
// ============================================================================

/// Require a non-blank value for `field`
pub fn require_text(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, format!("{} is required", field)));
    }
    Ok(())
}

/// Validate SKU format: non-blank, no whitespace, at most 64 characters
pub fn validate_sku(sku: &str) -> DomainResult<()> {
    require_text("sku", sku)?;
    if sku.chars().any(char::is_whitespace) {
        return Err(DomainError::validation("sku", "SKU must not contain whitespace"));
    }
    if sku.len() > 64 {
        return Err(DomainError::validation("sku", "SKU must be at most 64 characters"));
    }
    Ok(())
}

/// Validate min/max stock thresholds
pub fn validate_stock_thresholds(min_stock: i64, max_stock: i64) -> DomainResult<()> {
    if min_stock < 0 {
        return Err(DomainError::validation("min_stock", "Minimum stock cannot be negative"));
    }
    if max_stock < min_stock {
        return Err(DomainError::validation(
            "max_stock",
            "Maximum stock must be greater than or equal to minimum stock",
        ));
    }
    Ok(())
}

/// Validate a percentage in 0..=100
pub fn validate_percent(field: &str, value: i32) -> DomainResult<()> {
    if !(0..=100).contains(&value) {
        return Err(DomainError::validation(field, format!("{} must be between 0 and 100", field)));
    }
    Ok(())
}

/// Inclusive number of days in `start..=end`, minimum 1
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> DomainResult<i32> {
    if end < start {
        return Err(DomainError::validation(
            "end_date",
            "End date must not be before start date",
        ));
    }
    let days = (end - start).num_days() + 1;
    i32::try_from(days).map_err(|_| DomainError::validation("end_date", "Date range is too long"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("SKU-1").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank("   ").is_err());
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("SKU-7").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("SKU 7").is_err());
        assert!(validate_sku(&"X".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_stock_thresholds() {
        assert!(validate_stock_thresholds(10, 100).is_ok());
        assert!(validate_stock_thresholds(10, 10).is_ok());
        assert!(validate_stock_thresholds(-1, 10).is_err());
        assert!(validate_stock_thresholds(50, 10).is_err());
    }

    #[test]
    fn test_validate_percent() {
        assert!(validate_percent("progress", 0).is_ok());
        assert!(validate_percent("progress", 100).is_ok());
        assert!(validate_percent("progress", 101).is_err());
        assert!(validate_percent("progress", -1).is_err());
    }

    #[test]
    fn test_inclusive_days() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        assert_eq!(inclusive_days(d(4), d(4)).unwrap(), 1);
        assert_eq!(inclusive_days(d(4), d(8)).unwrap(), 5);
        assert!(inclusive_days(d(8), d(4)).is_err());
    }

    #[test]
    fn test_inclusive_days_across_month_end() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 27).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        // 2024 is a leap year: 27, 28, 29 Feb + 1, 2 Mar
        assert_eq!(inclusive_days(start, end).unwrap(), 5);
    }
}
