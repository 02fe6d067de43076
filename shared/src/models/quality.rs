//! Quality and compliance: inspections, temperature logs, samples,
//! rejections and the compliance checklist

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::lifecycle::StatusMachine;
use crate::validation::require_text;

/// Minimum score for an inspection to pass
pub const PASSING_SCORE: i32 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QcStatus {
    Passed,
    Failed,
    /// Display placeholder; a recorded inspection is always decided
    Pending,
}

string_enum!(QcStatus {
    Passed => "passed",
    Failed => "failed",
    Pending => "pending",
});

/// Percentage of good items, rounded half up. Zero when nothing was inspected.
pub fn inspection_score(items_inspected: i32, defects_found: i32) -> i32 {
    if items_inspected <= 0 {
        return 0;
    }
    let inspected = i64::from(items_inspected);
    let good = (inspected - i64::from(defects_found)).clamp(0, inspected);
    ((200 * good + inspected) / (2 * inspected)) as i32
}

pub fn inspection_status(score: i32) -> QcStatus {
    if score >= PASSING_SCORE {
        QcStatus::Passed
    } else {
        QcStatus::Failed
    }
}

pub fn validate_inspection(items_inspected: i32, defects_found: i32) -> DomainResult<()> {
    if items_inspected < 0 {
        return Err(DomainError::validation(
            "items_inspected",
            "Items inspected cannot be negative",
        ));
    }
    if defects_found < 0 || defects_found > items_inspected {
        return Err(DomainError::validation(
            "defects_found",
            "Defects must be between 0 and the number of items inspected",
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QcInspection {
    pub id: Uuid,
    pub batch_id: String,
    pub product_name: String,
    pub items_inspected: i32,
    pub defects_found: i32,
    /// Always [`inspection_score`] of the counts
    pub score: i32,
    /// Always [`inspection_status`] of the score
    pub status: QcStatus,
    pub inspector: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl QcInspection {
    /// Build an inspection with its derived fields
    pub fn derive(
        id: Uuid,
        batch_id: String,
        product_name: String,
        items_inspected: i32,
        defects_found: i32,
        inspector: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let score = inspection_score(items_inspected, defects_found);
        Self {
            id,
            batch_id,
            product_name,
            items_inspected,
            defects_found,
            score,
            status: inspection_status(score),
            inspector,
            created_at,
        }
    }
}

// ============================================================================
// Temperature logs
// ============================================================================

/// Ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "temperature_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum TemperatureStatus {
    Normal,
    Warning,
    Critical,
}

string_enum!(TemperatureStatus {
    Normal => "normal",
    Warning => "warning",
    Critical => "critical",
});

/// Banding thresholds for storage conditions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureBands {
    pub normal_min: Decimal,
    pub normal_max: Decimal,
    /// Degrees outside the normal range still counted as a warning
    pub warning_margin: Decimal,
    pub humidity_normal_max: Decimal,
    pub humidity_warning_max: Decimal,
}

impl Default for TemperatureBands {
    fn default() -> Self {
        Self {
            normal_min: Decimal::from(15),
            normal_max: Decimal::from(25),
            warning_margin: Decimal::from(5),
            humidity_normal_max: Decimal::from(60),
            humidity_warning_max: Decimal::from(70),
        }
    }
}

impl TemperatureBands {
    pub fn temperature_band(&self, temperature: Decimal) -> TemperatureStatus {
        if temperature >= self.normal_min && temperature <= self.normal_max {
            TemperatureStatus::Normal
        } else if temperature >= self.normal_min - self.warning_margin
            && temperature <= self.normal_max + self.warning_margin
        {
            TemperatureStatus::Warning
        } else {
            TemperatureStatus::Critical
        }
    }

    pub fn humidity_band(&self, humidity: Decimal) -> TemperatureStatus {
        if humidity <= self.humidity_normal_max {
            TemperatureStatus::Normal
        } else if humidity <= self.humidity_warning_max {
            TemperatureStatus::Warning
        } else {
            TemperatureStatus::Critical
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.normal_min > self.normal_max {
            return Err(DomainError::validation(
                "normal_min",
                "Normal range minimum must not exceed its maximum",
            ));
        }
        if self.warning_margin < Decimal::ZERO {
            return Err(DomainError::validation("warning_margin", "Margin cannot be negative"));
        }
        if self.humidity_normal_max > self.humidity_warning_max {
            return Err(DomainError::validation(
                "humidity_normal_max",
                "Humidity normal limit must not exceed the warning limit",
            ));
        }
        Ok(())
    }
}

/// Worse of the temperature and humidity bands
pub fn classify_temperature(
    temperature: Decimal,
    humidity: Decimal,
    bands: &TemperatureBands,
) -> TemperatureStatus {
    bands
        .temperature_band(temperature)
        .max(bands.humidity_band(humidity))
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct TemperatureLog {
    pub id: Uuid,
    pub zone: String,
    pub temperature: Decimal,
    pub humidity: Decimal,
    pub status: TemperatureStatus,
    pub recorded_at: DateTime<Utc>,
}

pub fn validate_humidity(humidity: Decimal) -> DomainResult<()> {
    if humidity < Decimal::ZERO || humidity > Decimal::from(100) {
        return Err(DomainError::validation("humidity", "Humidity must be between 0 and 100"));
    }
    Ok(())
}

// ============================================================================
// Samples
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "sample_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SampleStatus {
    Pending,
    Passed,
    Failed,
}

string_enum!(SampleStatus {
    Pending => "pending",
    Passed => "passed",
    Failed => "failed",
});

impl StatusMachine for SampleStatus {
    const ENTITY: &'static str = "sample";

    fn can_transition_to(self, next: Self) -> bool {
        self == SampleStatus::Pending && next != SampleStatus::Pending
    }

    fn is_terminal(self) -> bool {
        self != SampleStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleResult {
    Pass,
    Fail,
}

string_enum!(SampleResult {
    Pass => "pass",
    Fail => "fail",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct SampleTest {
    pub id: Uuid,
    pub sample_id: String,
    pub batch_id: String,
    pub product_name: String,
    pub test_type: String,
    pub status: SampleStatus,
    pub notes: Option<String>,
    pub tested_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl SampleTest {
    pub fn record_result(&mut self, result: SampleResult, notes: Option<String>, at: DateTime<Utc>) -> DomainResult<()> {
        let next = match result {
            SampleResult::Pass => SampleStatus::Passed,
            SampleResult::Fail => SampleStatus::Failed,
        };
        self.status = self.status.transition_to(next)?;
        self.notes = notes;
        self.tested_at = Some(at);
        Ok(())
    }
}

/// Generate sample identifier: SMP-NNNN
pub fn generate_sample_id(sequence: i64) -> String {
    format!("SMP-{:04}", sequence)
}

// ============================================================================
// Rejections
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "rejection_disposition", rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum RejectionDisposition {
    ReturnToVendor,
    Scrap,
    Rework,
}

string_enum!(RejectionDisposition {
    ReturnToVendor => "return-to-vendor",
    Scrap => "scrap",
    Rework => "rework",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Rejection {
    pub id: Uuid,
    pub batch_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub reason: String,
    pub disposition: RejectionDisposition,
    pub created_at: DateTime<Utc>,
}

pub fn validate_rejection(batch_id: &str, quantity: i32, reason: &str) -> DomainResult<()> {
    require_text("batch_id", batch_id)?;
    require_text("reason", reason)?;
    if quantity <= 0 {
        return Err(DomainError::validation("quantity", "Quantity must be positive"));
    }
    Ok(())
}

// ============================================================================
// Compliance checklist
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ComplianceCheck {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl ComplianceCheck {
    pub fn set_completed(&mut self, completed: bool, at: DateTime<Utc>) {
        self.completed = completed;
        self.completed_at = completed.then_some(at);
    }
}

append_only_by_id!(QcInspection, TemperatureLog, Rejection);
versioned_by_id!(SampleTest, ComplianceCheck);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspection_score_rounding() {
        assert_eq!(inspection_score(100, 5), 95);
        assert_eq!(inspection_score(3, 1), 67);
        // 87.5 rounds up
        assert_eq!(inspection_score(8, 1), 88);
        assert_eq!(inspection_score(0, 0), 0);
        assert_eq!(inspection_score(10, 10), 0);
    }

    #[test]
    fn test_inspection_status_threshold() {
        assert_eq!(inspection_status(80), QcStatus::Passed);
        assert_eq!(inspection_status(79), QcStatus::Failed);
        let inspection = QcInspection::derive(
            Uuid::new_v4(),
            "B-1".to_string(),
            "Olive Oil".to_string(),
            50,
            11,
            None,
            Utc::now(),
        );
        assert_eq!(inspection.score, 78);
        assert_eq!(inspection.status, QcStatus::Failed);
    }

    #[test]
    fn test_validate_inspection() {
        assert!(validate_inspection(10, 2).is_ok());
        assert!(validate_inspection(10, 11).is_err());
        assert!(validate_inspection(-1, 0).is_err());
        assert!(validate_inspection(10, -1).is_err());
    }

    #[test]
    fn test_temperature_banding() {
        let bands = TemperatureBands::default();
        let d = |v: i64| Decimal::from(v);
        assert_eq!(classify_temperature(d(20), d(50), &bands), TemperatureStatus::Normal);
        assert_eq!(classify_temperature(d(28), d(50), &bands), TemperatureStatus::Warning);
        assert_eq!(classify_temperature(d(12), d(50), &bands), TemperatureStatus::Warning);
        assert_eq!(classify_temperature(d(31), d(50), &bands), TemperatureStatus::Critical);
        assert_eq!(classify_temperature(d(20), d(65), &bands), TemperatureStatus::Warning);
        assert_eq!(classify_temperature(d(28), d(75), &bands), TemperatureStatus::Critical);
    }

    #[test]
    fn test_sample_result_is_final() {
        let mut sample = SampleTest {
            id: Uuid::new_v4(),
            sample_id: generate_sample_id(3),
            batch_id: "B-1".to_string(),
            product_name: "Flour".to_string(),
            test_type: "moisture".to_string(),
            status: SampleStatus::Pending,
            notes: None,
            tested_at: None,
            version: 1,
            created_at: Utc::now(),
        };
        sample.record_result(SampleResult::Pass, None, Utc::now()).unwrap();
        assert_eq!(sample.status, SampleStatus::Passed);
        assert!(sample.tested_at.is_some());
        assert!(sample.record_result(SampleResult::Fail, None, Utc::now()).is_err());
    }

    #[test]
    fn test_compliance_toggle_sets_timestamp() {
        let mut check = ComplianceCheck {
            id: Uuid::new_v4(),
            title: "Fire exits clear".to_string(),
            category: "safety".to_string(),
            completed: false,
            completed_at: None,
            version: 1,
            updated_at: Utc::now(),
        };
        check.set_completed(true, Utc::now());
        assert!(check.completed_at.is_some());
        check.set_completed(false, Utc::now());
        assert!(check.completed_at.is_none());
    }
}
