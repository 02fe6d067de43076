//! Workforce scheduling: staff, shift schedules, attendance, leave and
//! trainings

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DomainError, DomainResult};
use crate::lifecycle::StatusMachine;
use crate::validation::{inclusive_days, require_text, validate_percent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "shift_kind", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Shift {
    Morning,
    Afternoon,
    Night,
}

string_enum!(Shift {
    Morning => "morning",
    Afternoon => "afternoon",
    Night => "night",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "staff_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum StaffStatus {
    Active,
    Break,
    Offline,
}

string_enum!(StaffStatus {
    Active => "active",
    Break => "break",
    Offline => "offline",
});

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub shift: Shift,
    pub status: StaffStatus,
    /// Percent of target throughput
    pub productivity: i32,
    pub hourly_rate: Decimal,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

pub fn validate_staff(name: &str, role: &str, productivity: i32, hourly_rate: Decimal) -> DomainResult<()> {
    require_text("name", name)?;
    require_text("role", role)?;
    validate_percent("productivity", productivity)?;
    if hourly_rate < Decimal::ZERO {
        return Err(DomainError::validation("hourly_rate", "Hourly rate cannot be negative"));
    }
    Ok(())
}

// ============================================================================
// Shift schedules
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Understaffed,
    Full,
    Overstaffed,
}

string_enum!(ShiftStatus {
    Understaffed => "understaffed",
    Full => "full",
    Overstaffed => "overstaffed",
});

/// Staffing level of a shift, a pure function of assigned vs required
pub fn derive_shift_status(assigned: usize, required: i32) -> ShiftStatus {
    let required = usize::try_from(required).unwrap_or(0);
    match assigned.cmp(&required) {
        std::cmp::Ordering::Less => ShiftStatus::Understaffed,
        std::cmp::Ordering::Equal => ShiftStatus::Full,
        std::cmp::Ordering::Greater => ShiftStatus::Overstaffed,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSchedule {
    pub id: Uuid,
    pub date: NaiveDate,
    pub shift: Shift,
    pub staff_assigned: Vec<Uuid>,
    pub required_staff: i32,
    /// Always [`derive_shift_status`] of the assignment
    pub status: ShiftStatus,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl ShiftSchedule {
    /// Replace the assignment set; duplicates are dropped
    pub fn assign_staff(&mut self, staff_ids: &[Uuid]) {
        let mut assigned: Vec<Uuid> = Vec::with_capacity(staff_ids.len());
        for id in staff_ids {
            if !assigned.contains(id) {
                assigned.push(*id);
            }
        }
        self.staff_assigned = assigned;
        self.status = derive_shift_status(self.staff_assigned.len(), self.required_staff);
    }
}

pub fn validate_required_staff(required_staff: i32) -> DomainResult<()> {
    if required_staff <= 0 {
        return Err(DomainError::validation(
            "required_staff",
            "Required staff must be positive",
        ));
    }
    Ok(())
}

// ============================================================================
// Attendance
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "attendance_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
}

string_enum!(AttendanceStatus {
    Present => "present",
    Late => "late",
    Absent => "absent",
});

/// Hours between clock-in and clock-out to two decimals. A clock-out
/// earlier than the clock-in crosses midnight.
pub fn hours_worked(clock_in: Option<NaiveTime>, clock_out: Option<NaiveTime>) -> Decimal {
    let (Some(clock_in), Some(clock_out)) = (clock_in, clock_out) else {
        return Decimal::ZERO;
    };
    let mut minutes = (clock_out - clock_in).num_minutes();
    if minutes < 0 {
        minutes += 24 * 60;
    }
    (Decimal::from(minutes) / Decimal::from(60)).round_dp(2)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub date: NaiveDate,
    pub clock_in: Option<NaiveTime>,
    pub clock_out: Option<NaiveTime>,
    pub status: AttendanceStatus,
    /// Always [`hours_worked`] of the clock times
    pub hours_worked: Decimal,
}

pub fn validate_attendance(
    status: AttendanceStatus,
    clock_in: Option<NaiveTime>,
    clock_out: Option<NaiveTime>,
) -> DomainResult<()> {
    match (status, clock_in) {
        (AttendanceStatus::Absent, Some(_)) => Err(DomainError::validation(
            "clock_in",
            "Absent staff cannot have a clock-in time",
        )),
        (AttendanceStatus::Present | AttendanceStatus::Late, None) => {
            Err(DomainError::validation("clock_in", "clock_in is required"))
        }
        _ if clock_in.is_none() && clock_out.is_some() => Err(DomainError::validation(
            "clock_out",
            "Clock-out requires a clock-in",
        )),
        _ => Ok(()),
    }
}

// ============================================================================
// Leave
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "leave_type", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Annual,
    Sick,
    Personal,
    Unpaid,
}

string_enum!(LeaveType {
    Annual => "annual",
    Sick => "sick",
    Personal => "personal",
    Unpaid => "unpaid",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type), sqlx(type_name = "leave_status", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

string_enum!(LeaveStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

impl StatusMachine for LeaveStatus {
    const ENTITY: &'static str = "leave request";

    fn can_transition_to(self, next: Self) -> bool {
        self == LeaveStatus::Pending && next != LeaveStatus::Pending
    }

    fn is_terminal(self) -> bool {
        self != LeaveStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveDecision {
    Approved,
    Rejected,
}

impl From<LeaveDecision> for LeaveStatus {
    fn from(decision: LeaveDecision) -> Self {
        match decision {
            LeaveDecision::Approved => LeaveStatus::Approved,
            LeaveDecision::Rejected => LeaveStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub leave_type: LeaveType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Inclusive day span, computed on creation
    pub days: i32,
    pub reason: Option<String>,
    pub status: LeaveStatus,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    pub fn decide(&mut self, decision: LeaveDecision) -> DomainResult<()> {
        self.status = self.status.transition_to(decision.into())?;
        Ok(())
    }
}

/// Day count for a new leave request
pub fn leave_days(start_date: NaiveDate, end_date: NaiveDate) -> DomainResult<i32> {
    inclusive_days(start_date, end_date)
}

// ============================================================================
// Trainings
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Training {
    pub id: Uuid,
    pub staff_id: Uuid,
    pub course: String,
    pub completed_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Training {
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires_on.map(|d| d < today).unwrap_or(false)
    }
}

pub fn validate_training(
    course: &str,
    completed_on: Option<NaiveDate>,
    expires_on: Option<NaiveDate>,
) -> DomainResult<()> {
    require_text("course", course)?;
    if let (Some(done), Some(expires)) = (completed_on, expires_on) {
        if expires < done {
            return Err(DomainError::validation(
                "expires_on",
                "Expiry must not be before completion",
            ));
        }
    }
    Ok(())
}

versioned_by_id!(Staff, ShiftSchedule, LeaveRequest);
append_only_by_id!(Attendance, Training);

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_shift_status_derivation() {
        assert_eq!(derive_shift_status(2, 3), ShiftStatus::Understaffed);
        assert_eq!(derive_shift_status(3, 3), ShiftStatus::Full);
        assert_eq!(derive_shift_status(4, 3), ShiftStatus::Overstaffed);
    }

    #[test]
    fn test_assign_staff_replaces_and_dedupes() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut schedule = ShiftSchedule {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            shift: Shift::Morning,
            staff_assigned: vec![Uuid::new_v4()],
            required_staff: 2,
            status: ShiftStatus::Understaffed,
            version: 1,
            updated_at: Utc::now(),
        };
        schedule.assign_staff(&[a, b, a]);
        assert_eq!(schedule.staff_assigned, vec![a, b]);
        assert_eq!(schedule.status, ShiftStatus::Full);
    }

    #[test]
    fn test_hours_worked() {
        assert_eq!(hours_worked(Some(t(8, 0)), Some(t(16, 30))), Decimal::new(850, 2));
        assert_eq!(hours_worked(Some(t(22, 0)), Some(t(6, 0))), Decimal::from(8));
        assert_eq!(hours_worked(Some(t(8, 0)), None), Decimal::ZERO);
        assert_eq!(hours_worked(None, None), Decimal::ZERO);
        assert_eq!(hours_worked(Some(t(9, 0)), Some(t(9, 20))), Decimal::new(33, 2));
    }

    #[test]
    fn test_validate_attendance() {
        assert!(validate_attendance(AttendanceStatus::Present, Some(t(8, 0)), None).is_ok());
        assert!(validate_attendance(AttendanceStatus::Absent, None, None).is_ok());
        assert!(validate_attendance(AttendanceStatus::Absent, Some(t(8, 0)), None).is_err());
        assert!(validate_attendance(AttendanceStatus::Late, None, None).is_err());
    }

    #[test]
    fn test_leave_decision_is_terminal() {
        let mut leave = LeaveRequest {
            id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            leave_type: LeaveType::Annual,
            start_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 7, 5).unwrap(),
            days: 5,
            reason: None,
            status: LeaveStatus::Pending,
            version: 1,
            created_at: Utc::now(),
        };
        leave.decide(LeaveDecision::Approved).unwrap();
        assert_eq!(leave.status, LeaveStatus::Approved);
        assert!(matches!(
            leave.decide(LeaveDecision::Rejected),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_leave_days() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 7, day).unwrap();
        assert_eq!(leave_days(d(1), d(1)).unwrap(), 1);
        assert_eq!(leave_days(d(1), d(5)).unwrap(), 5);
        assert!(leave_days(d(5), d(1)).is_err());
    }

    #[test]
    fn test_training_expiry() {
        let training = Training {
            id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            course: "Forklift".to_string(),
            completed_on: NaiveDate::from_ymd_opt(2023, 1, 1),
            expires_on: NaiveDate::from_ymd_opt(2024, 1, 1),
            created_at: Utc::now(),
        };
        assert!(training.is_expired(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()));
        assert!(validate_training("Forklift", training.expires_on, training.completed_on).is_err());
    }
}

#[cfg(test)]
mod derivation_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Staffing status compares assigned against required and nothing else
        #[test]
        fn prop_shift_status_is_pure(assigned in 0usize..30, required in 0i32..30) {
            let status = derive_shift_status(assigned, required);
            prop_assert_eq!(status, derive_shift_status(assigned, required));

            let required = required as usize;
            let expected = if assigned < required {
                ShiftStatus::Understaffed
            } else if assigned == required {
                ShiftStatus::Full
            } else {
                ShiftStatus::Overstaffed
            };
            prop_assert_eq!(status, expected);
        }
    }
}
