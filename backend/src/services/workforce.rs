//! Workforce service: staff roster, shift schedules, attendance, leave and
//! training records

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use shared::{
    check_version, derive_shift_status, hours_worked, leave_days, validate_attendance,
    validate_required_staff, validate_staff, validate_training, Attendance, AttendanceStatus,
    CreateLeaveRequest, CreateScheduleRequest, CreateStaffRequest, CreateTrainingRequest,
    LeaveDecision, LeaveRequest, LeaveStatus, LogAttendanceRequest, Shift, ShiftSchedule, Staff,
    StaffStatus, StatusMachine, Training,
};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{map_unique_violation, AppError, AppResult};

#[derive(Clone)]
pub struct WorkforceService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct ScheduleRow {
    id: Uuid,
    date: NaiveDate,
    shift: Shift,
    staff_assigned: Vec<Uuid>,
    required_staff: i32,
    version: i64,
    updated_at: DateTime<Utc>,
}

impl From<ScheduleRow> for ShiftSchedule {
    fn from(row: ScheduleRow) -> Self {
        ShiftSchedule {
            status: derive_shift_status(row.staff_assigned.len(), row.required_staff),
            id: row.id,
            date: row.date,
            shift: row.shift,
            staff_assigned: row.staff_assigned,
            required_staff: row.required_staff,
            version: row.version,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct AttendanceRow {
    id: Uuid,
    staff_id: Uuid,
    date: NaiveDate,
    clock_in: Option<NaiveTime>,
    clock_out: Option<NaiveTime>,
    status: AttendanceStatus,
}

impl From<AttendanceRow> for Attendance {
    fn from(row: AttendanceRow) -> Self {
        Attendance {
            hours_worked: hours_worked(row.clock_in, row.clock_out),
            id: row.id,
            staff_id: row.staff_id,
            date: row.date,
            clock_in: row.clock_in,
            clock_out: row.clock_out,
            status: row.status,
        }
    }
}

const STAFF_COLUMNS: &str = "id, name, role, shift, status, productivity, hourly_rate, version, created_at";

const SCHEDULE_COLUMNS: &str = "id, date, shift, staff_assigned, required_staff, version, updated_at";

const ATTENDANCE_COLUMNS: &str = "id, staff_id, date, clock_in, clock_out, status";

const LEAVE_COLUMNS: &str =
    "id, staff_id, leave_type, start_date, end_date, days, reason, status, version, created_at";

const TRAINING_COLUMNS: &str = "id, staff_id, course, completed_on, expires_on, created_at";

impl WorkforceService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Staff
    // ========================================================================

    pub async fn list_staff(&self) -> AppResult<Vec<Staff>> {
        let staff = sqlx::query_as::<_, Staff>(&format!(
            "SELECT {} FROM staff ORDER BY name",
            STAFF_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(staff)
    }

    pub async fn add_staff(&self, input: CreateStaffRequest) -> AppResult<Staff> {
        validate_staff(&input.name, &input.role, input.productivity, input.hourly_rate)?;

        let staff = sqlx::query_as::<_, Staff>(&format!(
            r#"
            INSERT INTO staff (name, role, shift, productivity, hourly_rate)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            STAFF_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(input.role.trim())
        .bind(input.shift)
        .bind(input.productivity)
        .bind(input.hourly_rate)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(staff_id = %staff.id, name = %staff.name, shift = %staff.shift, "Staff member added");
        Ok(staff)
    }

    pub async fn update_staff_status(
        &self,
        id: Uuid,
        status: StaffStatus,
        expected_version: Option<i64>,
    ) -> AppResult<Staff> {
        let mut tx = self.db.begin().await?;

        let current = sqlx::query_as::<_, Staff>(&format!(
            "SELECT {} FROM staff WHERE id = $1 FOR UPDATE",
            STAFF_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Staff".to_string()))?;

        check_version("staff", expected_version, current.version)?;

        let staff = sqlx::query_as::<_, Staff>(&format!(
            r#"
            UPDATE staff
            SET status = $2, version = version + 1
            WHERE id = $1
            RETURNING {}
            "#,
            STAFF_COLUMNS
        ))
        .bind(id)
        .bind(status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(staff_id = %id, from = %current.status, to = %staff.status, "Staff status updated");
        Ok(staff)
    }

    // ========================================================================
    // Schedules
    // ========================================================================

    pub async fn list_schedules(&self) -> AppResult<Vec<ShiftSchedule>> {
        let rows = sqlx::query_as::<_, ScheduleRow>(&format!(
            "SELECT {} FROM shift_schedules ORDER BY date DESC, shift",
            SCHEDULE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(ShiftSchedule::from).collect())
    }

    pub async fn create_schedule(&self, input: CreateScheduleRequest) -> AppResult<ShiftSchedule> {
        validate_required_staff(input.required_staff)?;

        let row = sqlx::query_as::<_, ScheduleRow>(&format!(
            r#"
            INSERT INTO shift_schedules (date, shift, required_staff)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            SCHEDULE_COLUMNS
        ))
        .bind(input.date)
        .bind(input.shift)
        .bind(input.required_staff)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "shift"))?;

        tracing::info!(date = %row.date, shift = %row.shift, required = row.required_staff, "Shift scheduled");
        Ok(row.into())
    }

    /// Replace the staff assigned to a shift; every id must be on the roster
    pub async fn assign_staff(
        &self,
        id: Uuid,
        staff_ids: &[Uuid],
        expected_version: Option<i64>,
    ) -> AppResult<ShiftSchedule> {
        let mut tx = self.db.begin().await?;

        let mut schedule: ShiftSchedule = sqlx::query_as::<_, ScheduleRow>(&format!(
            "SELECT {} FROM shift_schedules WHERE id = $1 FOR UPDATE",
            SCHEDULE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Shift schedule".to_string()))?
        .into();

        check_version("shift schedule", expected_version, schedule.version)?;
        schedule.assign_staff(staff_ids);

        let known = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM staff WHERE id = ANY($1)")
            .bind(&schedule.staff_assigned)
            .fetch_one(&mut *tx)
            .await?;
        if known != schedule.staff_assigned.len() as i64 {
            return Err(AppError::NotFound("Staff".to_string()));
        }

        let schedule: ShiftSchedule = sqlx::query_as::<_, ScheduleRow>(&format!(
            r#"
            UPDATE shift_schedules
            SET staff_assigned = $2, version = version + 1, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SCHEDULE_COLUMNS
        ))
        .bind(id)
        .bind(&schedule.staff_assigned)
        .fetch_one(&mut *tx)
        .await?
        .into();

        tx.commit().await?;

        tracing::info!(
            date = %schedule.date,
            shift = %schedule.shift,
            assigned = schedule.staff_assigned.len(),
            status = %schedule.status,
            "Shift staffing updated"
        );
        Ok(schedule)
    }

    // ========================================================================
    // Attendance
    // ========================================================================

    pub async fn list_attendance(&self) -> AppResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, AttendanceRow>(&format!(
            "SELECT {} FROM attendance ORDER BY date DESC",
            ATTENDANCE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Attendance::from).collect())
    }

    pub async fn log_attendance(&self, input: LogAttendanceRequest) -> AppResult<Attendance> {
        validate_attendance(input.status, input.clock_in, input.clock_out)?;

        let mut tx = self.db.begin().await?;
        ensure_staff(&mut *tx, input.staff_id).await?;

        let row = sqlx::query_as::<_, AttendanceRow>(&format!(
            r#"
            INSERT INTO attendance (staff_id, date, clock_in, clock_out, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ATTENDANCE_COLUMNS
        ))
        .bind(input.staff_id)
        .bind(input.date)
        .bind(input.clock_in)
        .bind(input.clock_out)
        .bind(input.status)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "date"))?;

        tx.commit().await?;

        let attendance = Attendance::from(row);
        tracing::info!(
            staff_id = %attendance.staff_id,
            date = %attendance.date,
            status = %attendance.status,
            hours = %attendance.hours_worked,
            "Attendance logged"
        );
        Ok(attendance)
    }

    // ========================================================================
    // Leave
    // ========================================================================

    pub async fn list_leave_requests(&self) -> AppResult<Vec<LeaveRequest>> {
        let requests = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {} FROM leave_requests ORDER BY start_date DESC",
            LEAVE_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(requests)
    }

    /// File a leave request; the day count is computed here, never taken from the caller
    pub async fn create_leave_request(&self, input: CreateLeaveRequest) -> AppResult<LeaveRequest> {
        let days = leave_days(input.start_date, input.end_date)?;
        let reason = input.reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty());

        let mut tx = self.db.begin().await?;
        ensure_staff(&mut *tx, input.staff_id).await?;

        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            INSERT INTO leave_requests (staff_id, leave_type, start_date, end_date, days, reason)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            LEAVE_COLUMNS
        ))
        .bind(input.staff_id)
        .bind(input.leave_type)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(days)
        .bind(&reason)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(staff_id = %request.staff_id, days = request.days, kind = %request.leave_type, "Leave requested");
        Ok(request)
    }

    pub async fn decide_leave(
        &self,
        id: Uuid,
        decision: LeaveDecision,
        expected_version: Option<i64>,
    ) -> AppResult<LeaveRequest> {
        let mut tx = self.db.begin().await?;

        let mut request = sqlx::query_as::<_, LeaveRequest>(&format!(
            "SELECT {} FROM leave_requests WHERE id = $1 FOR UPDATE",
            LEAVE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave request".to_string()))?;

        check_version(LeaveStatus::ENTITY, expected_version, request.version)?;
        request.decide(decision).map_err(|e| {
            tracing::warn!(leave_id = %id, status = %request.status, "Leave decision rejected");
            e
        })?;

        let request = sqlx::query_as::<_, LeaveRequest>(&format!(
            r#"
            UPDATE leave_requests
            SET status = $2, version = version + 1
            WHERE id = $1
            RETURNING {}
            "#,
            LEAVE_COLUMNS
        ))
        .bind(id)
        .bind(request.status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(leave_id = %id, status = %request.status, "Leave decided");
        Ok(request)
    }

    // ========================================================================
    // Trainings
    // ========================================================================

    pub async fn list_trainings(&self) -> AppResult<Vec<Training>> {
        let trainings = sqlx::query_as::<_, Training>(&format!(
            "SELECT {} FROM trainings ORDER BY created_at DESC",
            TRAINING_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(trainings)
    }

    pub async fn record_training(&self, input: CreateTrainingRequest) -> AppResult<Training> {
        validate_training(&input.course, input.completed_on, input.expires_on)?;

        let mut tx = self.db.begin().await?;
        ensure_staff(&mut *tx, input.staff_id).await?;

        let training = sqlx::query_as::<_, Training>(&format!(
            r#"
            INSERT INTO trainings (staff_id, course, completed_on, expires_on)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            TRAINING_COLUMNS
        ))
        .bind(input.staff_id)
        .bind(input.course.trim())
        .bind(input.completed_on)
        .bind(input.expires_on)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(staff_id = %training.staff_id, course = %training.course, "Training recorded");
        Ok(training)
    }
}

async fn ensure_staff(conn: &mut PgConnection, staff_id: Uuid) -> AppResult<()> {
    let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM staff WHERE id = $1)")
        .bind(staff_id)
        .fetch_one(conn)
        .await?;
    if !exists {
        return Err(AppError::NotFound("Staff".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::ShiftStatus;

    #[test]
    fn test_schedule_row_derives_status() {
        let schedule: ShiftSchedule = ScheduleRow {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            shift: Shift::Night,
            staff_assigned: vec![Uuid::new_v4()],
            required_staff: 3,
            version: 1,
            updated_at: Utc::now(),
        }
        .into();
        assert_eq!(schedule.status, ShiftStatus::Understaffed);
    }

    #[test]
    fn test_attendance_row_derives_hours() {
        let attendance: Attendance = AttendanceRow {
            id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
            clock_in: NaiveTime::from_hms_opt(22, 0, 0),
            clock_out: NaiveTime::from_hms_opt(6, 30, 0),
            status: AttendanceStatus::Present,
        }
        .into();
        assert_eq!(attendance.hours_worked, Decimal::new(850, 2));
    }
}
