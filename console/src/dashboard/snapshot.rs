//! Dashboard view model

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use openapi_client::models::{AttendanceRecord, DailyStatsRow, EmployeeRecord};

use crate::device::client::value_to_id;
use crate::door::DoorSnapshot;

/// Today's attendance counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttendanceStats {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
}

/// One bar group of the weekly chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPoint {
    pub name: String,
    pub present: u32,
    pub late: u32,
    pub absent: u32,
}

impl From<&DailyStatsRow> for ChartPoint {
    fn from(row: &DailyStatsRow) -> Self {
        Self {
            name: row.date.clone(),
            present: row.on_time,
            late: row.late,
            absent: row.absent,
        }
    }
}

/// One attendance row resolved for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRow {
    pub employee_id: String,
    pub full_name: String,
    pub date: String,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub late: bool,
}

/// Last error seen per data source; `None` once the source succeeds again
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceErrors {
    pub employees: Option<String>,
    pub attendance: Option<String>,
    pub chart: Option<String>,
}

impl SourceErrors {
    pub fn messages(&self) -> Vec<String> {
        [
            ("employees", &self.employees),
            ("attendance", &self.attendance),
            ("chart", &self.chart),
        ]
        .into_iter()
        .filter_map(|(source, err)| err.as_ref().map(|e| format!("{}: {}", source, e)))
        .collect()
    }
}

/// Everything the dashboard view renders
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub employees: Vec<EmployeeRecord>,
    pub attendance: Vec<AttendanceRow>,
    pub stats: AttendanceStats,
    pub chart: Vec<ChartPoint>,
    pub door: Option<DoorSnapshot>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub errors: SourceErrors,
    /// Number of completed refresh ticks
    pub ticks: u64,
}

impl DashboardSnapshot {
    pub fn employee_count(&self) -> usize {
        self.employees.len()
    }
}

/// Resolve names and check-in times, and flag late arrivals
pub fn attendance_rows(
    records: &[AttendanceRecord],
    employees: &[EmployeeRecord],
    today: NaiveDate,
    late_after: NaiveTime,
) -> Vec<AttendanceRow> {
    let names: HashMap<String, &str> = employees
        .iter()
        .filter_map(|e| Some((value_to_id(&e.id)?, e.full_name.as_deref()?)))
        .collect();

    records
        .iter()
        .map(|record| {
            let employee_id = value_to_id(&record.employee_id).unwrap_or_default();
            let full_name = record
                .full_name
                .clone()
                .or_else(|| names.get(&employee_id).map(|n| n.to_string()))
                .unwrap_or_else(|| format!("Employee #{}", employee_id));
            let check_in = record
                .check_in
                .clone()
                .or_else(|| record.created_at.as_deref().and_then(time_of_timestamp));
            let late = check_in
                .as_deref()
                .and_then(parse_time)
                .map(|t| t > late_after)
                .unwrap_or(false);

            AttendanceRow {
                employee_id,
                full_name,
                date: record
                    .work_date
                    .clone()
                    .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
                check_in,
                check_out: record.check_out.clone(),
                late,
            }
        })
        .collect()
}

/// Counters over today's rows. Absent is floored at zero.
pub fn attendance_stats(employee_count: usize, rows: &[AttendanceRow]) -> AttendanceStats {
    let present = rows.len();
    AttendanceStats {
        total: employee_count,
        present,
        absent: employee_count.saturating_sub(present),
        late: rows.iter().filter(|r| r.late).count(),
    }
}

/// `2024-05-01T08:55:00.123` -> `08:55:00`
fn time_of_timestamp(timestamp: &str) -> Option<String> {
    let (_, time) = timestamp.split_once('T')?;
    let time = time.split(['.', 'Z', '+']).next()?;
    (!time.is_empty()).then(|| time.to_string())
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}
