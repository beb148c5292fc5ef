//! Attendance and account endpoints consumed by the dashboard

use chrono::NaiveDate;

use openapi_client::models::{
    AttendanceRecord, DailyStatsResponse, DailyStatsRow, EmployeeRecord, LoginRequest,
    LoginResponse,
};

use crate::errors::DashboardError;
use crate::http::client::HttpClient;

/// Upper bound on attendance rows fetched for one day
pub const DAILY_ATTENDANCE_LIMIT: u32 = 500;

impl HttpClient {
    /// Exchange credentials for a session
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, DashboardError> {
        self.post_public("/api/v1/users/login", request).await
    }

    /// List all employees
    pub async fn get_employees(&self) -> Result<Vec<EmployeeRecord>, DashboardError> {
        let body: Option<Vec<EmployeeRecord>> = self.get("/employees").await?;
        Ok(body.unwrap_or_default())
    }

    /// Attendance rows recorded on `date`
    pub async fn get_daily_attendance(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, DashboardError> {
        let query = [
            ("date", date.format("%Y-%m-%d").to_string()),
            ("skip", "0".to_string()),
            ("limit", DAILY_ATTENDANCE_LIMIT.to_string()),
        ];
        let body: Option<Vec<AttendanceRecord>> = self
            .get_query("/api/v1/attendance/daily", &query)
            .await?;
        Ok(body.unwrap_or_default())
    }

    /// Per-day on-time/late/absent aggregates for the chart
    pub async fn get_dashboard_stats(&self) -> Result<Vec<DailyStatsRow>, DashboardError> {
        let body: Option<DailyStatsResponse> = self.get("/api/v1/attendance/stats").await?;
        Ok(body.map(DailyStatsResponse::into_rows).unwrap_or_default())
    }
}
