//! Request and response bodies for the HTTP API.
//!
//! Request fields are snake_case; the camelCase names used by older web
//! clients are accepted as aliases.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Envelope around every JSON response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
    pub employees: u32,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ========== Auth ==========

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyAccountRequest {
    pub otp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetOtpRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    #[serde(alias = "newPassword")]
    pub new_password: String,
}

// ========== Employees & departments ==========

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEmployeeRequest {
    #[serde(alias = "employeeId")]
    pub employee_id: String,
    pub name: String,
    pub department: String,
    pub position: String,
    #[serde(default, alias = "projectCode")]
    pub project_code: Option<String>,
    #[serde(default, alias = "coordinatorName")]
    pub coordinator_name: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepartmentRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

// ========== Ledger ==========

#[derive(Debug, Clone, Deserialize)]
pub struct RecordPerformanceRequest {
    #[serde(alias = "employeeId")]
    pub employee_id: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(alias = "dailyPoints")]
    pub daily_points: f64,
    #[serde(default, alias = "salesAmount")]
    pub sales_amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePerformanceRequest {
    #[serde(alias = "dailyPoints")]
    pub daily_points: f64,
    #[serde(default, alias = "salesAmount")]
    pub sales_amount: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitPointsRequest {
    #[serde(alias = "employeeId")]
    pub employee_id: String,
    pub points: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}
