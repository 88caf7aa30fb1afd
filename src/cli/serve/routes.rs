//! Request routing and handlers.
//!
//! Every handler resolves the caller from the bearer token, asks
//! [`authorize`] for permission, then calls into the database layer.

use chrono::{Datelike, Local, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use super::server::{ApiServer, HttpRequest, HttpResponse};
use super::types::{
    CreateEmployeeRequest, DepartmentRequest, HealthResponse, LoginRequest, MessageResponse,
    RecordPerformanceRequest, ResetOtpRequest, ResetPasswordRequest, SubmitPointsRequest,
    UpdatePerformanceRequest, VerifyAccountRequest,
};
use crate::access::{authorize, Action, Caller};
use crate::auth::{self, password, Registration};
use crate::db::{Database, LedgerQuery};
use crate::error::{TrackerError, TrackerResult};
use crate::models::{Account, Department, Employee, EmployeeChanges};
use crate::scoring::{monthly_report_csv, Period, ReportFilter};

impl ApiServer {
    /// Route a request and render the result, or the error, as a response.
    pub fn dispatch(&self, db: &Database, req: &HttpRequest) -> HttpResponse {
        match self.route(db, req) {
            Ok(resp) => resp,
            Err(e) => HttpResponse::error(&e),
        }
    }

    fn route(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        let segs: Vec<&str> = req.segments.iter().map(String::as_str).collect();

        match (req.method.as_str(), segs.as_slice()) {
            ("GET", ["api", "health"]) => self.handle_health(db),

            // Auth
            ("POST", ["api", "auth", "register"]) => self.handle_register(db, req),
            ("POST", ["api", "auth", "login"]) => self.handle_login(db, req),
            ("POST", ["api", "auth", "logout"]) => self.handle_logout(db, req),
            ("GET", ["api", "auth", "me"]) => {
                let (_, account) = self.caller(db, req)?;
                Ok(HttpResponse::json(200, account))
            }
            ("POST", ["api", "auth", "send-verify-otp"]) => self.handle_send_verify_otp(db, req),
            ("POST", ["api", "auth", "verify-account"]) => self.handle_verify_account(db, req),
            ("POST", ["api", "auth", "send-reset-otp"]) => self.handle_send_reset_otp(db, req),
            ("POST", ["api", "auth", "reset-password"]) => self.handle_reset_password(db, req),

            // Employees
            ("GET", ["api", "employees"]) => {
                self.guard(db, req, Action::ReadAll, None)?;
                Ok(HttpResponse::json(200, db.list_employees()?))
            }
            ("POST", ["api", "employees"]) => self.handle_create_employee(db, req),
            ("GET", ["api", "employees", "department", dept]) => {
                self.guard(db, req, Action::ReadAll, None)?;
                Ok(HttpResponse::json(200, db.list_employees_by_department(dept)?))
            }
            ("GET", ["api", "employees", id]) => {
                self.guard(db, req, Action::Read, Some(*id))?;
                Ok(HttpResponse::json(200, db.require_employee(id)?))
            }
            ("PUT", ["api", "employees", id]) => self.handle_update_employee(db, req, id),
            ("DELETE", ["api", "employees", id]) => {
                self.guard(db, req, Action::Delete, Some(*id))?;
                db.delete_employee(id)?;
                Ok(HttpResponse::json(200, MessageResponse::new("Employee deleted")))
            }

            // Departments
            ("GET", ["api", "departments"]) => {
                self.caller(db, req)?;
                Ok(HttpResponse::json(200, db.list_departments()?))
            }
            ("POST", ["api", "departments"]) => self.handle_create_department(db, req),
            ("PUT", ["api", "departments", id]) => {
                self.guard(db, req, Action::Administer, None)?;
                let body: DepartmentRequest = parse_body(req)?;
                let dept = db.update_department(
                    parse_id(id)?,
                    body.name.as_deref(),
                    body.description.as_deref(),
                )?;
                Ok(HttpResponse::json(200, dept))
            }
            ("DELETE", ["api", "departments", id]) => {
                self.guard(db, req, Action::Administer, None)?;
                db.delete_department(parse_id(id)?)?;
                Ok(HttpResponse::json(200, MessageResponse::new("Department deleted")))
            }

            // Ledger
            ("GET", ["api", "performance"]) => {
                self.guard(db, req, Action::ReadAll, None)?;
                let query = LedgerQuery {
                    employee_id: param(req, &["employeeId", "employee_id"]).map(str::to_string),
                    start_date: date_param(req, &["startDate", "start_date"])?,
                    end_date: date_param(req, &["endDate", "end_date"])?,
                    kind: None,
                };
                Ok(HttpResponse::json(200, db.list_performance(&query)?))
            }
            ("POST", ["api", "performance"]) => self.handle_record_performance(db, req),
            ("POST", ["api", "performance", "daily-points"]) => self.handle_daily_points(db, req),
            ("PUT", ["api", "performance", id]) => {
                self.guard(db, req, Action::Amend, None)?;
                let body: UpdatePerformanceRequest = parse_body(req)?;
                let record = db.update_performance(parse_id(id)?, body.daily_points, body.sales_amount)?;
                Ok(HttpResponse::json(200, record))
            }
            ("DELETE", ["api", "performance", id]) => {
                self.guard(db, req, Action::Delete, None)?;
                db.delete_performance(parse_id(id)?)?;
                Ok(HttpResponse::json(200, MessageResponse::new("Performance record deleted")))
            }
            ("GET", ["api", "performance", "employee", id, "monthly"]) => {
                self.guard(db, req, Action::Read, Some(*id))?;
                let (year, month) = year_month(req)?;
                Ok(HttpResponse::json(200, db.monthly_progress(id, year, month)?))
            }
            ("GET", ["api", "performance", "employee", id, "history"]) => {
                self.guard(db, req, Action::Read, Some(*id))?;
                let history = db.employee_history(
                    id,
                    date_param(req, &["startDate", "start_date"])?,
                    date_param(req, &["endDate", "end_date"])?,
                )?;
                Ok(HttpResponse::json(200, history))
            }
            ("GET", ["api", "performance", "department", dept, "summary"]) => {
                self.guard(db, req, Action::ReadAll, None)?;
                let (year, month) = year_month(req)?;
                Ok(HttpResponse::json(200, db.department_summary(dept, year, month)?))
            }
            ("GET", ["api", "performance", "department", dept, "leaderboard"]) => {
                self.guard(db, req, Action::ReadAll, None)?;
                let period = Period::parse(req.param("period").unwrap_or(""))?;
                Ok(HttpResponse::json(200, db.leaderboard(dept, period, today())?))
            }
            ("POST", ["api", "points", "submit"]) => self.handle_submit_points(db, req),

            // Reports
            ("GET", ["api", "reports"]) => {
                self.guard(db, req, Action::ReadAll, None)?;
                let filter = ReportFilter {
                    start_date: date_param(req, &["startDate", "start_date"])?,
                    end_date: date_param(req, &["endDate", "end_date"])?,
                    department: param(req, &["department"]).map(str::to_string),
                    employee_id: param(req, &["employee", "employeeId", "employee_id"])
                        .map(str::to_string),
                };
                Ok(HttpResponse::json(200, db.filtered_report(&filter)?))
            }
            ("GET", ["api", "reports", "monthly"]) => {
                self.guard(db, req, Action::ReadAll, None)?;
                let (year, month) = year_month(req)?;
                let report = db.monthly_report(year, month)?;
                if req.param("format") == Some("csv") {
                    Ok(HttpResponse::csv(monthly_report_csv(&report)?))
                } else {
                    Ok(HttpResponse::json(200, report))
                }
            }
            ("GET", ["api", "reports", "employee", id]) => {
                self.guard(db, req, Action::Read, Some(*id))?;
                let (year, month) = year_month(req)?;
                Ok(HttpResponse::json(200, db.employee_report(id, year, month)?))
            }
            ("GET", ["api", "reports", "department", dept]) => {
                self.guard(db, req, Action::ReadAll, None)?;
                let (year, month) = year_month(req)?;
                Ok(HttpResponse::json(200, db.department_report(dept, year, month)?))
            }
            ("GET", ["api", "dashboard", "stats"]) => {
                self.guard(db, req, Action::ReadAll, None)?;
                Ok(HttpResponse::json(200, db.dashboard_stats()?))
            }

            _ => Ok(HttpResponse::not_found()),
        }
    }

    // ==================== CALLER ====================

    fn caller(&self, db: &Database, req: &HttpRequest) -> TrackerResult<(Caller, Account)> {
        let token = auth::bearer_token(req.header("authorization"));
        let account = auth::authenticate(db, token, Utc::now())?;
        Ok((Caller::from_account(&account), account))
    }

    /// Authenticate, then authorize `action` on `target`.
    fn guard(
        &self,
        db: &Database,
        req: &HttpRequest,
        action: Action,
        target: Option<&str>,
    ) -> TrackerResult<Caller> {
        let (caller, _) = self.caller(db, req)?;
        if let Err(e) = authorize(&caller, action, target) {
            tracing::warn!(account_id = ?caller.account_id, ?action, target, "request denied");
            return Err(e);
        }
        Ok(caller)
    }

    // ==================== HANDLERS ====================

    fn handle_health(&self, db: &Database) -> TrackerResult<HttpResponse> {
        let health = HealthResponse {
            status: "ok".to_string(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            employees: db.count_employees()?,
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        Ok(HttpResponse::json(200, health))
    }

    fn handle_register(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        let registration: Registration = parse_body(req)?;
        let result = auth::register(db, &registration, self.config.session_lifetime())?;
        Ok(HttpResponse::json(201, result))
    }

    fn handle_login(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        let body: LoginRequest = parse_body(req)?;
        let result = auth::login(db, &body.email, &body.password, self.config.session_lifetime())?;
        Ok(HttpResponse::json(200, result))
    }

    fn handle_logout(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        self.caller(db, req)?;
        if let Some(token) = auth::bearer_token(req.header("authorization")) {
            auth::logout(db, token)?;
        }
        Ok(HttpResponse::json(200, MessageResponse::new("Logged Out")))
    }

    fn handle_send_verify_otp(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        let (_, account) = self.caller(db, req)?;
        auth::send_verify_otp(db, account.id, self.otp_sender.as_ref())?;
        Ok(HttpResponse::json(200, MessageResponse::new("Verification OTP Sent on Email")))
    }

    fn handle_verify_account(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        let (_, account) = self.caller(db, req)?;
        let body: VerifyAccountRequest = parse_body(req)?;
        let account = auth::verify_account(db, account.id, &body.otp)?;
        Ok(HttpResponse::json(200, account))
    }

    fn handle_send_reset_otp(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        let body: ResetOtpRequest = parse_body(req)?;
        auth::send_reset_otp(db, &body.email, self.otp_sender.as_ref())?;
        Ok(HttpResponse::json(200, MessageResponse::new("OTP sent to your email")))
    }

    fn handle_reset_password(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        let body: ResetPasswordRequest = parse_body(req)?;
        auth::reset_password(db, &body.email, &body.otp, &body.new_password)?;
        Ok(HttpResponse::json(200, MessageResponse::new("Password has been reset successfully")))
    }

    fn handle_create_employee(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        self.guard(db, req, Action::Administer, None)?;
        let body: CreateEmployeeRequest = parse_body(req)?;

        let mut employee = Employee::new(body.employee_id, body.name, body.department, body.position);
        employee.project_code = body.project_code.filter(|s| !s.trim().is_empty());
        employee.coordinator_name = body.coordinator_name.filter(|s| !s.trim().is_empty());
        if let Some(ref pw) = body.password {
            employee.password_hash = Some(password::hash_password(pw)?);
        }
        let employee = db.insert_employee(&employee)?;
        Ok(HttpResponse::json(201, employee))
    }

    fn handle_update_employee(
        &self,
        db: &Database,
        req: &HttpRequest,
        employee_id: &str,
    ) -> TrackerResult<HttpResponse> {
        self.guard(db, req, Action::Amend, Some(employee_id))?;
        let changes: EmployeeChanges = parse_body(req)?;
        if changes.is_empty() {
            return Err(TrackerError::invalid("no changes given"));
        }

        let password_hash = changes
            .password
            .as_deref()
            .map(password::hash_password)
            .transpose()?;

        let employee = db.update_employee(employee_id, &changes)?;
        if let Some(ref hash) = password_hash {
            db.set_employee_password(employee_id, hash)?;
        }
        Ok(HttpResponse::json(200, employee))
    }

    fn handle_create_department(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        self.guard(db, req, Action::Administer, None)?;
        let body: DepartmentRequest = parse_body(req)?;
        let name = body
            .name
            .ok_or_else(|| TrackerError::invalid("department name is required"))?;

        let mut dept = Department::new(name);
        dept.description = body.description.filter(|d| !d.trim().is_empty());
        db.insert_department(&dept)?;
        Ok(HttpResponse::json(201, dept))
    }

    fn handle_record_performance(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        let body: RecordPerformanceRequest = parse_body(req)?;
        self.guard(db, req, Action::Write, Some(&body.employee_id))?;

        let record = db.record_performance(
            &body.employee_id,
            body.date.unwrap_or_else(today),
            body.daily_points,
            body.sales_amount.unwrap_or(0.0),
        )?;
        Ok(HttpResponse::json(201, record))
    }

    fn handle_daily_points(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        let body: RecordPerformanceRequest = parse_body(req)?;
        self.guard(db, req, Action::Write, Some(&body.employee_id))?;

        let submission = db.submit_daily_points(
            &body.employee_id,
            body.date.unwrap_or_else(today),
            body.daily_points,
            body.sales_amount,
        )?;
        let status = if submission.created { 201 } else { 200 };
        Ok(HttpResponse::json(status, submission))
    }

    fn handle_submit_points(&self, db: &Database, req: &HttpRequest) -> TrackerResult<HttpResponse> {
        let body: SubmitPointsRequest = parse_body(req)?;
        self.guard(db, req, Action::Write, Some(&body.employee_id))?;

        let record = db.submit_points(
            &body.employee_id,
            body.date.unwrap_or_else(today),
            body.points,
            &body.description,
        )?;
        Ok(HttpResponse::json(201, record))
    }
}

// ==================== REQUEST HELPERS ====================

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_body<T: DeserializeOwned>(req: &HttpRequest) -> TrackerResult<T> {
    if req.body.is_empty() {
        return Err(TrackerError::invalid("request body is required"));
    }
    serde_json::from_slice(&req.body).map_err(|e| TrackerError::invalid(format!("invalid JSON: {}", e)))
}

fn parse_id(raw: &str) -> TrackerResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| TrackerError::invalid(format!("invalid id '{}'", raw)))
}

/// First non-empty query parameter among `names`.
fn param<'a>(req: &'a HttpRequest, names: &[&str]) -> Option<&'a str> {
    names.iter().find_map(|name| req.param(name))
}

fn date_param(req: &HttpRequest, names: &[&str]) -> TrackerResult<Option<NaiveDate>> {
    param(req, names)
        .map(|raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map_err(|_| TrackerError::invalid(format!("invalid date '{}', expected YYYY-MM-DD", raw)))
        })
        .transpose()
}

/// `year` and `month` query parameters, defaulting to the current month.
fn year_month(req: &HttpRequest) -> TrackerResult<(i32, u32)> {
    let now = today();
    let year = match req.param("year") {
        Some(raw) => raw
            .trim()
            .parse::<i32>()
            .map_err(|_| TrackerError::invalid(format!("invalid year '{}'", raw)))?,
        None => now.year(),
    };
    let month = match req.param("month") {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| TrackerError::invalid(format!("invalid month '{}'", raw)))?,
        None => now.month(),
    };
    Ok((year, month))
}
