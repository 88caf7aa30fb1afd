//! End-to-end request handling against an in-memory database.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::{Datelike, Local, NaiveDate};
use serde_json::{json, Value};

use perftrack::auth::{self, OtpPurpose, OtpSender};
use perftrack::cli::serve::{ApiServer, HttpRequest, HttpResponse};
use perftrack::config::ServerConfig;
use perftrack::models::Role;
use perftrack::{Database, TrackerResult};

#[derive(Clone, Default)]
struct Outbox(Arc<Mutex<Vec<(String, OtpPurpose, String)>>>);

impl Outbox {
    fn last_code(&self) -> String {
        self.0.lock().unwrap().last().unwrap().2.clone()
    }
}

impl OtpSender for Outbox {
    fn send(&self, email: &str, purpose: OtpPurpose, otp: &str) -> TrackerResult<()> {
        self.0
            .lock()
            .unwrap()
            .push((email.to_string(), purpose, otp.to_string()));
        Ok(())
    }
}

struct Harness {
    server: ApiServer,
    db: Database,
    outbox: Outbox,
    admin: String,
}

impl Harness {
    fn new() -> Self {
        let outbox = Outbox::default();
        let server = ApiServer::new(PathBuf::from(":memory:"), ServerConfig::default())
            .with_otp_sender(Box::new(outbox.clone()));
        let db = Database::open_memory().unwrap();
        auth::create_account(&db, "Admin", "admin@example.com", "adminpw", Role::Admin, None)
            .unwrap();
        let mut h = Self {
            server,
            db,
            outbox,
            admin: String::new(),
        };
        h.admin = h.login("admin@example.com", "adminpw");
        h
    }

    fn send(&self, method: &str, target: &str, token: Option<&str>, body: Option<Value>) -> (u16, Value) {
        let mut req = HttpRequest::new(method, target);
        if let Some(token) = token {
            req = req.with_header("authorization", &format!("Bearer {}", token));
        }
        if let Some(body) = body {
            req = req.with_body(body.to_string());
        }
        let resp: HttpResponse = self.server.dispatch(&self.db, &req);
        let value = serde_json::from_str(&resp.body).unwrap_or(Value::Null);
        (resp.status, value)
    }

    fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self.send(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        );
        assert_eq!(status, 200, "login failed: {}", body);
        body["data"]["token"].as_str().unwrap().to_string()
    }

    fn add_employee(&self, id: &str, name: &str, dept: &str) {
        let (status, body) = self.send(
            "POST",
            "/api/employees",
            Some(&self.admin),
            Some(json!({ "employeeId": id, "name": name, "department": dept, "position": "Rep" })),
        );
        assert_eq!(status, 201, "create failed: {}", body);
    }

    fn record(&self, token: &str, id: &str, date: &str, points: f64) -> (u16, Value) {
        self.send(
            "POST",
            "/api/performance",
            Some(token),
            Some(json!({ "employeeId": id, "date": date, "dailyPoints": points, "salesAmount": 0 })),
        )
    }
}

#[test]
fn health_needs_no_token() {
    let h = Harness::new();
    let (status, body) = h.send("GET", "/api/health", None, None);
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[test]
fn unknown_route_is_404() {
    let h = Harness::new();
    let (status, body) = h.send("GET", "/api/nope", Some(&h.admin), None);
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);
}

#[test]
fn protected_routes_require_a_valid_token() {
    let h = Harness::new();
    assert_eq!(h.send("GET", "/api/employees", None, None).0, 401);
    assert_eq!(h.send("GET", "/api/employees", Some("pt_bogus"), None).0, 401);
    assert_eq!(h.send("GET", "/api/employees", Some(&h.admin), None).0, 200);
}

#[test]
fn logout_revokes_the_session() {
    let h = Harness::new();
    let token = h.login("admin@example.com", "adminpw");
    assert_eq!(h.send("POST", "/api/auth/logout", Some(&token), None).0, 200);
    assert_eq!(h.send("GET", "/api/auth/me", Some(&token), None).0, 401);
    // other sessions survive
    assert_eq!(h.send("GET", "/api/auth/me", Some(&h.admin), None).0, 200);
}

#[test]
fn bad_credentials_are_401() {
    let h = Harness::new();
    let (status, _) = h.send(
        "POST",
        "/api/auth/login",
        None,
        Some(json!({ "email": "admin@example.com", "password": "wrong-password" })),
    );
    assert_eq!(status, 401);
}

#[test]
fn employee_create_validates_department_and_uniqueness() {
    let h = Harness::new();
    h.add_employee("E1", "Ann", "MKT 1");

    let (status, _) = h.send(
        "POST",
        "/api/employees",
        Some(&h.admin),
        Some(json!({ "employeeId": "E1", "name": "Dup", "department": "MKT 1", "position": "Rep" })),
    );
    assert_eq!(status, 409);

    let (status, _) = h.send(
        "POST",
        "/api/employees",
        Some(&h.admin),
        Some(json!({ "employeeId": "E2", "name": "Bo", "department": "Nowhere", "position": "Rep" })),
    );
    assert_eq!(status, 404);

    let (status, body) = h.send("GET", "/api/employees/department/MKT%201", Some(&h.admin), None);
    assert_eq!(status, 200);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[test]
fn counter_follows_ledger_writes() {
    let h = Harness::new();
    h.add_employee("E1", "Ann", "MKT 1");

    let (status, a) = h.record(&h.admin, "E1", "2024-03-01", 100.0);
    assert_eq!(status, 201);
    let a_id = a["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = h.send(
        "PUT",
        &format!("/api/performance/{}", a_id),
        Some(&h.admin),
        Some(json!({ "dailyPoints": 150 })),
    );
    assert_eq!(status, 200);
    h.record(&h.admin, "E1", "2024-03-02", 50.0);

    let (_, emp) = h.send("GET", "/api/employees/E1", Some(&h.admin), None);
    assert_eq!(emp["data"]["points"], 200.0);

    let (status, _) = h.send("DELETE", &format!("/api/performance/{}", a_id), Some(&h.admin), None);
    assert_eq!(status, 200);
    let (_, emp) = h.send("GET", "/api/employees/E1", Some(&h.admin), None);
    assert_eq!(emp["data"]["points"], 50.0);

    let (status, _) = h.send("DELETE", &format!("/api/performance/{}", a_id), Some(&h.admin), None);
    assert_eq!(status, 404);
}

#[test]
fn daily_points_upsert_reports_created_then_replaced() {
    let h = Harness::new();
    h.add_employee("E1", "Ann", "MKT 1");
    let body = json!({ "employeeId": "E1", "date": "2024-03-05", "dailyPoints": 300 });

    let (status, first) = h.send("POST", "/api/performance/daily-points", Some(&h.admin), Some(body));
    assert_eq!(status, 201);
    assert_eq!(first["data"]["created"], true);

    let body = json!({ "employeeId": "E1", "date": "2024-03-05", "dailyPoints": 120 });
    let (status, second) = h.send("POST", "/api/performance/daily-points", Some(&h.admin), Some(body));
    assert_eq!(status, 200);
    assert_eq!(second["data"]["created"], false);
    assert_eq!(second["data"]["record"]["id"], first["data"]["record"]["id"]);

    let (_, emp) = h.send("GET", "/api/employees/E1", Some(&h.admin), None);
    assert_eq!(emp["data"]["points"], 120.0);
}

#[test]
fn monthly_progress_and_leaderboard() {
    let h = Harness::new();
    h.add_employee("E1", "Ann", "MKT 1");
    h.add_employee("E2", "Bo", "MKT 1");
    h.add_employee("E3", "Cy", "MKT 1");

    for (date, pts) in [("2024-03-01", 1000.0), ("2024-03-10", 2000.0), ("2024-03-20", 3000.0)] {
        h.record(&h.admin, "E1", date, pts);
    }
    let (status, body) = h.send(
        "GET",
        "/api/performance/employee/E1/monthly?year=2024&month=3",
        Some(&h.admin),
        None,
    );
    assert_eq!(status, 200);
    assert_eq!(body["data"]["total_points"], 6000.0);
    assert_eq!(body["data"]["monthly_progress"], 25.0);

    let (status, _) = h.send(
        "GET",
        "/api/performance/employee/E1/monthly?year=2024&month=13",
        Some(&h.admin),
        None,
    );
    assert_eq!(status, 400);

    let today = Local::now().date_naive().format("%Y-%m-%d").to_string();
    h.record(&h.admin, "E2", &today, 300.0);
    h.record(&h.admin, "E3", &today, 200.0);
    let (status, body) = h.send(
        "GET",
        "/api/performance/department/MKT%201/leaderboard?period=daily",
        Some(&h.admin),
        None,
    );
    assert_eq!(status, 200);
    let ids: Vec<&str> = body["data"]["leaderboard"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["employee_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids[..2], ["E2", "E3"]);

    let (status, _) = h.send(
        "GET",
        "/api/performance/department/MKT4/summary?year=2024&month=3",
        Some(&h.admin),
        None,
    );
    assert_eq!(status, 404);
}

#[test]
fn employee_role_flow() {
    let h = Harness::new();
    h.add_employee("E1", "Ann", "MKT 1");
    h.add_employee("E2", "Bo", "MKT 1");

    let (status, reg) = h.send(
        "POST",
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ann", "email": "ann@example.com", "password": "annpass" })),
    );
    assert_eq!(status, 201);
    let token = reg["data"]["token"].as_str().unwrap().to_string();
    let account_id = reg["data"]["account"]["id"].as_str().unwrap().parse().unwrap();
    auth::link_employee(&h.db, account_id, Some("E1")).unwrap();

    // unverified accounts cannot write
    let (status, body) = h.record(&token, "E1", "2024-03-01", 10.0);
    assert_eq!(status, 403, "{}", body);

    assert_eq!(h.send("POST", "/api/auth/send-verify-otp", Some(&token), None).0, 200);
    let (status, _) = h.send(
        "POST",
        "/api/auth/verify-account",
        Some(&token),
        Some(json!({ "otp": "000000" })),
    );
    assert_eq!(status, 400);
    let (status, _) = h.send(
        "POST",
        "/api/auth/verify-account",
        Some(&token),
        Some(json!({ "otp": h.outbox.last_code() })),
    );
    assert_eq!(status, 200);

    let (status, own) = h.record(&token, "E1", "2024-03-01", 10.0);
    assert_eq!(status, 201);
    assert_eq!(h.record(&token, "E2", "2024-03-01", 10.0).0, 403);

    assert_eq!(h.send("GET", "/api/employees/E1", Some(&token), None).0, 200);
    assert_eq!(h.send("GET", "/api/employees/E2", Some(&token), None).0, 403);
    assert_eq!(h.send("GET", "/api/employees", Some(&token), None).0, 403);

    let own_id = own["data"]["id"].as_str().unwrap();
    let (status, _) = h.send("DELETE", &format!("/api/performance/{}", own_id), Some(&token), None);
    assert_eq!(status, 403);
}

#[test]
fn manager_can_amend_but_not_delete() {
    let h = Harness::new();
    h.add_employee("E1", "Ann", "MKT 1");
    auth::create_account(&h.db, "Mia", "mia@example.com", "miapass", Role::Manager, None).unwrap();
    let manager = h.login("mia@example.com", "miapass");

    let (status, rec) = h.record(&manager, "E1", "2024-03-01", 40.0);
    assert_eq!(status, 201);
    let id = rec["data"]["id"].as_str().unwrap();

    let (status, _) = h.send(
        "PUT",
        "/api/employees/E1",
        Some(&manager),
        Some(json!({ "position": "Lead" })),
    );
    assert_eq!(status, 200);
    assert_eq!(h.send("DELETE", &format!("/api/performance/{}", id), Some(&manager), None).0, 403);
    assert_eq!(h.send("DELETE", "/api/employees/E1", Some(&manager), None).0, 403);
    assert_eq!(
        h.send("POST", "/api/departments", Some(&manager), Some(json!({ "name": "Ops" }))).0,
        403
    );
}

#[test]
fn rejected_password_leaves_profile_untouched() {
    let h = Harness::new();
    h.add_employee("E1", "Ann", "MKT 1");

    let (status, body) = h.send(
        "PUT",
        "/api/employees/E1",
        Some(&h.admin),
        Some(json!({ "name": "New", "password": "x" })),
    );
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("at least 6"));
    let stored = h.db.require_employee("E1").unwrap();
    assert_eq!(stored.name, "Ann");
    assert!(stored.password_hash.is_none());

    let (status, body) = h.send(
        "PUT",
        "/api/employees/E1",
        Some(&h.admin),
        Some(json!({ "name": "New", "password": "longenough" })),
    );
    assert_eq!(status, 200);
    assert_eq!(body["data"]["name"], "New");
    assert!(h.db.require_employee("E1").unwrap().password_hash.is_some());
}

#[test]
fn password_reset_revokes_sessions() {
    let h = Harness::new();
    auth::create_account(&h.db, "Mia", "mia@example.com", "miapass", Role::Manager, None).unwrap();
    let token = h.login("mia@example.com", "miapass");

    let (status, _) = h.send(
        "POST",
        "/api/auth/send-reset-otp",
        None,
        Some(json!({ "email": "mia@example.com" })),
    );
    assert_eq!(status, 200);
    let (status, _) = h.send(
        "POST",
        "/api/auth/reset-password",
        None,
        Some(json!({ "email": "mia@example.com", "otp": h.outbox.last_code(), "newPassword": "fresh-pass" })),
    );
    assert_eq!(status, 200);

    assert_eq!(h.send("GET", "/api/auth/me", Some(&token), None).0, 401);
    h.login("mia@example.com", "fresh-pass");
}

#[test]
fn points_submission_counts_toward_counter() {
    let h = Harness::new();
    h.add_employee("E1", "Ann", "MKT 1");

    let (status, _) = h.send(
        "POST",
        "/api/points/submit",
        Some(&h.admin),
        Some(json!({ "employeeId": "E1", "points": 25, "description": "" })),
    );
    assert_eq!(status, 400);

    let (status, body) = h.send(
        "POST",
        "/api/points/submit",
        Some(&h.admin),
        Some(json!({ "employeeId": "E1", "points": 25, "description": "trade show" })),
    );
    assert_eq!(status, 201);
    assert_eq!(body["data"]["kind"], "points");

    let (_, emp) = h.send("GET", "/api/employees/E1", Some(&h.admin), None);
    assert_eq!(emp["data"]["points"], 25.0);
}

#[test]
fn department_rename_cascades() {
    let h = Harness::new();
    let (status, dept) = h.send(
        "POST",
        "/api/departments",
        Some(&h.admin),
        Some(json!({ "name": "Ops", "description": "Operations" })),
    );
    assert_eq!(status, 201);
    h.add_employee("E1", "Ann", "Ops");

    let id = dept["data"]["id"].as_str().unwrap();
    let (status, _) = h.send(
        "PUT",
        &format!("/api/departments/{}", id),
        Some(&h.admin),
        Some(json!({ "name": "Operations" })),
    );
    assert_eq!(status, 200);

    let (_, emp) = h.send("GET", "/api/employees/E1", Some(&h.admin), None);
    assert_eq!(emp["data"]["department"], "Operations");
}

#[test]
fn monthly_report_as_csv() {
    let h = Harness::new();
    h.add_employee("E1", "Ann", "MKT 1");
    h.record(&h.admin, "E1", "2024-03-01", 800.0);

    let req = HttpRequest::new("GET", "/api/reports/monthly?year=2024&month=3&format=csv")
        .with_header("authorization", &format!("Bearer {}", h.admin));
    let resp = h.server.dispatch(&h.db, &req);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.content_type, "text/csv");
    let mut lines = resp.body.lines();
    assert!(lines.next().unwrap().starts_with("employee_id"));
    assert!(lines.next().unwrap().starts_with("E1,Ann"));
}

#[test]
fn dashboard_and_filtered_report() {
    let h = Harness::new();
    h.add_employee("E1", "Ann", "MKT 1");
    let today = Local::now().date_naive();
    let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap();
    h.record(&h.admin, "E1", &first.to_string(), 100.0);

    let (status, body) = h.send("GET", "/api/dashboard/stats", Some(&h.admin), None);
    assert_eq!(status, 200);
    assert_eq!(body["data"]["total_employees"], 1);
    assert_eq!(body["data"]["total_performance"], 1);

    let (status, body) = h.send(
        "GET",
        "/api/reports?department=MKT%201&startDate=2000-01-01",
        Some(&h.admin),
        None,
    );
    assert_eq!(status, 200);
    assert_eq!(body["data"]["performance_stats"]["total_records"], 1);

    assert_eq!(
        h.send("GET", "/api/reports?startDate=not-a-date", Some(&h.admin), None).0,
        400
    );
}
