pub const SCHEMA_VERSION: i32 = 1;

pub const SCHEMA_V1: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL
);

-- Key/value settings (server port, session lifetime, ...)
CREATE TABLE IF NOT EXISTS app_settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS departments (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT,
    created_at TEXT NOT NULL
);

-- points is the running total of the employee's ledger entries
CREATE TABLE IF NOT EXISTS employees (
    employee_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    department TEXT NOT NULL,
    position TEXT NOT NULL,
    points REAL NOT NULL DEFAULT 0,
    project_code TEXT,
    coordinator_name TEXT,
    password_hash TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Unified ledger. employee_id is a plain value: entries outlive deleted employees.
CREATE TABLE IF NOT EXISTS performance (
    id TEXT PRIMARY KEY,
    employee_id TEXT NOT NULL,
    date TEXT NOT NULL,
    daily_points REAL NOT NULL CHECK(daily_points >= 0),
    sales_amount REAL NOT NULL DEFAULT 0 CHECK(sales_amount >= 0),
    kind TEXT NOT NULL DEFAULT 'performance' CHECK(kind IN ('performance', 'points')),
    description TEXT,
    monthly_target REAL NOT NULL,
    daily_target REAL NOT NULL,
    daily_progress REAL NOT NULL,
    ratio REAL NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'employee' CHECK(role IN ('admin', 'manager', 'employee')),
    employee_id TEXT,
    department TEXT,
    is_verified INTEGER NOT NULL DEFAULT 0,
    verify_otp TEXT,
    verify_otp_expires_at TEXT,
    reset_otp TEXT,
    reset_otp_expires_at TEXT,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    account_id TEXT NOT NULL,
    token_hash TEXT NOT NULL UNIQUE,
    token_prefix TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    revoked_at TEXT,
    FOREIGN KEY (account_id) REFERENCES accounts(id) ON DELETE CASCADE
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_employee_department ON employees(department);
CREATE INDEX IF NOT EXISTS idx_performance_employee_date ON performance(employee_id, date);
CREATE INDEX IF NOT EXISTS idx_performance_date ON performance(date);
CREATE INDEX IF NOT EXISTS idx_account_employee ON accounts(employee_id);
CREATE INDEX IF NOT EXISTS idx_session_account ON sessions(account_id);
"#;
