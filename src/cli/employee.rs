use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use super::display::{print_employee, print_employees};
use super::ui::{confirm, prompt_new_password};
use crate::auth::password::hash_password;
use crate::db::Database;
use crate::models::{Employee, EmployeeChanges};

#[derive(Args)]
pub struct EmployeeArgs {
    #[command(subcommand)]
    pub command: EmployeeCommands,
}

#[derive(Subcommand)]
pub enum EmployeeCommands {
    /// Add an employee
    Add {
        /// Employee id (letters, digits, `_`, `.`, `-`)
        employee_id: String,
        #[arg(short, long)]
        name: String,
        /// Department name (must exist)
        #[arg(short, long)]
        department: String,
        #[arg(short, long)]
        position: String,
        #[arg(long)]
        project_code: Option<String>,
        #[arg(long)]
        coordinator: Option<String>,
        /// Prompt for a login password stored on the employee
        #[arg(long)]
        set_password: bool,
    },
    /// List employees
    List {
        /// Only employees of this department
        #[arg(short, long)]
        department: Option<String>,
    },
    /// Show one employee
    Show { employee_id: String },
    /// Change an employee's descriptive fields
    Update {
        employee_id: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        department: Option<String>,
        #[arg(short, long)]
        position: Option<String>,
        /// Empty string clears the project code
        #[arg(long)]
        project_code: Option<String>,
        /// Empty string clears the coordinator
        #[arg(long)]
        coordinator: Option<String>,
        #[arg(long)]
        set_password: bool,
    },
    /// Delete an employee (ledger entries are kept)
    Delete {
        employee_id: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

pub fn run_employee(db: &Database, args: EmployeeArgs) -> Result<()> {
    match args.command {
        EmployeeCommands::Add {
            employee_id,
            name,
            department,
            position,
            project_code,
            coordinator,
            set_password,
        } => {
            let mut employee = Employee::new(employee_id, name, department, position);
            employee.project_code = project_code.filter(|s| !s.trim().is_empty());
            employee.coordinator_name = coordinator.filter(|s| !s.trim().is_empty());
            if set_password {
                employee.password_hash = Some(hash_password(&prompt_new_password("Password:")?)?);
            }
            db.insert_employee(&employee)?;
            println!("Created: {} ({})", employee.name, employee.employee_id);
        }
        EmployeeCommands::List { department } => {
            let employees = match department {
                Some(ref dept) => db.list_employees_by_department(dept)?,
                None => db.list_employees()?,
            };
            print_employees(&employees);
        }
        EmployeeCommands::Show { employee_id } => {
            let employee = db.require_employee(&employee_id)?;
            print_employee(&employee);
        }
        EmployeeCommands::Update {
            employee_id,
            name,
            department,
            position,
            project_code,
            coordinator,
            set_password,
        } => {
            let changes = EmployeeChanges {
                name,
                department,
                position,
                project_code,
                coordinator_name: coordinator,
                password: None,
            };
            if changes.is_empty() && !set_password {
                return Err(anyhow!("Nothing to update. Pass at least one field."));
            }

            let password_hash = if set_password {
                Some(hash_password(&prompt_new_password("New password:")?)?)
            } else {
                None
            };

            let employee = if changes.is_empty() {
                db.require_employee(&employee_id)?
            } else {
                db.update_employee(&employee_id, &changes)?
            };
            if let Some(ref hash) = password_hash {
                db.set_employee_password(&employee_id, hash)?;
            }
            println!("Updated: {} ({})", employee.name, employee.employee_id);
        }
        EmployeeCommands::Delete { employee_id, force } => {
            let employee = db.require_employee(&employee_id)?;
            print_employee(&employee);
            println!();

            if !force && !confirm(&format!("Delete {}?", employee.name)).unwrap_or(false) {
                println!("Cancelled.");
                return Ok(());
            }

            db.delete_employee(&employee_id)?;
            println!("Deleted. Ledger entries for {} were kept.", employee_id);
        }
    }
    Ok(())
}
