use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};

use super::display::print_departments;
use super::ui::confirm;
use crate::db::Database;
use crate::error::TrackerError;
use crate::models::Department;

#[derive(Args)]
pub struct DepartmentArgs {
    #[command(subcommand)]
    pub command: DepartmentCommands,
}

#[derive(Subcommand)]
pub enum DepartmentCommands {
    /// Add a department
    Add {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List departments
    List,
    /// Rename a department or change its description
    Update {
        /// Department name or id
        department: String,
        /// New name (employees follow the rename)
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete a department (its employees keep the old name)
    Delete {
        /// Department name or id
        department: String,
        #[arg(short, long)]
        force: bool,
    },
}

pub fn run_department(db: &Database, args: DepartmentArgs) -> Result<()> {
    match args.command {
        DepartmentCommands::Add { name, description } => {
            let mut dept = Department::new(name);
            dept.description = description.filter(|d| !d.trim().is_empty());
            db.insert_department(&dept)?;
            println!("Created department: {}", dept.name);
        }
        DepartmentCommands::List => {
            print_departments(&db.list_departments()?);
        }
        DepartmentCommands::Update {
            department,
            name,
            description,
        } => {
            if name.is_none() && description.is_none() {
                return Err(anyhow!("Nothing to update. Pass --name or --description."));
            }
            let dept = resolve(db, &department)?;
            let updated = db.update_department(dept.id, name.as_deref(), description.as_deref())?;
            println!("Updated department: {}", updated.name);
        }
        DepartmentCommands::Delete { department, force } => {
            let dept = resolve(db, &department)?;
            let members = db.list_employees_by_department(&dept.name)?.len();
            if members > 0 {
                println!("{} employee(s) still reference {}.", members, dept.name);
            }

            if !force && !confirm(&format!("Delete department {}?", dept.name)).unwrap_or(false) {
                println!("Cancelled.");
                return Ok(());
            }

            db.delete_department(dept.id)?;
            println!("Deleted.");
        }
    }
    Ok(())
}

/// Look a department up by id, falling back to its name.
fn resolve(db: &Database, identifier: &str) -> Result<Department> {
    let found = match uuid::Uuid::parse_str(identifier.trim()) {
        Ok(id) => db.get_department(id)?,
        Err(_) => db.get_department_by_name(identifier.trim())?,
    };
    found.ok_or_else(|| TrackerError::department_not_found(identifier).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_by_name_or_id() {
        let db = Database::open_memory().unwrap();
        let by_name = resolve(&db, "MKT 1").unwrap();
        let by_id = resolve(&db, &by_name.id.to_string()).unwrap();
        assert_eq!(by_name, by_id);
        assert!(resolve(&db, "Nowhere").is_err());
    }
}
