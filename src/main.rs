use clap::Parser;
use perftrack::cli::{
    run_account, run_config, run_department, run_employee, run_perf, run_reconcile, run_report,
    run_serve, Cli, Commands,
};
use perftrack::db::Database;
use perftrack::logging::init_tracing;

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let db_path = match cli.db {
        Some(path) => path,
        None => Database::default_path()?,
    };
    let db = Database::open_at(db_path.clone())?;

    match cli.command {
        Commands::Serve(args) => run_serve(&db, &db_path, args)?,
        Commands::Employee(args) => run_employee(&db, args)?,
        Commands::Department(args) => run_department(&db, args)?,
        Commands::Perf(args) => run_perf(&db, args)?,
        Commands::Report(args) => run_report(&db, args)?,
        Commands::Account(args) => run_account(&db, args)?,
        Commands::Reconcile(args) => run_reconcile(&db, args)?,
        Commands::Config(args) => run_config(&db, args)?,
    }

    Ok(())
}
