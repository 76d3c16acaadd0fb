use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use school_registry::{
    dashboard_summary, delete_establishment, find_by_code, get_establishment_details,
    get_programs, import_enrollment, import_establishments, init_logging, load_enrollment_csv,
    load_establishments_csv, open_database, parse_programs, search_connectivity,
    search_establishments, set_programs, BusinessCode, Config, EstablishmentDetails,
    EstablishmentId, Program,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "school-registry")]
#[command(about = "Search, inspect and maintain the school establishment registry", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/school-registry/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overrides the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "school_registry=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and schema
    Init,

    /// Import establishments from CSV (duplicate codes are skipped)
    Import { csv: PathBuf },

    /// Load the enrollment staging table from CSV
    ImportEnrollment {
        csv: PathBuf,
        /// Replace the staging table instead of appending
        #[arg(long)]
        replace: bool,
    },

    /// Search by name, alias, district, city or business code
    Search {
        #[arg(default_value = "")]
        term: String,
        /// Search the connectivity view instead
        #[arg(long)]
        connectivity: bool,
    },

    /// Show one establishment by id or business code
    Show { key: String },

    /// Dashboard statistics
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Show or replace the programs of a business code
    Programs {
        code: BusinessCode,
        /// Replace the membership with these catalog names
        #[arg(long, num_args = 0..)]
        set: Option<Vec<String>>,
    },

    /// Delete an establishment and its related rows
    Delete { id: String },

    /// Interactive terminal browser (default)
    Tui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?.with_overrides(cli.db, None, cli.log_level);
    init_logging(&config);

    let conn = open_database(&config.database_path)
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;

    match cli.command.unwrap_or(Command::Tui) {
        Command::Init => {
            println!("✓ Database ready at {}", config.database_path.display());
        }
        Command::Import { csv } => run_import(&conn, &csv)?,
        Command::ImportEnrollment { csv, replace } => {
            let rows = load_enrollment_csv(&csv)?;
            let staged = import_enrollment(&conn, &rows, replace)?;
            println!("✓ Staged {} enrollment rows", staged);
        }
        Command::Search { term, connectivity } => run_search(&conn, &term, connectivity)?,
        Command::Show { key } => run_show(&conn, &key)?,
        Command::Stats { json } => run_stats(&conn, json)?,
        Command::Programs { code, set } => run_programs(&conn, code, set)?,
        Command::Delete { id } => {
            delete_establishment(&conn, &EstablishmentId::from(id.as_str()))?;
            println!("✓ Deleted {}", id);
        }
        Command::Tui => run_ui_mode(&conn)?,
    }

    Ok(())
}

fn run_import(conn: &Connection, csv: &std::path::Path) -> Result<()> {
    println!("📂 Loading {}...", csv.display());
    let rows = load_establishments_csv(csv)?;
    println!("✓ Loaded {} rows", rows.len());

    let summary = import_establishments(conn, &rows)?;
    println!("✓ Inserted: {}", summary.inserted);
    if summary.duplicates > 0 {
        println!("⚠ Skipped duplicate codes: {}", summary.duplicates);
    }
    Ok(())
}

fn run_search(conn: &Connection, term: &str, connectivity: bool) -> Result<()> {
    if connectivity {
        let rows = search_connectivity(conn, term)?;
        for r in &rows {
            println!(
                "{:>10}  {:<40}  {:<20}  {}",
                r.code,
                r.name.as_deref().unwrap_or("-"),
                r.district.as_deref().unwrap_or("-"),
                r.category.label()
            );
        }
        println!("{} result(s)", rows.len());
    } else {
        let rows = search_establishments(conn, term)?;
        for e in &rows {
            println!(
                "{:>10}  {:<40}  {:<20}  {:<20}  {}",
                e.code,
                e.display_name(),
                e.district.as_deref().unwrap_or("-"),
                e.city.as_deref().unwrap_or("-"),
                e.id
            );
        }
        println!("{} result(s)", rows.len());
    }
    Ok(())
}

fn run_show(conn: &Connection, key: &str) -> Result<()> {
    let id = match key.parse::<BusinessCode>() {
        Ok(code) => find_by_code(conn, code)?
            .map(|e| e.id)
            .with_context(|| format!("No establishment with code {}", code))?,
        Err(_) => EstablishmentId::from(key),
    };

    let details: EstablishmentDetails = get_establishment_details(conn, &id)?;
    let programs = get_programs(conn, details.establishment.code)?;

    let mut value = serde_json::to_value(&details)?;
    value["programs"] = serde_json::to_value(programs.iter().map(|p| &p.program).collect::<Vec<_>>())?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn run_stats(conn: &Connection, json: bool) -> Result<()> {
    let summary = dashboard_summary(conn);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let g = &summary.general;
    println!("📊 Establishments:     {}", g.total_establishments);
    println!("   Districts:          {}", summary.district_count);
    println!("   Total enrollment:   {}", summary.total_enrollment);
    println!("   Laptops:            {}", g.total_laptops);
    println!("   Tablets:            {}", g.total_tablets);
    println!("   Robotics kits:      {}", g.total_robotics_kits);
    println!("   3D printers:        {}", g.total_printers_3d);
    println!(
        "   Without equipment:  {} ({:.1}%)",
        g.without_equipment, g.without_equipment_pct
    );

    println!("\n🌐 Connectivity");
    for category in school_registry::ConnectivityCategory::ALL {
        println!("   {:<18}  {}", category.label(), summary.connectivity.count(category));
    }

    println!("\n📚 Programs");
    for (program, count) in &summary.programs.by_program {
        println!("   {:<42}  {}", program, count);
    }
    Ok(())
}

fn run_programs(conn: &Connection, code: BusinessCode, set: Option<Vec<String>>) -> Result<()> {
    if let Some(names) = set {
        let programs: Vec<Program> = parse_programs(&names)?;
        set_programs(conn, code, &programs)?;
        println!("✓ Programs updated for {}", code);
    }

    for p in get_programs(conn, code)? {
        println!("  • {}", p.program);
    }
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(conn: &Connection) -> Result<()> {
    let mut app = school_registry::ui::App::new(conn);
    school_registry::ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_conn: &Connection) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web API: cargo run --bin school-server --features server");
    std::process::exit(1);
}
