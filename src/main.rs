use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use aqua_planner::{
    findings_for, has_error_for, summarize, write_stock_csv, Catalog, Category, PlannerConfig,
    Session, Severity, SqliteStore, VERSION,
};

#[derive(Parser)]
#[command(name = "aqua-planner", version, about = "Aquarium stocking planner")]
struct Cli {
    /// Species catalog (JSON array of species records).
    #[arg(long, global = true, default_value = "data/catalog.json")]
    catalog: PathBuf,

    /// SQLite file holding the saved tank.
    #[arg(long, global = true, default_value = "aqua-planner.db")]
    db: PathBuf,

    /// Planner configuration (TOML). Built-in defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tank: volume, stock and load.
    Status,

    /// Add a species to the tank.
    Add {
        /// Species id.
        id: String,

        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },

    /// Remove some individuals of a species.
    Remove {
        /// Species id.
        id: String,

        #[arg(short, long, default_value = "1")]
        quantity: u32,
    },

    /// Remove a species entirely.
    RemoveAll {
        /// Species id.
        id: String,
    },

    /// Set the tank volume.
    Volume {
        volume: f64,
    },

    /// Empty the tank (volume is kept).
    Clear,

    /// Run the compatibility check.
    Check,

    /// Show care recommendations for the current stock.
    Care,

    /// Export the tank configuration.
    Export {
        #[arg(long, value_enum, default_value = "json")]
        format: ExportFormat,
    },

    /// Search the catalog by name.
    Search {
        #[arg(long)]
        category: Option<String>,

        /// Text matched against common and scientific names.
        text: Option<String>,
    },

    /// Delete the saved tank.
    Forget,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };

    let catalog = Catalog::from_json_file(&cli.catalog)
        .with_context(|| format!("Failed to load catalog: {:?}", cli.catalog))?;
    let backend = SqliteStore::open(&cli.db)?;
    let mut session = Session::open(Arc::new(catalog), backend, config);

    match cli.command {
        Commands::Status => print_status(&session),

        Commands::Add { id, quantity } => {
            session.add_species_by_id(&id, quantity)?;
            println!("✓ Added {} x {}", quantity.max(1), id);
            print_status(&session);
        }

        Commands::Remove { id, quantity } => {
            session.remove_species(&id, quantity);
            println!("✓ {} now at {}", id, session.count(&id));
            print_status(&session);
        }

        Commands::RemoveAll { id } => {
            session.remove_all_of_species(&id);
            println!("✓ Removed all {}", id);
            print_status(&session);
        }

        Commands::Volume { volume } => {
            session.set_volume(volume);
            println!("✓ Tank volume set to {}", session.volume());
            print_status(&session);
        }

        Commands::Clear => {
            session.clear();
            println!("✓ Tank cleared");
        }

        Commands::Check => print_findings(&session),

        Commands::Care => print_care(&session),

        Commands::Export { format } => match format {
            ExportFormat::Json => println!("{}", session.export().to_json_pretty()?),
            ExportFormat::Csv => {
                write_stock_csv(std::io::stdout(), &session.ledger(), session.catalog())?
            }
        },

        Commands::Search { category, text } => {
            let category = match category.as_deref() {
                Some(name) => Some(
                    Category::parse(name)
                        .with_context(|| format!("Unknown category: {}", name))?,
                ),
                None => None,
            };

            let hits = session
                .catalog()
                .search(category, text.as_deref().unwrap_or(""));
            for species in &hits {
                println!(
                    "{:<24} {:<28} {:<7} {}",
                    species.id, species.display_name, species.category, species.scientific_name
                );
            }
            println!("\n{} species", hits.len());
        }

        Commands::Forget => {
            session.clear_storage();
            println!("✓ Saved tank deleted");
        }
    }

    Ok(())
}

fn print_status<S: aqua_planner::KeyValueStore>(session: &Session<S>) {
    let rules = &session.config().rules;
    let findings = session.findings();

    println!("🐠 Aqua Planner v{}", VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Volume: {} {}", session.volume(), rules.volume_unit);

    let stock = session.stocked();
    if stock.is_empty() {
        println!("\nThe tank is empty.");
        return;
    }

    println!();
    for item in &stock {
        let marker = if has_error_for(&findings, &item.species.id) {
            "⚠️ "
        } else {
            "  "
        };
        println!(
            "{} {:>3} x {:<28} load {:.1}  ({} finding(s))",
            marker,
            item.quantity,
            item.species.display_name,
            item.load(),
            findings_for(&findings, &item.species.id).len()
        );
    }

    println!();
    println!(
        "Individuals: {}   Load: {:.1} / {:.1} ({}%, {})",
        session.total_count(),
        session.total_load(),
        session.load_capacity(),
        session.load_percent(),
        session.load_status().as_str()
    );
    println!("{}", summarize(&findings));
}

fn print_findings<S: aqua_planner::KeyValueStore>(session: &Session<S>) {
    let findings = session.findings();

    if findings.is_empty() {
        println!("✅ No compatibility problems found");
        return;
    }

    for finding in &findings {
        let icon = match finding.severity {
            Severity::Error => "❌",
            Severity::Warning => "⚠️ ",
            Severity::Info => "ℹ️ ",
        };
        println!("{} {}: {}", icon, finding.title, finding.description);
    }
    println!("\n{}", summarize(&findings));
}

fn print_care<S: aqua_planner::KeyValueStore>(session: &Session<S>) {
    let Some(plan) = session.care_plan() else {
        println!("Add some species to get care recommendations.");
        return;
    };

    let unit = &plan.temperature_unit;
    if plan.temperature.conflict() {
        println!("🌡️  Temperature: conflict! Species have incompatible temperature needs.");
    } else {
        println!(
            "🌡️  Temperature: {}{} - {}{}",
            plan.temperature.min, unit, plan.temperature.max, unit
        );
    }

    if plan.ph.conflict() {
        println!("🧪 pH: conflict! Species have incompatible pH needs.");
    } else {
        println!("🧪 pH: {:.1} - {:.1}", plan.ph.min, plan.ph.max);
    }

    println!(
        "🔄 Filter: {}+ per hour (rated for {}x tank volume)",
        plan.filter_flow, plan.filter_multiplier
    );
    println!("💨 Flow: {}. {}", plan.flow.label(), plan.flow.details());
    println!("🍽️  Feeding: {}. {}", plan.feeding.label(), plan.feeding.details());
    println!("💧 Water changes: {} weekly", plan.water_change.percent_range());

    for note in &plan.special_notes {
        println!("⭐ {}", note);
    }
}
