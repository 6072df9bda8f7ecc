//! X3 Complex Calculator
//!
//! Command line front end for the factory production-rate model and the
//! sector network queries.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use complex_calculator::calculator::{self, format_cycle, DEFAULT_YIELD};
use complex_calculator::{db, extract, sample};
use complex_calculator::{FactorySize, Race, SectorId, Sun};

#[derive(Parser)]
#[command(name = "complex-calculator")]
#[command(about = "Factory production and sector distance calculator for X3 station complexes")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, default_value = "complex_data.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import wares, sectors and factories from XML game data
    Extract {
        /// Path to the data directory
        source_dir: PathBuf,

        /// Clear existing data before extraction
        #[arg(long)]
        clear: bool,
    },

    /// List factories, optionally only those producing one ware
    ListFactories {
        /// Ware ID (e.g. "energyCells")
        #[arg(short, long)]
        ware: Option<String>,
    },

    /// Show real cycle and hourly rates of a factory
    Factory {
        /// Factory ID
        id: String,

        /// Sun power in percent (solar power plants)
        #[arg(short, long)]
        suns: Option<u32>,

        /// Asteroid yield (mines)
        #[arg(short = 'y', long = "yield", default_value_t = DEFAULT_YIELD)]
        asteroid_yield: u32,
    },

    /// Show the cheapest factory of a size producing a ware
    Cheapest {
        /// Ware ID
        ware: String,

        /// Factory size (S, M, L, XL)
        size: FactorySize,
    },

    /// Number of jumps between two sectors
    Distance {
        from: String,
        to: String,
    },

    /// Find the closest sector where a factory can be bought
    Nearest {
        /// Source sector ID
        from: String,

        /// Factory ID
        factory: String,

        /// Skip shipyards of this race (repeatable)
        #[arg(long = "ignore-race")]
        ignore_races: Vec<Race>,

        /// Consider shipyards of all races
        #[arg(long)]
        all_races: bool,
    },

    /// Initialize empty database with schema
    Init,

    /// Load the built-in sample catalog
    LoadSample,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let conn = Connection::open(&cli.database)?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Extract { source_dir, clear } => {
            if clear {
                println!("Clearing existing data...");
                db::clear_catalog(&conn)?;
            }

            let stats = extract::extract_to_database(&conn, &source_dir)?;
            println!("{}", stats);
        }

        Commands::ListFactories { ware } => {
            let factories = match ware {
                Some(id) => {
                    let catalog = db::load_catalog(&conn)?;
                    let ware = catalog.ware(&id)?;
                    catalog.factories_producing(ware).into_iter().cloned().collect()
                }
                None => db::list_factories(&conn)?,
            };
            if factories.is_empty() {
                println!("No factories in database. Run 'extract' or 'load-sample' first.");
            } else {
                println!(
                    "{:<24} {:<28} {:<8} {:>10} {:>12} {:>12}",
                    "ID", "Factory", "Race", "Cycle", "Product/h", "Price"
                );
                println!("{}", "-".repeat(99));
                for f in factories {
                    println!(
                        "{:<24} {:<28} {:<8} {:>10} {:>12.0} {:>12}",
                        f.id(),
                        f.name(),
                        f.race(),
                        format_cycle(f.default_cycle()),
                        f.product_per_hour_default().quantity,
                        f.price()
                    );
                }
            }
        }

        Commands::Factory {
            id,
            suns,
            asteroid_yield,
        } => {
            let catalog = db::load_catalog(&conn)?;
            let factory = catalog.factory(&id)?;
            let sun = match suns {
                Some(percent) => Sun::try_from(percent)?,
                None => Sun::default(),
            };
            let report = calculator::factory_report(factory, sun, asteroid_yield);
            println!("{}", report);
        }

        Commands::Cheapest { ware, size } => {
            let catalog = db::load_catalog(&conn)?;
            let ware = catalog.ware(&ware)?;
            match catalog.cheapest_factory(ware, size) {
                Some(f) => println!("{} ({}, {}): {} Cr", f.name(), f.id(), f.race(), f.price()),
                None => println!("No {} factory produces {}", size, ware.name),
            }
        }

        Commands::Distance { from, to } => {
            let catalog = db::load_catalog(&conn)?;
            let jumps = catalog.distance(&SectorId::from(from), &SectorId::from(to))?;
            println!("{} jumps", jumps);
        }

        Commands::Nearest {
            from,
            factory,
            ignore_races,
            all_races,
        } => {
            let catalog = db::load_catalog(&conn)?;
            let factory = catalog.factory(&factory)?;
            let source = SectorId::from(from);
            match catalog.nearest_manufacturer(&source, factory, &ignore_races, all_races)? {
                Some(sector) => {
                    let jumps = catalog.distance(&source, &sector.id)?;
                    println!(
                        "{} ({}, {}) - {} jumps",
                        sector.name, sector.id, sector.race, jumps
                    );
                }
                None if factory.manufacturers().is_empty() => {
                    println!("{} is not sold anywhere", factory.name())
                }
                None => println!("No reachable shipyard sells {}", factory.name()),
            }
        }

        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::LoadSample => {
            sample::load_sample_data(&conn)?;
            println!("Sample data loaded successfully!");
        }
    }

    Ok(())
}
