use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;

use cinevec::cli::{Cli, Commands, ImportArgs, QueryArgs, SeedArgs};
use cinevec::config::{self, Config};
use cinevec::db::Database;
use cinevec::embedder::Embedder;
use cinevec::output;
use cinevec::search::{self, Metric, SearchRequest};
use cinevec::{analogy, loader, model};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Import(args) => cmd_import(args),
        Commands::Seed(args) => cmd_seed(args),
        Commands::Query(args) => cmd_query(args),
        Commands::Analogy => cmd_analogy(),
        Commands::Config => cmd_config(),
    }
}

fn cmd_import(args: ImportArgs) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(path) = args.csv {
        config.import.csv_path = path;
    }

    let mut db = Database::connect(&config.database)?;
    let mut embedder = load_embedder()?;

    eprintln!(
        "{} Importing movies from {}...",
        "→".green(),
        config.import.csv_path.display()
    );

    let stats = loader::import_csv(&mut db, &mut embedder, &config.import)?;

    eprintln!(
        "\nDone: {} inserted, {} already present, {} rolled back, {} rows skipped on error",
        stats.inserted, stats.already_present, stats.rolled_back, stats.errored
    );
    Ok(())
}

fn cmd_seed(args: SeedArgs) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(rows) = args.rows {
        config.seed.rows = rows;
    }

    let mut db = Database::connect(&config.database)?;
    let stats = loader::seed_tables(&mut db, &config.seed)?;

    for s in &stats {
        eprintln!(
            "{} {}: {} rows of dimension {}",
            "→".green(),
            s.table,
            s.inserted,
            s.dimension
        );
    }
    Ok(())
}

fn cmd_query(args: QueryArgs) -> Result<()> {
    let Some(query) = args.query else {
        // Mirror the usage text a bare `cinevec query` caller expects,
        // but exit 1 rather than clap's usual argument-error code.
        let mut cmd = Cli::command();
        if let Some(sub) = cmd.find_subcommand_mut("query") {
            let _ = sub.print_help();
        }
        std::process::exit(1);
    };

    let debug = config::env_flag("CINEVEC_DEBUG");
    if debug {
        eprintln!("Query: {query}");
    }

    let limit = search::parse_limit(args.limit.as_deref());
    if debug {
        eprintln!("Limit: {limit}");
    }

    let metric = Metric::parse_or_default(args.metric.as_deref());
    if debug {
        eprintln!("Distance metric: {}", metric.name());
    }

    let config = Config::load()?;
    let mut db = Database::connect(&config.database)?;
    let mut embedder = load_embedder()?;

    let request = SearchRequest {
        query,
        limit,
        metric,
        explain: config::env_flag("CINEVEC_EXPLAIN"),
    };
    let hits = search::search_movies(&mut db, &mut embedder, &config.import, &request)?;

    if hits.is_empty() {
        eprintln!(
            "{} No movies in {} yet. Run `cinevec import` first.",
            "Info:".blue(),
            config.import.movies_table
        );
    }

    if config::env_flag("CINEVEC_VERT") {
        output::print_vertical(&hits);
    } else {
        output::print_table(&hits);
    }

    Ok(())
}

fn cmd_analogy() -> Result<()> {
    let mut embedder = load_embedder()?;
    analogy::run(&mut embedder)
}

fn cmd_config() -> Result<()> {
    let config = Config::load()?;
    let path = config::config_path();

    println!("{} {}\n", "Config file:".bold(), path.display());
    println!("{}", toml::to_string_pretty(&config)?);

    if !path.exists() {
        println!(
            "\n{} No config file found. Creating default at {}",
            "Note:".yellow(),
            path.display()
        );
        config.save()?;
    }

    Ok(())
}

/// Downloads the embedding model if needed and loads it.
fn load_embedder() -> Result<Embedder> {
    let model_dir = model::ensure_model(&config::cinevec_dir())?;
    Embedder::new(&model_dir)
}
