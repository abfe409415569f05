//! F1 standings prediction CLI
//!
//! Predicts each driver's championship position and points after the next round.

use clap::{Parser, Subcommand};
use f1cast::model::ModelKind;
use f1cast::{Config, Result};

#[derive(Parser)]
#[command(name = "f1cast")]
#[command(about = "F1 championship standings prediction", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Train the position and points models and report test error
    Train {
        /// Model family (linear_ensemble or gradient_boosted)
        #[arg(long)]
        model: Option<ModelKind>,
        /// Season to train on (defaults to the latest stored)
        #[arg(long)]
        season: Option<String>,
    },
    /// Train, predict the next round and store the predictions
    Predict {
        /// Model family (linear_ensemble or gradient_boosted)
        #[arg(long)]
        model: Option<ModelKind>,
        /// Season to use (defaults to the latest stored)
        #[arg(long)]
        season: Option<String>,
        /// Only predict this driver number
        #[arg(long)]
        driver: Option<u32>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Show stored predictions
    Predictions {
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Import standings from a JSON array of records
    Import {
        /// Path to the JSON file
        file: String,
    },
    /// Parse cached Jolpica/Ergast driver standings responses
    ParseCache {
        /// Directory containing cached JSON responses
        dir: String,
    },
    /// Show database status
    Status,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Import { file } => commands::data_import(&config, &file),
            DataCommands::ParseCache { dir } => commands::parse_cache(&config, &dir),
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Train { model, season } => commands::train(&config, model, season),
        Commands::Predict {
            model,
            season,
            driver,
            format,
        } => commands::predict(&config, model, season, driver, format),
        Commands::Predictions { format } => commands::predictions(&config, format),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use f1cast::data::{ergast, Database};
    use f1cast::predict::{format_predictions, Predictor};
    use f1cast::training::{Metrics, TrainedModelPair, Trainer};
    use f1cast::{DriverNumber, F1Error, Prediction, StandingRecord};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'f1cast data parse-cache <dir>' to load cached standings");
        println!("  3. Run 'f1cast train' to evaluate the models");
        println!("  4. Run 'f1cast predict' to predict the next round");

        Ok(())
    }

    pub fn data_import(config: &Config, file: &str) -> Result<()> {
        let json = std::fs::read_to_string(file)?;
        let records: Vec<StandingRecord> = serde_json::from_str(&json)?;
        println!("Read {} standings from {}", records.len(), file);

        let mut db = Database::open(&config.data.database_path)?;
        let count = db.upsert_standings(&records)?;
        println!("Stored {} standings in database", count);
        Ok(())
    }

    pub fn parse_cache(config: &Config, dir: &str) -> Result<()> {
        println!("Parsing cached standings from {}...", dir);
        let records = ergast::parse_cache_dir(dir)?;
        println!("Found {} standings", records.len());

        if records.is_empty() {
            println!("No standings found. Check the cache directory.");
            return Ok(());
        }

        let mut db = Database::open(&config.data.database_path)?;
        let count = db.upsert_standings(&records)?;
        println!("Stored {} standings in database", count);
        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:         {}", config.data.database_path);
        println!("  Standings:    {}", stats.standing_count);
        println!("  Drivers:      {}", stats.driver_count);
        println!("  Predictions:  {}", stats.prediction_count);
        if let (Some(season), Some(round)) = (&stats.latest_season, stats.latest_round) {
            println!("  Latest:       {} round {}", season, round);
        }

        Ok(())
    }

    /// Season standings to work with, or an error telling the user to load data
    fn load_standings(db: &Database, season: Option<String>) -> Result<(String, Vec<StandingRecord>)> {
        let season = match season {
            Some(s) => s,
            None => db.latest_season()?.ok_or_else(|| {
                F1Error::Config(
                    "No standings in database. Run 'f1cast data parse-cache' first.".to_string(),
                )
            })?,
        };

        let records = db.get_season_standings(&season)?;
        if records.is_empty() {
            return Err(F1Error::Config(format!("No standings stored for season {}", season)));
        }
        Ok((season, records))
    }

    fn fit(
        config: &Config,
        records: &[StandingRecord],
        model: Option<ModelKind>,
    ) -> Result<(TrainedModelPair, Metrics)> {
        let kind = model.unwrap_or(config.training.model);
        Trainer::new(config.clone()).train(records, kind)
    }

    pub fn train(config: &Config, model: Option<ModelKind>, season: Option<String>) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let (season, records) = load_standings(&db, season)?;
        println!("Training on season {} ({} standings)...", season, records.len());

        let (pair, metrics) = fit(config, &records, model)?;

        println!("\n=== {} ===", pair.kind());
        println!("  Training samples: {}", metrics.training_samples);
        println!("  Test samples:     {}", metrics.test_samples);
        println!("  Position MAE:     {:.2} positions", metrics.position_mae);
        println!("  Points MAE:       {:.2} points", metrics.points_mae);

        let top = pair.top_features(10);
        if !top.is_empty() {
            println!("\nTop features:");
            for (name, importance) in top {
                println!("  {:<32} {:.3}", name, importance);
            }
        }

        Ok(())
    }

    pub fn predict(
        config: &Config,
        model: Option<ModelKind>,
        season: Option<String>,
        driver: Option<u32>,
        format: OutputFormat,
    ) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let (season, records) = load_standings(&db, season)?;

        let (pair, metrics) = fit(config, &records, model)?;
        log::info!("Model ready: {}", metrics);

        let drivers = match driver {
            Some(n) => vec![DriverNumber(n)],
            None => db.driver_numbers(&season)?,
        };

        let predictor = Predictor::new(config);
        let (predictions, report) = predictor.run(&pair, &records, &drivers);

        let stored = db.store_predictions(&predictions);

        print_predictions(&predictions, &format)?;
        println!(
            "Generated {} of {} predictions, stored {}",
            report.succeeded, report.attempted, stored
        );

        Ok(())
    }

    pub fn predictions(config: &Config, format: OutputFormat) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let predictions = db.get_predictions()?;

        if predictions.is_empty() {
            println!("No predictions stored. Run 'f1cast predict' first.");
            return Ok(());
        }

        print_predictions(&predictions, &format)
    }

    fn print_predictions(predictions: &[Prediction], format: &OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Table => print!("{}", format_predictions(predictions)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(predictions)?),
        }
        Ok(())
    }
}
