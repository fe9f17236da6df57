//! Football feature engineering CLI
//!
//! Import match results, build leakage-free training features and featurize
//! upcoming fixtures.

use clap::{Parser, Subcommand};
use football::{Config, Result};

#[derive(Parser)]
#[command(name = "football")]
#[command(
    about = "Point-in-time Elo and form features for football match prediction",
    long_about = None
)]
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
    /// Feature table and live vector commands
    Features {
        #[command(subcommand)]
        action: FeatureCommands,
    },
    /// Show the Elo table
    Ratings {
        /// Only show the top N teams
        #[arg(long)]
        top: Option<usize>,
        /// Only count matches before this date (YYYY-MM-DD)
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Show the canonical form of a team name
    Normalize {
        /// Raw team name
        name: String,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Import football-data.co.uk season CSV files
    Import {
        /// CSV files to import
        #[arg(required = true)]
        files: Vec<String>,
        /// Season tag (inferred from the file or its directory when it looks like 2425)
        #[arg(long)]
        season: Option<String>,
    },
    /// Show database status
    Status,
}

#[derive(Subcommand)]
enum FeatureCommands {
    /// Fit the team encoder and build the historical feature table
    Build {
        /// Output CSV path (defaults to data.table_path)
        #[arg(long)]
        output: Option<String>,
    },
    /// Feature vector for an upcoming fixture
    Vector {
        /// Home team name
        home: String,
        /// Away team name
        away: String,
        /// Compute features as of this date (YYYY-MM-DD), default today
        #[arg(long)]
        as_of: Option<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
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
            DataCommands::Import { files, season } => {
                commands::data_import(&config, &files, season.as_deref())
            }
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Features { action } => match action {
            FeatureCommands::Build { output } => commands::features_build(&config, output),
            FeatureCommands::Vector {
                home,
                away,
                as_of,
                format,
            } => commands::features_vector(&config, &home, &away, as_of.as_deref(), format),
        },
        Commands::Ratings { top, as_of } => commands::ratings(&config, top, as_of.as_deref()),
        Commands::Normalize { name } => commands::normalize(&config, &name),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use chrono::NaiveDate;
    use football::data::{import_csv, Database, FeatureTableBuilder, TeamNameNormalizer};
    use football::features::{EloRatings, TeamEncoder, FEATURE_COLUMNS};
    use football::predict::{format_features, LiveFeatureBuilder};
    use football::FootballError;

    /// Parse an `--as-of` argument, defaulting to today
    fn as_of_date(arg: Option<&str>) -> Result<NaiveDate> {
        match arg {
            Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                FootballError::Parse(format!("Invalid date '{}', expected YYYY-MM-DD", s))
            }),
            None => Ok(chrono::Local::now().date_naive()),
        }
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        // Create data directory
        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'football data import E0_*.csv' to load results");
        println!("  3. Run 'football features build' to build the training table");
        println!(
            "  4. Run 'football features vector \"Team A\" \"Team B\"' for an upcoming fixture"
        );

        Ok(())
    }

    pub fn data_import(config: &Config, files: &[String], season: Option<&str>) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let normalizer = TeamNameNormalizer::from_config(config)?;

        let mut total = 0;
        let mut inserted = 0;
        let mut errors = 0;
        for file in files {
            let result = import_csv(&db, std::path::Path::new(file), &normalizer, season)?;
            println!(
                "  {}: {} rows, {} stored, {} errors",
                file, result.total_records, result.inserted, result.errors
            );
            total += result.total_records;
            inserted += result.inserted;
            errors += result.errors;
        }

        println!(
            "\nImported {} files: {} rows, {} stored, {} errors",
            files.len(),
            total,
            inserted,
            errors
        );
        if normalizer.fallback_count() > 0 {
            println!(
                "Warning: {} team names were not in the alias table and were kept as-is",
                normalizer.fallback_count()
            );
        }

        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:     {}", config.data.database_path);
        println!("  Teams:    {}", stats.team_count);
        println!("  Matches:  {}", stats.match_count);
        println!("  Played:   {}", stats.played_count);
        if let Some(earliest) = stats.earliest_match {
            println!("  First:    {}", earliest);
        }
        if let Some(latest) = stats.latest_result {
            println!("  Latest:   {}", latest);
        }

        Ok(())
    }

    pub fn features_build(config: &Config, output: Option<String>) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let matches = db.get_all_matches()?;
        println!("Loaded {} matches", matches.len());

        if matches.is_empty() {
            println!("No matches found. Run 'football data import' first.");
            return Ok(());
        }

        let encoder = TeamEncoder::fit(&matches);
        encoder.save(&config.data.encoder_path)?;
        println!("Saved team encoder ({} teams) to {}", encoder.len(), config.data.encoder_path);

        let builder = FeatureTableBuilder::new(config.features, config.elo, &encoder);
        let table = builder.build(&matches);

        let output = output.unwrap_or_else(|| config.data.table_path.clone());
        table.save(&output)?;

        println!("\nFeature Table");
        println!("───────────────────────────────");
        println!("  Rows:     {}", table.len());
        println!("  Played:   {}", table.played().count());
        println!("  Skipped:  {}", table.skipped);
        println!("  Columns:  {}", FEATURE_COLUMNS.len());
        println!("  Window:   {} matches", config.features.form_window);
        println!("  Output:   {}", output);

        Ok(())
    }

    pub fn features_vector(
        config: &Config,
        home: &str,
        away: &str,
        as_of: Option<&str>,
        format: OutputFormat,
    ) -> Result<()> {
        let as_of = as_of_date(as_of)?;
        let encoder = TeamEncoder::load(&config.data.encoder_path)?;
        let db = Database::open(&config.data.database_path)?;
        let history = db.get_matches_before(as_of)?;

        let builder = LiveFeatureBuilder::from_config(config, encoder)?;
        let live = builder.build(home, away, &history, as_of)?;

        match format {
            OutputFormat::Table => {
                print!("{}", format_features(&live));
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "home": live.home_team,
                    "away": live.away_team,
                    "as_of": live.as_of.to_string(),
                    "features": live.features,
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
            OutputFormat::Csv => {
                println!("home,away,as_of,{}", FEATURE_COLUMNS.join(","));
                let values: Vec<String> =
                    live.features.to_vec().iter().map(|v| v.to_string()).collect();
                println!(
                    "{},{},{},{}",
                    live.home_team,
                    live.away_team,
                    live.as_of,
                    values.join(",")
                );
            }
        }

        Ok(())
    }

    pub fn ratings(config: &Config, top: Option<usize>, as_of: Option<&str>) -> Result<()> {
        let as_of = as_of_date(as_of)?;
        let db = Database::open(&config.data.database_path)?;
        let history = db.get_matches_before(as_of)?;

        let elo = EloRatings::replay(&history, as_of, config.elo);
        let table = elo.ratings();
        let shown = top.unwrap_or(table.len()).min(table.len());

        println!("Elo Ratings (before {})", as_of);
        println!("───────────────────────────────");
        for (rank, (team, rating)) in table.iter().take(shown).enumerate() {
            println!("  {:>2}. {:<20} {:>7.1}", rank + 1, team, rating);
        }
        if table.is_empty() {
            println!("  No played matches before {}", as_of);
        }

        Ok(())
    }

    pub fn normalize(config: &Config, name: &str) -> Result<()> {
        let normalizer = TeamNameNormalizer::from_config(config)?;
        let canonical = normalizer.normalize(name);
        if normalizer.fallback_count() > 0 {
            println!("{} (not in alias table)", canonical);
        } else {
            println!("{}", canonical);
        }
        Ok(())
    }
}
