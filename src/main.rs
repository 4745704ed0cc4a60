//! Match event-log analysis CLI
//!
//! Cleans possession logs, splits passes per team and segments matches into
//! score states.

use clap::{Parser, Subcommand};
use matchlog::{Config, Result};

#[derive(Parser)]
#[command(name = "matchlog")]
#[command(about = "Possession cleaning and score-state analysis for football event logs", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "matchlog.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init,
    /// Event-log cleaning commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Match-level analysis commands
    Match {
        #[command(subcommand)]
        action: MatchCommands,
    },
    /// Pass network commands
    Network {
        #[command(subcommand)]
        action: NetworkCommands,
    },
}

#[derive(Subcommand)]
enum DataCommands {
    /// Clean an event log and write per-team pass tables
    Clean {
        /// Event log (defaults to input.file)
        #[arg(long)]
        input: Option<String>,
    },
    /// Compare the players of two logs of the same match
    Compare {
        /// Base log (defaults to compare.base_file)
        #[arg(long)]
        base: Option<String>,
        /// Current log (defaults to input.file)
        #[arg(long)]
        input: Option<String>,
    },
    /// Generate or refresh the team-player mapping file
    Mapping {
        #[arg(long)]
        input: Option<String>,
    },
}

#[derive(Subcommand)]
enum MatchCommands {
    /// Combine a team's pass tables across matches
    Summary {
        #[arg(long)]
        team: Option<String>,
        #[arg(long)]
        input_dir: Option<String>,
        #[arg(long)]
        output_dir: Option<String>,
    },
    /// Split a match into score states and write one table per state
    State {
        #[arg(long)]
        input: Option<String>,
    },
}

#[derive(Subcommand)]
enum NetworkCommands {
    /// Compute pass network metrics
    Metrics {
        /// Pass table or directory of pass tables
        #[arg(long)]
        input: Option<String>,
        /// JSON report path
        #[arg(long)]
        output: Option<String>,
        /// Metric to compute (repeatable; all when omitted)
        #[arg(long)]
        metric: Vec<String>,
        #[arg(long)]
        team: Option<String>,
    },
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
        Commands::Init => commands::init(&cli.config),
        Commands::Data { action } => match action {
            DataCommands::Clean { input } => commands::data_clean(&config, input),
            DataCommands::Compare { base, input } => commands::data_compare(&config, base, input),
            DataCommands::Mapping { input } => commands::data_mapping(&config, input),
        },
        Commands::Match { action } => match action {
            MatchCommands::Summary {
                team,
                input_dir,
                output_dir,
            } => commands::match_summary(&config, team, input_dir, output_dir),
            MatchCommands::State { input } => commands::match_state(&config, input),
        },
        Commands::Network { action } => match action {
            NetworkCommands::Metrics {
                input,
                output,
                metric,
                team,
            } => commands::network_metrics(&config, input, output, metric, team),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use matchlog::data::output::{cleaned_table, state_tables, team_tables, write_file_atomic};
    use matchlog::data::summary::{combine_matches, read_pass_sequence};
    use matchlog::data::{resolve_team_mapping, write_outputs, EventSheet, ResolvedMapping};
    use matchlog::features::network::select_metrics;
    use matchlog::features::{
        calculate_network_metrics, clean_log, compare_players, extract_possession_phases,
        generate_auto_mapping, segment_match, split_by_team, AutoMapping, PossessionPhase,
        TeamNames,
    };
    use matchlog::MatchLogError;
    use std::path::Path;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("input")?;
        std::fs::create_dir_all("mapping")?;
        println!("Created input/ and mapping/ directories");

        println!("\nNext steps:");
        println!("  1. Put an event log at {}", config.input.file);
        println!("  2. Run 'matchlog data clean' to build the team mapping and pass tables");
        println!("  3. Edit {} if players are misassigned, then clean again", config.mapping.path);
        println!("  4. Run 'matchlog match state' to split the match into score states");

        Ok(())
    }

    fn phases_of(sheet: &EventSheet, config: &Config) -> Result<Vec<PossessionPhase>> {
        let rows = sheet.filtered_log(&config.input.useful_text, config.input.seed_leading_possession)?;
        let phases = extract_possession_phases(&rows);
        log::info!("{} possession phases in {}", phases.len(), sheet.path.display());
        Ok(phases)
    }

    fn auto_mapping_of(path: &str, config: &Config) -> Result<AutoMapping> {
        let sheet = EventSheet::open(path)?;
        Ok(generate_auto_mapping(&phases_of(&sheet, config)?))
    }

    fn compare(config: &Config, base: &str, input: &str) -> Result<()> {
        if Path::new(base) == Path::new(input) {
            println!("Base and current log are the same file, nothing to compare");
            return Ok(());
        }
        let diff = compare_players(&auto_mapping_of(base, config)?, &auto_mapping_of(input, config)?);
        println!("{}", diff);
        Ok(())
    }

    fn print_mapping(resolved: &ResolvedMapping) {
        println!("Team mapping");
        println!("───────────────────────────────");
        for (team, players) in resolved.mapping.iter() {
            println!("  {:<16} {} players", team, players.len());
        }
    }

    pub fn data_clean(config: &Config, input: Option<String>) -> Result<()> {
        let input = input.unwrap_or_else(|| config.input.file.clone());

        if config.compare.enable {
            match &config.compare.base_file {
                Some(base) => compare(config, base, &input)?,
                None => log::warn!("compare.enable is set but compare.base_file is missing"),
            }
        }

        let sheet = EventSheet::open(&input)?;
        let rows = sheet.filtered_log(&config.input.useful_text, config.input.seed_leading_possession)?;
        let phases = extract_possession_phases(&rows);
        let resolved = resolve_team_mapping(&config.mapping, &phases)?;

        let cleaned = clean_log(&rows, &phases, &resolved.player_team);
        let teams = split_by_team(&cleaned.rows)?;

        let stem = sheet.stem();
        let mut files = vec![cleaned_table(
            &cleaned.rows,
            Path::new(&config.output.output_dir),
            &stem,
        )?];
        files.extend(team_tables(
            &teams,
            Path::new(&config.output.cut_dir),
            &stem,
        )?);

        resolved.persist()?;
        write_outputs(&files)?;

        let report = cleaned.report;
        println!("Cleaned {}", input);
        println!("───────────────────────────────");
        println!(
            "  Rows:      {} -> {} valid -> {} merged",
            report.input_rows, report.kept_rows, report.merged_rows
        );
        println!(
            "  Phases:    {} kept, {} dropped",
            report.kept_phases, report.dropped_phases
        );
        for (team, passes) in &teams {
            println!("  {:<10} {} passes", team, passes.len());
        }
        for file in &files {
            println!("  Wrote {}", file.path.display());
        }

        Ok(())
    }

    pub fn data_compare(config: &Config, base: Option<String>, input: Option<String>) -> Result<()> {
        let base = base.or_else(|| config.compare.base_file.clone()).ok_or_else(|| {
            MatchLogError::Config("no base log given and compare.base_file is not set".to_string())
        })?;
        let input = input.unwrap_or_else(|| config.input.file.clone());
        compare(config, &base, &input)
    }

    pub fn data_mapping(config: &Config, input: Option<String>) -> Result<()> {
        let input = input.unwrap_or_else(|| config.input.file.clone());
        let sheet = EventSheet::open(&input)?;
        let resolved = resolve_team_mapping(&config.mapping, &phases_of(&sheet, config)?)?;

        resolved.persist()?;
        print_mapping(&resolved);
        if !resolved.is_pending() {
            println!("\nKept existing {} (set mapping.overwrite_auto to regenerate)", config.mapping.path);
        }
        Ok(())
    }

    pub fn match_summary(
        config: &Config,
        team: Option<String>,
        input_dir: Option<String>,
        output_dir: Option<String>,
    ) -> Result<()> {
        let team = team.unwrap_or_else(|| config.summary.team_name.clone());
        let input_dir = input_dir.unwrap_or_else(|| config.summary.input_dir.clone());
        let output_dir = output_dir.unwrap_or_else(|| config.summary.output_dir.clone());

        let files = combine_matches(Path::new(&input_dir), Path::new(&output_dir), &team)?;
        write_outputs(&files)?;
        for file in &files {
            println!("Wrote {}", file.path.display());
        }
        Ok(())
    }

    pub fn match_state(config: &Config, input: Option<String>) -> Result<()> {
        let input = input.unwrap_or_else(|| config.input.file.clone());
        let sheet = EventSheet::open(&input)?;
        let resolved = resolve_team_mapping(&config.mapping, &phases_of(&sheet, config)?)?;
        let names = TeamNames::new(resolved.mapping.teams(), &config.state.team_corrections);

        let timeline = segment_match(&sheet.full_log()?, &names, &config.state.period_labels)?;
        let files = state_tables(&sheet, &timeline, Path::new(&config.state.output_dir))?;

        resolved.persist()?;
        write_outputs(&files)?;

        println!("{} vs {}", timeline.teams[0], timeline.teams[1]);
        println!("───────────────────────────────");
        for goal in &timeline.goals {
            println!("  Goal at row {:<5} {}", goal.idx, goal.team);
        }
        for segment in &timeline.segments {
            println!(
                "  {:>5}..{:<5} {:<20} {}",
                segment.start_idx,
                segment.end_idx,
                segment.label(),
                segment.render_score(&timeline.teams)
            );
        }
        println!("\nWrote {} state tables to {}", files.len(), config.state.output_dir);
        Ok(())
    }

    pub fn network_metrics(
        config: &Config,
        input: Option<String>,
        output: Option<String>,
        metric: Vec<String>,
        team: Option<String>,
    ) -> Result<()> {
        let input = input.unwrap_or_else(|| config.network.input_path.clone());
        let output = output.unwrap_or_else(|| config.network.output_path.clone());
        let team = team.unwrap_or_else(|| config.network.team_name.clone());
        let requested = if metric.is_empty() {
            config.network.target_metrics.clone()
        } else {
            Some(metric)
        };

        let metrics = select_metrics(requested.as_deref())?;
        let sequence = read_pass_sequence(Path::new(&input))?;
        let report = calculate_network_metrics(&sequence, &metrics, &team, &input)?;

        let json = serde_json::to_string_pretty(&report)?;
        write_file_atomic(Path::new(&output), json.as_bytes())?;

        println!("{} metrics for {} ({} passes)", report.metrics.len(), team, sequence.len());
        println!("Saved to {}", output);
        Ok(())
    }
}
