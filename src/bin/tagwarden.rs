//! Tagwarden CLI: analyze, plan and consolidate a SQLite-backed tag store.
//!
//! Usage:
//!   tagwarden analyze [--json path] [--show-plan]
//!   tagwarden plan --out path
//!   tagwarden apply [--plan path] [--dry-run] [--backup-dir dir]
//!   tagwarden normalize [--lookback minutes] [--dry-run]
//!   tagwarden backup [--dir dir]
//!   tagwarden import <items.json>

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use tagwarden::logging::{init_subscriber, Verbosity};
use tagwarden::normalize::DEFAULT_LOOKBACK_MINUTES;
use tagwarden::report::{render_analysis, render_execution, render_normalize, render_plan};
use tagwarden::pipeline::backup;
use tagwarden::storage::artifacts::{load_plan, read_json, save_plan, write_json};
use tagwarden::{
    analyze, execute, normalize_recent, Config, ExecutionMode, ExecutorOptions, NormalizeOptions,
    OpenStore, RecentItem, SqliteTagStore, TagStore,
};

#[derive(Parser)]
#[command(
    name = "tagwarden",
    version,
    about = "Tag consolidation and normalization for bookmark tag stores"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Extra junk terms, one per line
    #[arg(long, global = true)]
    blocklist: Option<PathBuf>,

    /// Per-operation detail
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored log output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every tag and summarize what a consolidation would do
    Analyze {
        /// Also write the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
        /// List the planned operations
        #[arg(long)]
        show_plan: bool,
    },
    /// Compute a consolidation plan and save it for review
    Plan {
        /// Where to write the plan document
        #[arg(long, short)]
        out: PathBuf,
    },
    /// Execute a consolidation plan
    Apply {
        /// Saved plan document; analyzes the store afresh when omitted
        #[arg(long)]
        plan: Option<PathBuf>,
        /// Report what would happen without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Directory for the pre-run backup
        #[arg(long)]
        backup_dir: Option<PathBuf>,
        /// Also write the execution report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Normalize the tags of recently updated items
    Normalize {
        /// Lookback window in minutes
        #[arg(long, default_value_t = DEFAULT_LOOKBACK_MINUTES)]
        lookback: i64,
        /// Report what would happen without writing anything
        #[arg(long)]
        dry_run: bool,
        /// Directory for the pre-run backup
        #[arg(long)]
        backup_dir: Option<PathBuf>,
    },
    /// Write a snapshot of every tag
    Backup {
        /// Backup directory
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Load items (a JSON array of records) into the store
    Import {
        /// JSON file to import
        file: PathBuf,
    },
}

/// Get the tagwarden data directory (~/.local/share/tagwarden)
fn data_dir() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    let dir = data_dir.join("tagwarden");
    std::fs::create_dir_all(&dir).ok();
    dir
}

fn default_db_path() -> PathBuf {
    data_dir().join("tagwarden.db")
}

fn default_backup_dir() -> PathBuf {
    data_dir().join("backups")
}

fn open_store(db: Option<PathBuf>) -> Result<SqliteTagStore, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    SqliteTagStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))
}

fn load_config(path: Option<&Path>, blocklist: Option<&Path>) -> Result<Config, String> {
    let config = match path {
        Some(path) => Config::load(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };
    let config = match blocklist {
        Some(path) => config.with_blocklist_file(path).map_err(|e| e.to_string())?,
        None => config,
    };
    let config = config.with_env_overrides();
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

fn mode(dry_run: bool) -> ExecutionMode {
    if dry_run {
        ExecutionMode::DryRun
    } else {
        ExecutionMode::Apply
    }
}

fn cmd_analyze(store: &dyn TagStore, config: &Config, json: Option<&Path>, show_plan: bool) -> i32 {
    let analysis = match analyze(store, config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let report = analysis.report(config);
    print!("{}", render_analysis(&report));
    if show_plan {
        println!();
        print!("{}", render_plan(&analysis.plan));
    }
    if let Some(path) = json {
        if let Err(e) = write_json(path, &report) {
            eprintln!("Error: {}", e);
            return 1;
        }
        println!("\nReport written to {}", path.display());
    }
    0
}

fn cmd_plan(store: &dyn TagStore, config: &Config, out: &Path) -> i32 {
    let analysis = match analyze(store, config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    let document = analysis.document(config);
    if let Err(e) = save_plan(out, &document) {
        eprintln!("Error: {}", e);
        return 1;
    }
    print!("{}", render_plan(&document.plan));
    println!(
        "\nSaved plan {} ({} operations) to {}",
        document.plan_id,
        document.plan.len(),
        out.display()
    );
    0
}

fn cmd_apply(
    store: &dyn TagStore,
    config: &Config,
    plan: Option<&Path>,
    dry_run: bool,
    backup_dir: Option<PathBuf>,
    report_path: Option<&Path>,
) -> i32 {
    let (plan, threshold) = match plan {
        Some(path) => match load_plan(path) {
            Ok(doc) => {
                tracing::info!(plan_id = %doc.plan_id, generated_at = %doc.generated_at, "loaded plan");
                (doc.plan, doc.low_usage_threshold)
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
        None => match analyze(store, config) {
            Ok(analysis) => (analysis.plan, config.low_usage_threshold),
            Err(e) => {
                eprintln!("Error: {}", e);
                return 1;
            }
        },
    };

    let options = ExecutorOptions::default()
        .with_mode(mode(dry_run))
        .with_low_usage_threshold(threshold)
        .with_backup_dir(backup_dir.unwrap_or_else(default_backup_dir));

    let report = match execute(store, &plan, options) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    print!("{}", render_execution(&report));

    if let Some(path) = report_path {
        if let Err(e) = write_json(path, &report) {
            eprintln!("Error: {}", e);
            return 1;
        }
    }
    if report.is_aborted() {
        1
    } else {
        0
    }
}

fn cmd_normalize(
    store: &dyn TagStore,
    config: &Config,
    lookback: i64,
    dry_run: bool,
    backup_dir: Option<PathBuf>,
) -> i32 {
    let options = NormalizeOptions::default()
        .with_mode(mode(dry_run))
        .with_lookback_minutes(lookback)
        .with_backup_dir(backup_dir.unwrap_or_else(default_backup_dir));

    match normalize_recent(store, config, &options) {
        Ok(stats) => {
            print!("{}", render_normalize(&stats));
            if stats.aborted.is_some() {
                1
            } else {
                0
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_backup(store: &dyn TagStore, dir: Option<PathBuf>) -> i32 {
    let dir = dir.unwrap_or_else(default_backup_dir);
    match backup(store, &dir) {
        Ok((path, count)) => {
            println!("Backed up {} tags to {}", count, path.display());
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn cmd_import(store: &SqliteTagStore, file: &Path) -> i32 {
    let items: Vec<RecentItem> = match read_json(file) {
        Ok(items) => items,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };
    for item in &items {
        if let Err(e) = store.upsert_item(item) {
            eprintln!("Error: item {}: {}", item.item_id, e);
            return 1;
        }
    }
    println!("Imported {} items from {}", items.len(), file.display());
    0
}

fn main() {
    let cli = Cli::parse();
    init_subscriber(Verbosity::from_flags(cli.verbose, cli.quiet), cli.no_color);

    let config = match load_config(cli.config.as_deref(), cli.blocklist.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let store = match open_store(cli.db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Analyze { json, show_plan } => {
            cmd_analyze(&store, &config, json.as_deref(), show_plan)
        }
        Commands::Plan { out } => cmd_plan(&store, &config, &out),
        Commands::Apply {
            plan,
            dry_run,
            backup_dir,
            report,
        } => cmd_apply(
            &store,
            &config,
            plan.as_deref(),
            dry_run,
            backup_dir,
            report.as_deref(),
        ),
        Commands::Normalize {
            lookback,
            dry_run,
            backup_dir,
        } => cmd_normalize(&store, &config, lookback, dry_run, backup_dir),
        Commands::Backup { dir } => cmd_backup(&store, dir),
        Commands::Import { file } => cmd_import(&store, &file),
    };
    std::process::exit(code);
}
