// ClaimFlow CLI - headless claim work-queue operations

mod context;
mod exit_codes;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use claimflow_engine::analyze::analyze;
use claimflow_engine::queue::{actionable_categories, filter_and_sort, SortDirection};
use claimflow_engine::triage::{assignment_tables, suggested_queue, triage};

use context::{engine_error, load_catalog, load_records, load_run_context, write_error};
use exit_codes::EXIT_SUCCESS;
use report::{cmd_report, ReportCommands};

#[derive(Parser)]
#[command(name = "cflow")]
#[command(about = "Claim categorization, prioritization, and reporting (CLI mode, headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a catalog file without running anything
    #[command(after_help = "\
Examples:
  cflow validate book.toml")]
    Validate {
        /// Catalog TOML file
        catalog: PathBuf,
    },

    /// Analyze an uploaded claims file: classify, score, and summarize
    #[command(after_help = "\
Examples:
  cflow analyze claims.xlsx --catalog book.toml --client \"Acme Health\"
  cflow analyze claims.xlsx --catalog book.toml --client \"Acme Health\" --json
  cflow analyze claims.csv --catalog book.toml --client \"Acme Health\" --output run.json")]
    Analyze {
        /// Uploaded claims data (xlsx or csv)
        data: PathBuf,

        /// Catalog TOML file
        #[arg(long)]
        catalog: PathBuf,

        /// Client configuration name
        #[arg(long)]
        client: String,

        /// Output full JSON result to stdout instead of a summary
        #[arg(long)]
        json: bool,

        /// Write the JSON result to a file
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Print the prioritized work queue
    #[command(after_help = "\
Examples:
  cflow queue claims.xlsx --catalog book.toml --client \"Acme Health\"
  cflow queue claims.xlsx --catalog book.toml --client \"Acme Health\" --category \"W9 Needed\"
  cflow queue claims.xlsx --catalog book.toml --client \"Acme Health\" --sort age --asc")]
    Queue {
        /// Uploaded claims data (xlsx or csv)
        data: PathBuf,

        /// Catalog TOML file
        #[arg(long)]
        catalog: PathBuf,

        /// Client configuration name
        #[arg(long)]
        client: String,

        /// Only show one category
        #[arg(long)]
        category: Option<String>,

        /// Sort column (priorityScore, age, netPayment, category, ...)
        #[arg(long, default_value = "priorityScore")]
        sort: String,

        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
    },

    /// Generate report workbooks
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },

    /// Reconcile claims against a provider verification export
    #[command(after_help = "\
Examples:
  cflow triage claims.xlsx verification.xlsx --catalog book.toml --client \"Acme Health\"
  cflow triage claims.xlsx verification.xlsx --catalog book.toml --client \"Acme Health\" \\
      --output-dir ./assignments")]
    Triage {
        /// Uploaded claims data (xlsx or csv)
        data: PathBuf,

        /// Provider verification export (xlsx or csv)
        verification: PathBuf,

        /// Catalog TOML file
        #[arg(long)]
        catalog: PathBuf,

        /// Client configuration name
        #[arg(long)]
        client: String,

        /// Where to write the per-queue assignment workbooks
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { catalog } => cmd_validate(catalog),
        Commands::Analyze { data, catalog, client, json, output } => {
            cmd_analyze(data, catalog, client, json, output)
        }
        Commands::Queue { data, catalog, client, category, sort, asc } => {
            cmd_queue(data, catalog, client, category, sort, asc)
        }
        Commands::Report { command } => cmd_report(command),
        Commands::Triage { data, verification, catalog, client, output_dir } => {
            cmd_triage(data, verification, catalog, client, output_dir)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn cmd_validate(catalog_path: PathBuf) -> Result<(), CliError> {
    let catalog = load_catalog(&catalog_path)?;
    eprintln!(
        "valid: catalog '{}' with {} team(s), {} categorie(s), {} client config(s), {} rule(s)",
        catalog.name,
        catalog.teams.len(),
        catalog.categories.len(),
        catalog.configs.len(),
        catalog.edit_rules.len() + catalog.note_rules.len(),
    );
    Ok(())
}

fn cmd_analyze(
    data: PathBuf,
    catalog_path: PathBuf,
    client: String,
    json: bool,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let ctx = load_run_context(&catalog_path, &client)?;
    let records = load_records(&data)?;
    let result = analyze(&records, &ctx.mapping, &ctx.index, &ctx.client_name);

    if json || output.is_some() {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| write_error(format!("JSON serialization error: {e}")))?;
        if let Some(ref path) = output {
            std::fs::write(path, &json_str)
                .map_err(|e| write_error(format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }
        if json {
            println!("{json_str}");
        }
    }

    // Human summary to stderr
    let metrics = &result.metrics;
    let actionable = result.claims.iter().filter(|c| c.is_actionable).count();
    eprintln!(
        "{}: {} claims, {} actionable, net payment total {:.2}",
        ctx.client_name, metrics.total_claims, actionable, metrics.total_net_payment,
    );
    for (status, count) in &metrics.claims_by_status {
        eprintln!("  {status}: {count}");
    }

    let categories = actionable_categories(&result.claims);
    if !categories.is_empty() {
        eprintln!("categories: {}", categories.join(", "));
    }

    Ok(())
}

fn cmd_queue(
    data: PathBuf,
    catalog_path: PathBuf,
    client: String,
    category: Option<String>,
    sort: String,
    asc: bool,
) -> Result<(), CliError> {
    let ctx = load_run_context(&catalog_path, &client)?;
    let records = load_records(&data)?;
    let result = analyze(&records, &ctx.mapping, &ctx.index, &ctx.client_name);

    let direction = if asc { SortDirection::Asc } else { SortDirection::Desc };
    let queue = filter_and_sort(&result.claims, category.as_deref(), &sort, direction);

    println!("priority\tcategory\tsource\tteam\tclaim_id\tage\tnet_payment\tprovider");
    for claim in &queue {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{}",
            claim.priority_score,
            claim.category,
            claim.source.map(|s| s.to_string()).unwrap_or_else(|| "N/A".into()),
            claim.team_name.as_deref().unwrap_or("N/A"),
            claim.claim_id,
            claim.age,
            claim.net_payment,
            claim.provider_name,
        );
    }
    eprintln!("{} claim(s) in queue", queue.len());

    Ok(())
}

fn cmd_triage(
    data: PathBuf,
    verification: PathBuf,
    catalog_path: PathBuf,
    client: String,
    output_dir: Option<PathBuf>,
) -> Result<(), CliError> {
    let ctx = load_run_context(&catalog_path, &client)?;
    let main_records = load_records(&data)?;
    let verification_records = load_records(&verification)?;

    let outcome =
        triage(&main_records, &verification_records, &ctx.mapping, &ctx.index).map_err(engine_error)?;

    println!("claim_id\tprovider\ttax_id\ttin_has_w9\tsuggested_queue");
    for claim in &outcome.claims {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            claim.claim_id,
            claim.provider_name,
            claim.provider_tin.as_deref().unwrap_or(""),
            claim.tin_has_w9,
            suggested_queue(claim),
        );
    }

    let summary = &outcome.summary;
    eprintln!(
        "{} claim(s) to triage — {} with a W9 on file, {} without",
        summary.eligible, summary.with_w9, summary.without_w9,
    );

    if let Some(dir) = output_dir {
        std::fs::create_dir_all(&dir)
            .map_err(|e| write_error(format!("cannot create {}: {e}", dir.display())))?;
        for table in assignment_tables(&outcome) {
            let file_name = format!("{}.xlsx", table.sheet_name.replace(' ', "_"));
            let path = dir.join(file_name);
            claimflow_io::write_workbook(&path, &[table]).map_err(write_error)?;
            eprintln!("wrote {}", path.display());
        }
    }

    Ok(())
}
