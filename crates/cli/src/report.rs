//! `cflow report` — workbook generation for teams and specialty queues.

use std::path::PathBuf;

use clap::Subcommand;

use claimflow_engine::analyze::analyze;
use claimflow_engine::report::{l1_monitor_table, team_names, team_report_tables};

use crate::context::{engine_error, load_records, load_run_context, write_error};
use crate::exit_codes::EXIT_USAGE;
use crate::CliError;

#[derive(Subcommand)]
pub enum ReportCommands {
    /// Export one team's work queue as a multi-sheet workbook
    #[command(after_help = "\
Examples:
  cflow report team claims.xlsx --catalog book.toml --client \"Acme Health\" \\
      --team \"Provider Operations\" --output prov_ops.xlsx")]
    Team {
        /// Uploaded claims data (xlsx or csv)
        data: PathBuf,

        /// Catalog TOML file
        #[arg(long)]
        catalog: PathBuf,

        /// Client configuration name
        #[arg(long)]
        client: String,

        /// Team to export; omit to list teams with actionable claims
        #[arg(long)]
        team: Option<String>,

        /// Output workbook path
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Export the L1 monitor specialty report
    #[command(after_help = "\
Examples:
  cflow report l1-monitor claims.xlsx --catalog book.toml --client \"Acme Health\" \\
      --output l1_monitor.xlsx")]
    L1Monitor {
        /// Uploaded claims data (xlsx or csv)
        data: PathBuf,

        /// Catalog TOML file
        #[arg(long)]
        catalog: PathBuf,

        /// Client configuration name
        #[arg(long)]
        client: String,

        /// Output workbook path
        #[arg(long, short = 'o')]
        output: PathBuf,
    },
}

pub fn cmd_report(cmd: ReportCommands) -> Result<(), CliError> {
    match cmd {
        ReportCommands::Team { data, catalog, client, team, output } => {
            cmd_report_team(data, catalog, client, team, output)
        }
        ReportCommands::L1Monitor { data, catalog, client, output } => {
            cmd_report_l1_monitor(data, catalog, client, output)
        }
    }
}

fn cmd_report_team(
    data: PathBuf,
    catalog_path: PathBuf,
    client: String,
    team: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), CliError> {
    let ctx = load_run_context(&catalog_path, &client)?;
    let records = load_records(&data)?;
    let result = analyze(&records, &ctx.mapping, &ctx.index, &ctx.client_name);

    let Some(team) = team else {
        // Listing mode: show which teams have anything to export
        let teams = team_names(&result.claims);
        if teams.is_empty() {
            eprintln!("no actionable claims found for any team");
        } else {
            for name in teams {
                println!("{name}");
            }
        }
        return Ok(());
    };

    let tables = team_report_tables(&team, &result.claims, &ctx.catalog).map_err(engine_error)?;
    if tables.is_empty() {
        return Err(CliError {
            code: EXIT_USAGE,
            message: format!("no claims for team: {team}"),
            hint: Some("run without --team to list teams with actionable claims".into()),
        });
    }

    let output = output.unwrap_or_else(|| default_report_path(&ctx.client_name, &team));
    claimflow_io::write_workbook(&output, &tables).map_err(write_error)?;
    eprintln!(
        "wrote {} ({} sheet(s), {} claim(s))",
        output.display(),
        tables.len(),
        tables.iter().map(|t| t.rows.len()).sum::<usize>(),
    );
    Ok(())
}

fn cmd_report_l1_monitor(
    data: PathBuf,
    catalog_path: PathBuf,
    client: String,
    output: PathBuf,
) -> Result<(), CliError> {
    let ctx = load_run_context(&catalog_path, &client)?;
    let records = load_records(&data)?;
    let result = analyze(&records, &ctx.mapping, &ctx.index, &ctx.client_name);

    let table = l1_monitor_table(&result.claims, &ctx.mapping);
    if table.rows.is_empty() {
        eprintln!("no claims flagged for the L1 monitor queue");
        return Ok(());
    }

    let count = table.rows.len();
    claimflow_io::write_workbook(&output, &[table]).map_err(write_error)?;
    eprintln!("wrote {} ({count} item(s))", output.display());
    Ok(())
}

/// `<Client>_<Team>_Report.xlsx` with spaces flattened, next to the data.
fn default_report_path(client_name: &str, team: &str) -> PathBuf {
    let client = client_name.trim().replace(' ', "_");
    let client = if client.is_empty() { "Client".to_string() } else { client };
    let team = team.replace(' ', "_");
    PathBuf::from(format!("{client}_{team}_Report.xlsx"))
}
