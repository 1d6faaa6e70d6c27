use crate::infra::load_state;
use crate::server;
use clap::{Args, Parser, Subcommand};
use idss_sim::config::AppConfig;
use idss_sim::error::AppError;
use idss_sim::idss::{DocumentPaths, IdssReport, OperatorSize, ScoringContext};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "IDSS Simulator",
    about = "Score, reconcile and serve IDSS performance data",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the scored index for one reference year
    Report(ReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Reference year to score (defaults to APP_REFERENCE_YEAR)
    #[arg(long)]
    year: Option<i32>,
    /// Operator size: pequeno, medio or grande
    #[arg(long)]
    operator_size: Option<OperatorSize>,
    /// Operational document to load instead of APP_OPERATIONAL_DATA
    #[arg(long)]
    operational: Option<PathBuf>,
    /// Historical archive to load instead of APP_HISTORICAL_DATA
    #[arg(long)]
    historical: Option<PathBuf>,
    /// Include one line per indicator
    #[arg(long)]
    indicators: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Report(args) => run_report(args).await,
    }
}

async fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let paths = DocumentPaths {
        operational: args.operational.unwrap_or(config.data.operational_path),
        historical: args.historical.unwrap_or(config.data.historical_path),
    };
    let context = ScoringContext {
        reference_year: args.year.unwrap_or(config.scoring.reference_year),
        operator_size: args.operator_size.unwrap_or(config.scoring.operator_size),
    };

    let state = load_state(&paths, context).await?;
    let report = IdssReport::from_tree(&state.tree, state.context);
    print!("{}", report.render_text(args.indicators));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["idss-sim-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn report_accepts_size_and_year() {
        let cli = Cli::try_parse_from([
            "idss-sim-api",
            "report",
            "--year",
            "2023",
            "--operator-size",
            "medio",
            "--indicators",
        ])
        .expect("parses");
        let Some(Command::Report(args)) = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(args.year, Some(2023));
        assert_eq!(args.operator_size, Some(OperatorSize::Medio));
        assert!(args.indicators);
    }

    #[test]
    fn report_rejects_unknown_size() {
        let err = Cli::try_parse_from(["idss-sim-api", "report", "--operator-size", "huge"])
            .expect_err("size rejected");
        assert!(err.to_string().contains("unknown operator size 'huge'"));
    }
}
