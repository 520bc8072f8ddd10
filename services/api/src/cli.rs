use crate::demo::{run_demo, DemoArgs};
use crate::listings::{run_listing_export, run_trash_report, ExportArgs, TrashReportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use shopspace::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "shopspace",
    about = "Commercial space marketplace back office: HTTP service and operator tools",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the public site API and the admin back office (default)
    Serve(ServeArgs),
    /// Operator views over the listing table
    #[command(subcommand)]
    Listings(ListingsCommand),
    /// Retention tooling for trashed listings
    #[command(subcommand)]
    Trash(TrashCommand),
    /// Walk a listing through its lifecycle against an in-memory store
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum ListingsCommand {
    /// Write one admin table tab as CSV
    Export(ExportArgs),
}

#[derive(Subcommand, Debug)]
enum TrashCommand {
    /// Print trashed listings with their purge countdown
    Report(TrashReportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Bind address, overriding APP_HOST
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Bind port, overriding APP_PORT
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Seed the in-memory store with demo listings, inquiries, and articles
    #[arg(long)]
    pub(crate) seed_demo: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let command = Cli::parse()
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Listings(ListingsCommand::Export(args)) => run_listing_export(args).await,
        Command::Trash(TrashCommand::Report(args)) => run_trash_report(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
