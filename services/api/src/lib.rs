mod cli;
mod demo;
mod infra;
mod listings;
mod routes;
mod server;

use shopspace::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
