mod cli;
mod demo;
mod infra;
mod rate_limit;
mod routes;
mod server;

use scout_ai::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
