mod cli;
mod infra;
mod routes;
mod server;

use reliefplan::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
