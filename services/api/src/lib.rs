mod cli;
mod infra;
mod report;
mod routes;
mod server;

use degree_planner::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
