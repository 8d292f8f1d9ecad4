pub mod analysis;
mod cli;
pub mod config;
pub mod error;
pub mod market;
pub mod models;
pub mod scrapers;
pub mod server;
pub mod telemetry;

pub use analysis::{analyze, MarketService, PriceAnalysis};
pub use error::{AppError, Result};

/// Parse the command line and run the selected command
pub async fn run() -> Result<()> {
    cli::run().await
}
