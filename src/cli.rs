use crate::analysis::{MarketService, PriceAnalysis};
use crate::config::AppConfig;
use crate::error::Result;
use crate::models::{PriceQuery, PropertyType};
use crate::scrapers::SearchParams;
use crate::{server, telemetry};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "immo-price-scout",
    about = "Compare a property's asking price with the local market",
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
    /// Analyse one asking price against the market
    Analyze(AnalyzeArgs),
    /// Scrape listings and market data and save them as JSON
    Listings(ListingsArgs),
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
struct AnalyzeArgs {
    /// Asking price in euros
    #[arg(long)]
    price: f64,
    /// Surface in m²
    #[arg(long)]
    area: f64,
    /// Town to compare against
    #[arg(long)]
    location: String,
    #[arg(long, default_value = "apartment", value_parser = parse_property_type)]
    property_type: PropertyType,
    /// Print the analysis as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct ListingsArgs {
    #[arg(long)]
    location: String,
    /// Target surface in m²
    #[arg(long)]
    area: f64,
    #[arg(long, default_value = "apartment", value_parser = parse_property_type)]
    property_type: PropertyType,
    /// City for reference prices, when different from the location
    #[arg(long)]
    city: Option<String>,
    #[arg(long, default_value = "scraped_listings.json")]
    output: PathBuf,
}

fn parse_property_type(raw: &str) -> std::result::Result<PropertyType, String> {
    raw.parse()
}

pub(crate) async fn run() -> Result<()> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Analyze(args) => run_analyze(args).await,
        Command::Listings(args) => run_listings(args).await,
    }
}

fn load_service() -> Result<MarketService> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    MarketService::from_config(&config.scraper)
}

async fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let service = load_service()?;
    let query = PriceQuery {
        price: args.price,
        area: args.area,
        location: args.location,
        property_type: args.property_type,
    };

    let analysis = service.analyze(&query).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", render_analysis(&analysis));
    }
    Ok(())
}

async fn run_listings(args: ListingsArgs) -> Result<()> {
    let service = load_service()?;
    let params = SearchParams {
        location: args.location,
        property_type: args.property_type,
        area: args.area,
        city: args.city,
    };

    let response = service.fetch_listings(&params).await?;

    for (i, listing) in response.listings.iter().enumerate() {
        println!("{}. {} ({})", i + 1, listing.title, format_eur(listing.price as f64));
        println!("   {} m², {}", listing.area, listing.location);
        if let Some(per_m2) = listing.price_per_m2() {
            println!("   {}/m²", format_eur(per_m2.round()));
        }
        println!("   URL: {}", listing.url);
        println!();
    }

    let json = serde_json::to_string_pretty(&response)?;
    tokio::fs::write(&args.output, json).await?;
    info!(
        "Saved {} listings and market data to {}",
        response.listings.len(),
        args.output.display()
    );

    Ok(())
}

fn render_analysis(analysis: &PriceAnalysis) -> String {
    let percentage = match analysis.percentage_diff {
        Some(pct) if pct > 0.0 => format!("+{pct:.1}%"),
        Some(pct) => format!("{pct:.1}%"),
        None => "n/a".to_string(),
    };
    let verdict = if analysis.is_overpriced {
        "above market"
    } else {
        "at or below market"
    };

    let mut out = String::new();
    out.push_str(&format!(
        "{} {} m² in {}\n",
        analysis.property_type, analysis.area, analysis.location
    ));
    out.push_str(&format!("  Asking price:   {}\n", format_eur(analysis.user_price)));
    out.push_str(&format!("  Market price:   {}\n", format_eur(analysis.market_price)));
    out.push_str(&format!(
        "  Market €/m²:    {} ({:?}, {} samples)\n",
        format_eur(analysis.average_price_per_m2),
        analysis.market_data.basis,
        analysis.market_data.sample_size
    ));
    out.push_str(&format!("  Difference:     {percentage} ({verdict})\n"));
    out
}

/// Whole euros with French digit grouping, e.g. `1 250 000 €`
fn format_eur(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}{grouped} €")
}
