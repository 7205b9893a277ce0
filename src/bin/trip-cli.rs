use clap::{Args, Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "trip-cli")]
#[command(about = "Command-line client for the trip aggregator", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Trip {
    /// Origin
    #[arg(long)]
    from: String,
    /// Destination
    #[arg(long)]
    to: String,
    /// Travel date (YYYY-MM-DD)
    #[arg(long)]
    date: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Show API version usage and weather breaker stats
    Metrics,
    /// Search trips (v1, or v2 with weather)
    Search {
        #[command(flatten)]
        trip: Trip,
        /// Use the v2 endpoint
        #[arg(long)]
        v2: bool,
    },
    /// Find the cheapest flight on a route
    Cheapest {
        #[command(flatten)]
        trip: Trip,
    },
    /// Search with arrival-time aware hotels and events
    Contextual {
        #[command(flatten)]
        trip: Trip,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let (path, trip) = match cli.command {
        Commands::Metrics => ("/metrics", None),
        Commands::Search { trip, v2: false } => ("/v1/trips/search", Some(trip)),
        Commands::Search { trip, v2: true } => ("/v2/trips/search", Some(trip)),
        Commands::Cheapest { trip } => ("/v1/trips/cheapest-route", Some(trip)),
        Commands::Contextual { trip } => ("/v1/trips/contextual", Some(trip)),
    };

    let mut request = client.get(format!("{}{}", cli.url, path));
    if let Some(trip) = trip {
        request = request.query(&[("from", trip.from), ("to", trip.to), ("date", trip.date)]);
    }
    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let rendered = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", rendered);
    } else {
        eprintln!("Error: aggregator returned status {}", status);
        eprintln!("{}", rendered);
    }
    Ok(())
}
