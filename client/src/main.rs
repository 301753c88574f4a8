use clap::Parser;
use client::network::Client;
use log::info;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Name to play under; reuse it to rejoin a match
    #[arg(short = 'u', long)]
    username: String,

    /// Seconds between keep-alive pings
    #[arg(short = 'p', long, default_value = "5")]
    ping_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);

    let mut client = Client::connect(
        &args.server,
        &args.username,
        Duration::from_secs(args.ping_secs.max(1)),
    )
    .await?;

    client.run().await?;

    Ok(())
}
