use clap::Parser;
use log::info;
use server::network::Server;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about = "Authoritative quantum hockey server")]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Tick rate (updates per second)
    #[arg(short, long, default_value = "30")]
    tick_rate: u32,

    /// Maximum number of simultaneous connections, spectators included
    #[arg(short, long, default_value = "32")]
    max_connections: usize,

    /// Seconds of silence before a connection is dropped
    #[arg(long, default_value = "5")]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    info!("Starting quantum hockey server");
    info!("Tip: Set RUST_LOG=debug for detailed logging");

    let address = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f32(1.0 / args.tick_rate.max(1) as f32);

    let mut server = Server::new(
        &address,
        tick_duration,
        args.max_connections,
        Duration::from_secs(args.timeout_secs),
    )
    .await?;

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
