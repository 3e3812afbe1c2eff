use clap::{Parser, ValueEnum};
use client::input::InputManager;
use client::network::Client;
use log::info;
use shared::PlayerType;
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    Player0,
    Player1,
}

impl From<Side> for PlayerType {
    fn from(side: Side) -> Self {
        match side {
            Side::Player0 => PlayerType::Player0,
            Side::Player1 => PlayerType::Player1,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Controls messages sent per second
    #[arg(short, long, default_value = "30")]
    tick_rate: u32,

    /// Play one side automatically
    #[arg(short, long, value_enum)]
    autopilot: Option<Side>,
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

    let input_manager = match args.autopilot {
        Some(side) => {
            info!("Autopilot playing {}", PlayerType::from(side));
            InputManager::with_autopilot(side.into())
        }
        None => InputManager::new(),
    };

    let tick_duration = Duration::from_secs_f32(1.0 / args.tick_rate.max(1) as f32);
    let mut client = Client::connect(&args.server, tick_duration, input_manager).await?;

    client.run().await?;

    Ok(())
}
