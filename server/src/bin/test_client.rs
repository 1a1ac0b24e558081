//! Headless scripted client for manual smoke testing against a running
//! server: connects, prints snapshots, wiggles the paddle, optionally
//! requests a restart, then disconnects.

use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use shared::{AdminCommand, ClientMessage, Direction, Snapshot};
use std::time::Duration;
use tokio::time::sleep;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server URL to connect to
    #[arg(short, long, default_value = "ws://127.0.0.1:5001")]
    url: String,

    /// Number of control messages to send
    #[arg(short, long, default_value = "20")]
    moves: u32,

    /// Request a game restart before disconnecting (loopback only)
    #[arg(short, long)]
    restart: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("Connecting to {}", args.url);
    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    let (mut sink, mut source) = ws_stream.split();
    println!("Connected");

    for i in 0..args.moves {
        let direction = if i % 2 == 0 {
            Direction::Left
        } else {
            Direction::Right
        };
        let control = ClientMessage::Control { direction };
        sink.send(Message::Text(serde_json::to_string(&control)?)).await?;

        // Drain whatever snapshots arrived since the last move.
        let mut latest = None;
        while let Ok(Some(frame)) =
            tokio::time::timeout(Duration::from_millis(50), source.next()).await
        {
            if let Ok(Message::Text(text)) = frame {
                if let Ok(snapshot) = serde_json::from_str::<Snapshot>(&text) {
                    latest = Some(snapshot);
                }
            }
        }

        if let Some(snapshot) = latest {
            println!(
                "paddle_x={} squares={} score={} lives={} game_over={}",
                snapshot.paddle_x,
                snapshot.squares.len(),
                snapshot.score,
                snapshot.lives,
                snapshot.game_over
            );
        }

        sleep(Duration::from_millis(200)).await;
    }

    if args.restart {
        println!("Requesting restart");
        let admin = ClientMessage::Admin {
            command: AdminCommand::Restart,
        };
        sink.send(Message::Text(serde_json::to_string(&admin)?)).await?;
        sleep(Duration::from_millis(200)).await;
    }

    sink.send(Message::Close(None)).await?;
    println!("Test client finished");

    Ok(())
}
