//! WebSocket transport and the authoritative tick loop.
//!
//! One task accepts connections; each connection gets a lightweight handler
//! that forwards parsed inbound messages into a single server inbox and
//! relays outbound frames from its bounded queue. The main loop alone owns
//! the `GameState`: it drains buffered controls, steps the simulation, and
//! broadcasts a snapshot, once per tick.

use crate::client_manager::{ClientManager, OUTBOUND_QUEUE_SIZE};
use crate::game::GameState;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{AdminCommand, ClientMessage, Direction};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Events sent from connection handlers to the main server loop.
#[derive(Debug)]
pub enum ServerEvent {
    Connected {
        client_id: u32,
        addr: SocketAddr,
        sender: mpsc::Sender<Message>,
    },
    Disconnected {
        client_id: u32,
    },
    MessageReceived {
        client_id: u32,
        message: ClientMessage,
    },
}

/// Main server coordinating the WebSocket transport and game simulation.
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    clients: ClientManager,
    game_state: GameState,
    tick_duration: Duration,
    pending_inputs: Vec<Direction>,
    ticks: u64,

    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on ws://{}", local_addr);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            clients: ClientManager::new(),
            game_state: GameState::new(),
            tick_duration,
            pending_inputs: Vec::new(),
            ticks: 0,
            event_tx,
            event_rx,
        })
    }

    /// The bound address, useful when the server was created on port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawns the task that accepts connections and hands each one off to
    /// its own handler.
    fn spawn_acceptor(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = self.listener.take().ok_or("server is already running")?;
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let mut next_client_id: u32 = 0;
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        next_client_id += 1;
                        let client_id = next_client_id;
                        let event_tx = event_tx.clone();
                        tokio::spawn(async move {
                            handle_connection(stream, addr, client_id, event_tx).await;
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });

        Ok(())
    }

    fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Connected {
                client_id,
                addr,
                sender,
            } => {
                self.clients.add_client(client_id, addr, sender);
            }
            ServerEvent::Disconnected { client_id } => {
                self.clients.remove_client(client_id);
            }
            ServerEvent::MessageReceived { client_id, message } => match message {
                ClientMessage::Control { direction } => {
                    // Applied at the top of the next tick; the handler tasks
                    // never touch the game state directly.
                    self.pending_inputs.push(direction);
                }
                ClientMessage::Admin { command } => {
                    if self.clients.is_local(client_id) {
                        match command {
                            AdminCommand::Restart => self.game_state.restart(),
                        }
                    } else {
                        warn!(
                            "Ignoring admin command from non-local client {}",
                            client_id
                        );
                    }
                }
            },
        }
    }

    /// One simulation tick: apply buffered controls, step, broadcast.
    fn tick(&mut self) {
        self.ticks += 1;

        for direction in self.pending_inputs.drain(..) {
            self.game_state.apply_control(direction);
        }

        self.game_state.step(&mut rand::thread_rng());

        if !self.clients.is_empty() {
            match serde_json::to_string(&self.game_state.snapshot()) {
                Ok(text) => {
                    self.clients.broadcast(&text);
                }
                Err(e) => error!("Failed to serialize snapshot: {}", e),
            }
        }

        if self.ticks % 300 == 0 && !self.clients.is_empty() {
            debug!(
                "Tick {}: {} clients, {} squares, score {}, lives {}",
                self.game_state.tick,
                self.clients.len(),
                self.game_state.squares.len(),
                self.game_state.score,
                self.game_state.lives
            );
        }
    }

    /// Main server loop: connection events and fixed-rate ticks share one
    /// timeline, so the game state sees no concurrent mutation.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_acceptor()?;

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!("Server started successfully");

        loop {
            tokio::select! {
                event = self.event_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },
                _ = tick_interval.tick() => {
                    self.tick();
                },
            }
        }

        Ok(())
    }
}

/// Serves one client connection: WebSocket handshake, then a writer task
/// draining the outbound queue and a read loop forwarding parsed messages
/// into the server inbox. Malformed frames are dropped without breaking the
/// connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    client_id: u32,
    event_tx: mpsc::UnboundedSender<ServerEvent>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed for {}: {}", addr, e);
            return;
        }
    };

    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE_SIZE);
    if event_tx
        .send(ServerEvent::Connected {
            client_id,
            addr,
            sender: outbound_tx,
        })
        .is_err()
    {
        return;
    }

    let (mut ws_sink, mut ws_source) = ws_stream.split();

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            if ws_sink.send(frame).await.is_err() {
                break;
            }
        }
    });

    while let Some(frame) = ws_source.next().await {
        match frame {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(message) => {
                    if event_tx
                        .send(ServerEvent::MessageReceived { client_id, message })
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    debug!("Ignoring malformed frame from client {}: {}", client_id, e);
                }
            },
            Ok(Message::Close(_)) => break,
            // Pings are answered by tungstenite; binary and pong frames are
            // not part of the protocol.
            Ok(_) => {}
            Err(e) => {
                debug!("Connection error for client {}: {}", client_id, e);
                break;
            }
        }
    }

    writer.abort();
    let _ = event_tx.send(ServerEvent::Disconnected { client_id });
}
