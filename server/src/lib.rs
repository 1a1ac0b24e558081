//! # Catch-the-Squares Server Library
//!
//! Authoritative server for a minimal real-time arcade game: squares fall
//! from the top of a fixed 800x600 playfield and a paddle catches them.
//! The server owns the single game session, advances it at a fixed tick
//! rate, and broadcasts a full JSON snapshot to every connected WebSocket
//! client each tick. Clients are passive viewers that render whatever they
//! last received and send back directional control messages.
//!
//! ## Architecture
//!
//! The server uses a single-threaded event loop: connection events, control
//! input, and simulation ticks are all processed sequentially on one task,
//! so the game state never sees concurrent mutation. Connection handlers
//! run as independent tasks but only forward parsed messages into the
//! loop's inbox and relay outbound frames from a bounded per-client queue.
//! Broadcast is fire-and-forget; a slow or disconnected client is dropped
//! from the recipient set without stalling the tick.
//!
//! ## Module Organization
//!
//! - [`game`]: the session state and simulation step: spawn policy,
//!   falling, catch/miss resolution, scoring, lives, game-over, restart.
//! - [`client_manager`]: registry of connected clients and snapshot
//!   fan-out with drop-on-backpressure.
//! - [`network`]: WebSocket accept/handshake, per-connection handlers,
//!   and the main tick loop that ties everything together.

pub mod client_manager;
pub mod game;
pub mod network;
