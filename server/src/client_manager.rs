//! Connected-client registry and snapshot fan-out.
//!
//! Each connection handler registers an outbound message queue here. The tick
//! loop broadcasts through `try_send` so a slow or disconnected client can
//! never stall the simulation; such clients are simply dropped from the
//! recipient set.

use log::info;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Outbound frames buffered per client before the connection is dropped as
/// too slow to keep up with the tick rate.
pub const OUTBOUND_QUEUE_SIZE: usize = 64;

/// A connected client's routing entry. No gameplay state lives here; clients
/// are passive viewers of one shared session.
#[derive(Debug)]
pub struct Client {
    pub id: u32,
    pub addr: SocketAddr,
    pub sender: mpsc::Sender<Message>,
}

impl Client {
    /// Whether this connection may issue administrative commands. Restart is
    /// operator-only, so it is gated to loopback peers.
    pub fn is_local(&self) -> bool {
        self.addr.ip().is_loopback()
    }
}

/// Registry of all currently connected clients, keyed by server-assigned id.
pub struct ClientManager {
    clients: Vec<Client>,
}

impl ClientManager {
    pub fn new() -> Self {
        Self {
            clients: Vec::new(),
        }
    }

    pub fn add_client(&mut self, id: u32, addr: SocketAddr, sender: mpsc::Sender<Message>) {
        info!(
            "Client {} connected from {} ({} total)",
            id,
            addr,
            self.clients.len() + 1
        );
        self.clients.push(Client { id, addr, sender });
    }

    pub fn remove_client(&mut self, id: u32) -> bool {
        let before = self.clients.len();
        self.clients.retain(|c| c.id != id);
        let removed = self.clients.len() < before;
        if removed {
            info!("Client {} disconnected ({} total)", id, self.clients.len());
        }
        removed
    }

    pub fn is_local(&self, id: u32) -> bool {
        self.clients
            .iter()
            .any(|c| c.id == id && c.is_local())
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Queues a text frame to every connected client, fire-and-forget.
    ///
    /// Clients whose queue is closed or full are removed from the recipient
    /// set; the returned ids let the caller clean up any associated state.
    pub fn broadcast(&mut self, text: &str) -> Vec<u32> {
        let mut dropped = Vec::new();
        for client in &self.clients {
            if client.sender.try_send(Message::Text(text.to_string())).is_err() {
                dropped.push(client.id);
            }
        }
        for id in &dropped {
            info!("Dropping unresponsive client {}", id);
            self.clients.retain(|c| c.id != *id);
        }
        dropped
    }
}

impl Default for ClientManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn addr(ip: [u8; 4], port: u16) -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3])), port)
    }

    fn channel() -> (mpsc::Sender<Message>, mpsc::Receiver<Message>) {
        mpsc::channel(OUTBOUND_QUEUE_SIZE)
    }

    #[test]
    fn test_add_and_remove_clients() {
        let mut manager = ClientManager::new();
        assert!(manager.is_empty());

        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();
        manager.add_client(1, addr([127, 0, 0, 1], 5000), tx1);
        manager.add_client(2, addr([10, 0, 0, 5], 5001), tx2);
        assert_eq!(manager.len(), 2);

        assert!(manager.remove_client(1));
        assert!(!manager.remove_client(1));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_admin_gated_to_loopback() {
        let mut manager = ClientManager::new();
        let (tx1, _rx1) = channel();
        let (tx2, _rx2) = channel();
        manager.add_client(1, addr([127, 0, 0, 1], 5000), tx1);
        manager.add_client(2, addr([192, 168, 1, 20], 5001), tx2);

        assert!(manager.is_local(1));
        assert!(!manager.is_local(2));
        assert!(!manager.is_local(99));
    }

    #[test]
    fn test_broadcast_reaches_all_clients() {
        let mut manager = ClientManager::new();
        let (tx1, mut rx1) = channel();
        let (tx2, mut rx2) = channel();
        manager.add_client(1, addr([127, 0, 0, 1], 5000), tx1);
        manager.add_client(2, addr([127, 0, 0, 1], 5001), tx2);

        let dropped = manager.broadcast("{\"score\":0}");
        assert!(dropped.is_empty());

        for rx in [&mut rx1, &mut rx2] {
            match rx.try_recv().unwrap() {
                Message::Text(text) => assert_eq!(text, "{\"score\":0}"),
                other => panic!("Unexpected frame: {:?}", other),
            }
        }
    }

    #[test]
    fn test_broadcast_drops_closed_client() {
        let mut manager = ClientManager::new();
        let (tx1, rx1) = channel();
        let (tx2, mut _rx2) = channel();
        manager.add_client(1, addr([127, 0, 0, 1], 5000), tx1);
        manager.add_client(2, addr([127, 0, 0, 1], 5001), tx2);

        drop(rx1);
        let dropped = manager.broadcast("tick");

        assert_eq!(dropped, vec![1]);
        assert_eq!(manager.len(), 1);

        // Subsequent broadcasts proceed without the dead client.
        let dropped = manager.broadcast("tick");
        assert!(dropped.is_empty());
    }

    #[test]
    fn test_broadcast_drops_slow_client() {
        let mut manager = ClientManager::new();
        let (tx, _rx) = channel();
        manager.add_client(1, addr([127, 0, 0, 1], 5000), tx);

        // Fill the outbound queue without draining it.
        let mut dropped = Vec::new();
        for _ in 0..=OUTBOUND_QUEUE_SIZE {
            dropped = manager.broadcast("tick");
        }

        assert_eq!(dropped, vec![1]);
        assert!(manager.is_empty());
    }
}
