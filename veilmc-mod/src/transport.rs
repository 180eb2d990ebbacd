use anyhow::Result;
use veilmc_world::PlayerId;

/// Network primitives provided by the host.
///
/// Sends are fire-and-forget: an `Err` means the frame was not handed to
/// the network layer. Nothing is retried.
pub trait Transport: Send + Sync {
    /// Send a frame to every connected client.
    fn broadcast(&self, frame: &[u8]) -> Result<()>;

    /// Send a frame to one client.
    fn send_to(&self, player: PlayerId, frame: &[u8]) -> Result<()>;

    /// Tell a client to play its own arm swing animation.
    fn send_swing(&self, player: PlayerId) -> Result<()>;
}

/// Drops everything. Used on replicas, which never send.
pub struct NullTransport;

impl Transport for NullTransport {
    fn broadcast(&self, _frame: &[u8]) -> Result<()> {
        Ok(())
    }

    fn send_to(&self, _player: PlayerId, _frame: &[u8]) -> Result<()> {
        Ok(())
    }

    fn send_swing(&self, _player: PlayerId) -> Result<()> {
        Ok(())
    }
}
