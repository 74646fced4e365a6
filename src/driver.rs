use std::io::Result as IoResult;

use crate::registry::SocketHandle;

/// One byte delivered by [`TransportDriver::receive_byte`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Received {
    /// The byte read from the socket.
    pub byte: u8,
    /// Set when the driver saw the remote end close the stream while
    /// delivering this byte. No further bytes will arrive on the handle.
    pub stream_ended: bool,
}

/// The capabilities an [`EspClient`](crate::EspClient) needs from the driver
/// that owns the link to the network co-processor.
///
/// Each call addresses one socket slot by handle. The driver is expected to
/// run every call to completion before returning; how long that takes is up to
/// the driver.
pub trait TransportDriver {
    /// Opens a TCP connection to `host:port` on `handle`.
    fn open(&mut self, host: &str, port: u16, handle: SocketHandle) -> IoResult<()>;

    /// Sends all of `data` on `handle`.
    fn send(&mut self, handle: SocketHandle, data: &[u8]) -> IoResult<()>;

    /// Number of received bytes waiting on `handle`; 0 if none or if the
    /// handle is not open.
    fn pending(&mut self, handle: SocketHandle) -> usize;

    /// Fetches one byte from `handle`, leaving it in place when `peek` is set.
    fn receive_byte(&mut self, handle: SocketHandle, peek: bool) -> IoResult<Received>;

    /// Fills as much of `buf` as the driver can and returns how many bytes it wrote.
    fn receive_buf(&mut self, handle: SocketHandle, buf: &mut [u8]) -> IoResult<usize>;

    /// Returns `true` while the driver still considers the link on `handle` up.
    fn is_link_live(&mut self, handle: SocketHandle) -> bool;

    /// Closes `handle`.
    fn close(&mut self, handle: SocketHandle);
}
