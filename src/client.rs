use std::cell::RefCell;
use std::net::Ipv4Addr;
use std::rc::Rc;
use std::time::Duration;

use crate::driver::TransportDriver;
use crate::error::ClientError;
use crate::registry::{SocketHandle, SocketRegistry};

/// How long a client waits after a failed send before tearing the socket down.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(4000);

/// Tunables for an [`EspClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Blocking wait between a failed send and closing the socket. The
    /// co-processor needs this long to recover before it accepts the close.
    pub settle_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Live state of a connection as reported by [`EspClient::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No socket, or the socket has been found closed.
    Closed,
    /// The socket is open, or still has unread bytes.
    Established,
}

/// A TCP client connection running on one slot of a shared socket pool.
///
/// The client owns at most one [`SocketHandle`] at a time. Handles come from a
/// [`SocketRegistry`] shared with every other client of the same co-processor,
/// and all byte transport goes through the shared [`TransportDriver`].
///
/// The client never polls in the background: a remote close is only noticed,
/// and the slot only released, as a side effect of [`read`](Self::read),
/// [`peek`](Self::peek), [`status`](Self::status) or a failed
/// [`write`](Self::write). Dropping a client does not close its socket.
///
/// `std::io::Read` and `std::io::Write` are not implemented: `read` and
/// `peek` work a byte at a time and report end of input as `None`, `write`
/// reports failure as 0 plus a sticky flag, and `flush` discards pending
/// input rather than pushing output. Those contracts do not fit the traits.
///
/// # Example
///
/// ```rust,ignore
/// let registry = SocketRegistry::new();
/// let driver = Rc::new(RefCell::new(driver));
/// let mut client = EspClient::new(registry.clone(), driver.clone());
///
/// client.connect("10.0.0.5", 80)?;
/// client.write(b"GET / HTTP/1.0\r\n\r\n");
/// while client.connected() {
///     if let Some(b) = client.read() {
///         print!("{}", b as char);
///     }
/// }
/// ```
pub struct EspClient<D: TransportDriver> {
    handle: Option<SocketHandle>,
    registry: SocketRegistry,
    driver: Rc<RefCell<D>>,
    config: ClientConfig,
    write_error: bool,
}

impl<D: TransportDriver> EspClient<D> {
    /// Creates an unattached client.
    pub fn new(registry: SocketRegistry, driver: Rc<RefCell<D>>) -> EspClient<D> {
        EspClient::with_config(registry, driver, ClientConfig::default())
    }

    /// Creates an unattached client with explicit tunables.
    pub fn with_config(
        registry: SocketRegistry,
        driver: Rc<RefCell<D>>,
        config: ClientConfig,
    ) -> EspClient<D> {
        EspClient {
            handle: None,
            registry,
            driver,
            config,
            write_error: false,
        }
    }

    /// Wraps a socket that is already open on `handle`, typically one handed
    /// over by a listener. The registry slot is marked in use so that no
    /// other client can allocate it.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is outside the registry.
    pub fn from_handle(
        handle: SocketHandle,
        registry: SocketRegistry,
        driver: Rc<RefCell<D>>,
    ) -> EspClient<D> {
        registry.mark_in_use(handle);
        let mut client = EspClient::new(registry, driver);
        client.handle = Some(handle);
        client
    }

    /// Opens a connection to `host:port` on the lowest free socket slot.
    ///
    /// When the driver fails to open the socket the slot stays free and the
    /// client stays unattached.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), ClientError> {
        log::info!("Connecting to {host}:{port}");
        if self.handle.is_some() {
            return Err(ClientError::AlreadyAttached);
        }

        let Some(handle) = self.registry.allocate() else {
            log::warn!("No socket available");
            return Err(ClientError::NoSocketAvailable);
        };

        if let Err(e) = self.driver.borrow_mut().open(host, port, handle) {
            log::debug!("Failed to open socket {handle} to {host}:{port}: {e}");
            return Err(ClientError::Transport(e));
        }

        self.registry.mark_in_use(handle);
        self.handle = Some(handle);
        log::debug!("Connected to {host}:{port} on socket {handle}");
        Ok(())
    }

    /// Opens a connection to `ip:port`.
    pub fn connect_ip(&mut self, ip: Ipv4Addr, port: u16) -> Result<(), ClientError> {
        self.connect(&ip.to_string(), port)
    }

    /// Sends `buf` and returns the number of bytes written, which is either
    /// `buf.len()` or 0.
    ///
    /// Writing nothing, or writing while unattached, returns 0 and raises the
    /// write-error flag. If the driver fails to send, the flag is raised, the
    /// call blocks for the configured settle delay and the connection is
    /// stopped.
    pub fn write(&mut self, buf: &[u8]) -> usize {
        let Some(handle) = self.handle else {
            self.write_error = true;
            return 0;
        };
        if buf.is_empty() {
            self.write_error = true;
            return 0;
        }

        let sent = self.driver.borrow_mut().send(handle, buf);
        if let Err(e) = sent {
            self.write_error = true;
            log::debug!("Failed to write on socket {handle}, disconnecting: {e}");
            std::thread::sleep(self.config.settle_delay);
            self.stop();
            return 0;
        }

        buf.len()
    }

    /// Sends a single byte.
    pub fn write_byte(&mut self, b: u8) -> usize {
        self.write(&[b])
    }

    /// Returns `true` if any write since the last
    /// [`clear_write_error`](Self::clear_write_error) has failed.
    pub fn write_error(&self) -> bool {
        self.write_error
    }

    /// Resets the write-error flag.
    pub fn clear_write_error(&mut self) {
        self.write_error = false;
    }

    /// Number of bytes ready to be read.
    ///
    /// This never changes the connection state, even if the socket has been
    /// closed remotely.
    pub fn available(&self) -> usize {
        match self.handle {
            Some(handle) => self.driver.borrow_mut().pending(handle),
            None => 0,
        }
    }

    /// Reads one byte, or returns `None` if nothing is available.
    ///
    /// If the driver reports that the stream ended with this byte, the slot is
    /// released and the client detaches; the byte is still returned.
    pub fn read(&mut self) -> Option<u8> {
        self.receive_byte(false)
    }

    /// Like [`read`](Self::read) but leaves the byte in the stream.
    pub fn peek(&mut self) -> Option<u8> {
        self.receive_byte(true)
    }

    /// Reads whatever the driver can deliver into `buf` in one fetch and
    /// returns the number of bytes written.
    pub fn read_buf(&mut self, buf: &mut [u8]) -> Result<usize, ClientError> {
        let handle = self.handle.ok_or(ClientError::NotAttached)?;
        let n = self.driver.borrow_mut().receive_buf(handle, buf)?;
        Ok(n)
    }

    /// Discards all pending input.
    pub fn flush(&mut self) {
        while self.available() > 0 {
            if self.read().is_none() {
                break;
            }
        }
    }

    /// Closes the socket and releases its slot. Does nothing when unattached.
    pub fn stop(&mut self) {
        let Some(handle) = self.handle else {
            return;
        };
        log::info!("Disconnecting {handle}");
        self.driver.borrow_mut().close(handle);
        self.detach(handle);
    }

    /// Returns `true` if [`status`](Self::status) is
    /// [`ConnectionStatus::Established`].
    pub fn connected(&mut self) -> bool {
        self.status() == ConnectionStatus::Established
    }

    /// Asks the driver whether the connection is still alive.
    ///
    /// A socket with unread bytes counts as established even if the link is
    /// down. Otherwise, when the driver reports the link down, the slot is
    /// released and the client detaches.
    pub fn status(&mut self) -> ConnectionStatus {
        let Some(handle) = self.handle else {
            return ConnectionStatus::Closed;
        };

        let live = {
            let mut driver = self.driver.borrow_mut();
            driver.pending(handle) > 0 || driver.is_link_live(handle)
        };
        if live {
            return ConnectionStatus::Established;
        }

        log::debug!("Socket {handle} closed by remote peer");
        self.detach(handle);
        ConnectionStatus::Closed
    }

    /// Returns `true` while the client holds a socket handle, whether or not
    /// the connection is still alive.
    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// The handle currently held, if any.
    pub fn handle(&self) -> Option<SocketHandle> {
        self.handle
    }

    fn receive_byte(&mut self, peek: bool) -> Option<u8> {
        if self.available() == 0 {
            return None;
        }
        let handle = self.handle?;

        let received = self.driver.borrow_mut().receive_byte(handle, peek);
        match received {
            Ok(r) => {
                if r.stream_ended {
                    log::debug!("Stream ended on socket {handle}");
                    self.detach(handle);
                }
                Some(r.byte)
            }
            Err(e) => {
                log::warn!("Failed to receive on socket {handle}: {e}");
                None
            }
        }
    }

    fn detach(&mut self, handle: SocketHandle) {
        self.registry.mark_free(handle);
        self.handle = None;
    }
}
