use std::io::{ErrorKind, Read, Result as IoResult, Write};
use std::net::{Shutdown, TcpStream};

use crate::driver::{Received, TransportDriver};
use crate::registry::SocketHandle;

/// Upper bound on the bytes a single [`HostDriver::pending`] call reports.
const PEEK_WINDOW: usize = 2048;

struct HostSocket {
    stream: TcpStream,
    key: usize,
}

/// A [`TransportDriver`] that opens real TCP connections from the host,
/// one non-blocking [`TcpStream`] per socket slot.
///
/// It stands in for the co-processor when running on a development machine:
/// the same [`EspClient`](crate::EspClient) logic drives it, and remote
/// closes surface the same way, lazily, when the client next looks at the
/// socket.
pub struct HostDriver {
    sockets: Vec<Option<HostSocket>>,
    poller: polling::Poller,
}

impl HostDriver {
    /// Creates a driver with `capacity` socket slots.
    pub fn new(capacity: usize) -> IoResult<HostDriver> {
        let mut sockets = Vec::with_capacity(capacity);
        sockets.resize_with(capacity, || None);
        Ok(HostDriver {
            sockets,
            poller: polling::Poller::new()?,
        })
    }

    fn socket(&mut self, handle: SocketHandle) -> IoResult<&mut HostSocket> {
        open_socket(&mut self.sockets, handle)
    }

    fn release(&mut self, index: usize) {
        if let Some(s) = self.sockets.get_mut(index).and_then(Option::take) {
            let _ = self.poller.delete(&s.stream);
            let _ = s.stream.shutdown(Shutdown::Both);
        }
    }

    fn peer_closed(stream: &TcpStream) -> bool {
        let mut b = [0u8; 1];
        matches!(stream.peek(&mut b), Ok(0))
    }
}

fn open_socket(
    sockets: &mut [Option<HostSocket>],
    handle: SocketHandle,
) -> IoResult<&mut HostSocket> {
    sockets
        .get_mut(handle.id() as usize)
        .and_then(Option::as_mut)
        .ok_or_else(|| {
            std::io::Error::new(ErrorKind::NotConnected, format!("socket {handle} is not open"))
        })
}

impl TransportDriver for HostDriver {
    fn open(&mut self, host: &str, port: u16, handle: SocketHandle) -> IoResult<()> {
        let key = handle.id() as usize;
        if key >= self.sockets.len() {
            return Err(std::io::Error::new(
                ErrorKind::InvalidInput,
                format!("socket {handle} is out of range"),
            ));
        }
        // A slot released through a lazy status check still holds its stream.
        self.release(key);

        let stream = TcpStream::connect((host, port))?;
        stream.set_nonblocking(true)?;
        unsafe {
            self.poller.add(&stream, polling::Event::none(key))?;
        }
        log::debug!("Opened {host}:{port} on socket {handle}");
        self.sockets[key] = Some(HostSocket { stream, key });
        Ok(())
    }

    fn send(&mut self, handle: SocketHandle, data: &[u8]) -> IoResult<()> {
        let poller = &self.poller;
        let sock = open_socket(&mut self.sockets, handle)?;

        let mut index = 0;
        let mut events = polling::Events::new();
        while index < data.len() {
            match sock.stream.write(&data[index..]) {
                Ok(0) => return Err(ErrorKind::WriteZero.into()),
                Ok(n) => index += n,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    events.clear();
                    poller.modify(&sock.stream, polling::Event::writable(sock.key))?;
                    poller.wait(&mut events, None)?;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn pending(&mut self, handle: SocketHandle) -> usize {
        let Ok(sock) = self.socket(handle) else {
            return 0;
        };
        let mut window = [0u8; PEEK_WINDOW];
        sock.stream.peek(&mut window).unwrap_or(0)
    }

    /// Peeking never reports the end of the stream; only consuming the last
    /// byte does.
    fn receive_byte(&mut self, handle: SocketHandle, peek: bool) -> IoResult<Received> {
        let sock = self.socket(handle)?;
        let mut b = [0u8; 1];
        let n = if peek {
            sock.stream.peek(&mut b)?
        } else {
            sock.stream.read(&mut b)?
        };
        if n == 0 {
            return Err(ErrorKind::UnexpectedEof.into());
        }
        let stream_ended = !peek && HostDriver::peer_closed(&sock.stream);
        Ok(Received {
            byte: b[0],
            stream_ended,
        })
    }

    fn receive_buf(&mut self, handle: SocketHandle, buf: &mut [u8]) -> IoResult<usize> {
        let sock = self.socket(handle)?;
        match sock.stream.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn is_link_live(&mut self, handle: SocketHandle) -> bool {
        let Ok(sock) = self.socket(handle) else {
            return false;
        };
        let mut b = [0u8; 1];
        match sock.stream.peek(&mut b) {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) => e.kind() == ErrorKind::WouldBlock,
        }
    }

    fn close(&mut self, handle: SocketHandle) {
        log::debug!("Closing socket {handle}");
        self.release(handle.id() as usize);
    }
}

impl Drop for HostDriver {
    fn drop(&mut self) {
        for i in 0..self.sockets.len() {
            self.release(i);
        }
    }
}
