//! Scripted transport driver shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::{Error, ErrorKind, Result as IoResult};
use std::rc::Rc;
use std::time::Duration;

use esp_tcp::{ClientConfig, EspClient, Received, SocketHandle, SocketRegistry, TransportDriver};

/// Per-handle state of the mock co-processor.
#[derive(Debug, Default)]
pub struct MockSocket {
    pub host: String,
    pub port: u16,
    pub open: bool,
    pub link_live: bool,
    pub rx: VecDeque<u8>,
    /// Report the end of the stream together with the last queued byte.
    pub end_after_rx: bool,
    pub sent: Vec<u8>,
}

/// A driver whose behavior is scripted per handle by the tests.
#[derive(Debug, Default)]
pub struct MockDriver {
    pub sockets: HashMap<SocketHandle, MockSocket>,
    pub fail_open: bool,
    pub fail_send: bool,
    pub fail_receive: bool,
    pub open_calls: usize,
    pub send_calls: usize,
    pub close_calls: Vec<SocketHandle>,
}

impl MockDriver {
    pub fn shared() -> Rc<RefCell<MockDriver>> {
        Rc::new(RefCell::new(MockDriver::default()))
    }

    pub fn socket(&mut self, handle: SocketHandle) -> &mut MockSocket {
        self.sockets.entry(handle).or_default()
    }

    /// Queues inbound bytes on `handle`.
    pub fn feed(&mut self, handle: SocketHandle, data: &[u8]) {
        self.socket(handle).rx.extend(data.iter().copied());
    }

    /// Queues inbound bytes on `handle` and marks the last of them as the end of the stream.
    pub fn feed_last(&mut self, handle: SocketHandle, data: &[u8]) {
        self.feed(handle, data);
        self.socket(handle).end_after_rx = true;
    }

    /// Simulates the remote end dropping the link.
    pub fn drop_link(&mut self, handle: SocketHandle) {
        self.socket(handle).link_live = false;
    }
}

impl TransportDriver for MockDriver {
    fn open(&mut self, host: &str, port: u16, handle: SocketHandle) -> IoResult<()> {
        self.open_calls += 1;
        if self.fail_open {
            return Err(Error::new(ErrorKind::ConnectionRefused, "scripted open failure"));
        }
        let s = self.socket(handle);
        s.host = host.to_string();
        s.port = port;
        s.open = true;
        s.link_live = true;
        s.end_after_rx = false;
        s.rx.clear();
        s.sent.clear();
        Ok(())
    }

    fn send(&mut self, handle: SocketHandle, data: &[u8]) -> IoResult<()> {
        self.send_calls += 1;
        if self.fail_send {
            return Err(Error::new(ErrorKind::BrokenPipe, "scripted send failure"));
        }
        self.socket(handle).sent.extend_from_slice(data);
        Ok(())
    }

    fn pending(&mut self, handle: SocketHandle) -> usize {
        self.sockets.get(&handle).map_or(0, |s| s.rx.len())
    }

    fn receive_byte(&mut self, handle: SocketHandle, peek: bool) -> IoResult<Received> {
        if self.fail_receive {
            return Err(Error::new(ErrorKind::TimedOut, "scripted receive failure"));
        }
        let s = self.socket(handle);
        let byte = if peek { s.rx.front().copied() } else { s.rx.pop_front() };
        let byte = byte.ok_or_else(|| Error::from(ErrorKind::UnexpectedEof))?;
        let last = if peek { s.rx.len() == 1 } else { s.rx.is_empty() };
        let stream_ended = s.end_after_rx && last;
        if stream_ended {
            s.link_live = false;
        }
        Ok(Received { byte, stream_ended })
    }

    fn receive_buf(&mut self, handle: SocketHandle, buf: &mut [u8]) -> IoResult<usize> {
        if self.fail_receive {
            return Err(Error::new(ErrorKind::TimedOut, "scripted receive failure"));
        }
        let s = self.socket(handle);
        let n = buf.len().min(s.rx.len());
        for (slot, b) in buf.iter_mut().zip(s.rx.drain(..n)) {
            *slot = b;
        }
        Ok(n)
    }

    fn is_link_live(&mut self, handle: SocketHandle) -> bool {
        self.sockets.get(&handle).is_some_and(|s| s.open && s.link_live)
    }

    fn close(&mut self, handle: SocketHandle) {
        self.close_calls.push(handle);
        let s = self.socket(handle);
        s.open = false;
        s.link_live = false;
    }
}

pub fn h(id: u8) -> SocketHandle {
    SocketHandle::new(id)
}

/// A client with a short settle delay so write-failure tests stay fast.
pub fn client(
    registry: &SocketRegistry,
    driver: &Rc<RefCell<MockDriver>>,
) -> EspClient<MockDriver> {
    let config = ClientConfig {
        settle_delay: Duration::from_millis(20),
    };
    EspClient::with_config(registry.clone(), driver.clone(), config)
}
