//! # ESP TCP - Pooled Client Sockets over an AT-Command Co-Processor
//!
//! Network co-processors driven by AT commands (the ESP8266 family being the
//! usual suspect) expose a handful of numbered socket slots. This library
//! provides a TCP client that runs on one of those slots and keeps three views
//! of the socket consistent: the client's own handle, the shared table of
//! assigned slots, and what the driver reports about the link.
//!
//! ## Building Blocks
//!
//! - **[`SocketRegistry`]**: the shared, fixed-size table of slots. Clients
//!   built from clones of the same registry compete for the same slots, and
//!   allocation always picks the lowest free one.
//! - **[`TransportDriver`]**: the capabilities the client needs from whatever
//!   talks to the co-processor: open, send, pending, receive, link state, close.
//! - **[`EspClient`]**: the client connection itself.
//! - **[`HostDriver`]**: a driver backed by `std::net::TcpStream`, useful to
//!   run the client against real servers from a development host.
//!
//! ## Connection Lifecycle
//!
//! A client is either unattached or holds one handle. It never polls: a remote
//! close is noticed only when the client is asked something. `read` and `peek`
//! release the slot when the driver flags the end of the stream together with
//! the last byte, and `status`/`connected` release it when the driver reports
//! the link down with nothing left to read. `available` never changes state.
//!
//! A failed write blocks for a settle delay (4 seconds by default, see
//! [`ClientConfig`]) before closing the socket, giving the co-processor time
//! to recover.
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use esp_tcp::{EspClient, HostDriver, SocketRegistry, MAX_SOCK_NUM};
//!
//! let registry = SocketRegistry::new();
//! let driver = Rc::new(RefCell::new(HostDriver::new(MAX_SOCK_NUM)?));
//!
//! let mut client = EspClient::new(registry.clone(), driver.clone());
//! client.connect("example.com", 80)?;
//! client.write(b"GET / HTTP/1.0\r\n\r\n");
//!
//! while client.connected() {
//!     while let Some(b) = client.read() {
//!         print!("{}", b as char);
//!     }
//! }
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## Threading
//!
//! Registry and driver are shared through `Rc<RefCell<_>>` without locking,
//! so every client of one co-processor lives on a single thread.

#![warn(missing_docs)]

mod client;
mod driver;
mod error;
mod host;
mod registry;

pub use client::*;
pub use driver::*;
pub use error::*;
pub use host::*;
pub use registry::*;
