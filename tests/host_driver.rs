//! The client driving real sockets through `HostDriver` on loopback.

use std::cell::RefCell;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use esp_tcp::{EspClient, HostDriver, SocketHandle, SocketRegistry, TransportDriver};

const DEADLINE: Duration = Duration::from_secs(5);

/// Accepts one connection, echoes `expect` bytes back and closes.
fn spawn_echo_once(expect: usize) -> (u16, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut buf = vec![0u8; expect];
        stream.read_exact(&mut buf).expect("read request");
        stream.write_all(&buf).expect("write reply");
    });
    (port, server)
}

#[test]
fn echo_round_trip_then_remote_close() {
    let (port, server) = spawn_echo_once(5);
    let registry = SocketRegistry::with_capacity(2);
    let driver = Rc::new(RefCell::new(HostDriver::new(2).unwrap()));
    let mut client = EspClient::new(registry.clone(), driver.clone());

    client.connect("127.0.0.1", port).expect("connect");
    assert_eq!(client.handle(), Some(SocketHandle::new(0)));
    assert_eq!(client.write(b"hello"), 5);

    let mut received = Vec::new();
    let start = Instant::now();
    while client.connected() && start.elapsed() < DEADLINE {
        while let Some(b) = client.read() {
            received.push(b);
        }
        thread::sleep(Duration::from_millis(5));
    }
    server.join().unwrap();

    assert_eq!(received, b"hello");
    assert!(!client.is_attached());
    assert_eq!(registry.in_use_count(), 0);
}

#[test]
fn connect_to_closed_port_fails_and_keeps_slot_free() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let registry = SocketRegistry::with_capacity(1);
    let driver = Rc::new(RefCell::new(HostDriver::new(1).unwrap()));
    let mut client = EspClient::new(registry.clone(), driver);

    assert!(client.connect("127.0.0.1", port).is_err());
    assert!(!client.is_attached());
    assert_eq!(registry.allocate(), Some(SocketHandle::new(0)));
}

#[test]
fn unopened_slot_reports_nothing() {
    let mut driver = HostDriver::new(2).unwrap();
    let h = SocketHandle::new(1);

    assert_eq!(driver.pending(h), 0);
    assert!(!driver.is_link_live(h));
    assert!(driver.send(h, b"x").is_err());
    assert!(driver.receive_byte(h, false).is_err());
    driver.close(h);
}

#[test]
fn out_of_range_open_is_rejected() {
    let mut driver = HostDriver::new(1).unwrap();
    let err = driver.open("127.0.0.1", 1, SocketHandle::new(3)).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
}
