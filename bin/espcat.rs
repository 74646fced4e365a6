use clap::Parser;
use std::{cell::RefCell, io::Write, rc::Rc, time::Duration};
use tracing_subscriber::filter::EnvFilter;

use esp_tcp::{ClientConfig, EspClient, HostDriver, SocketRegistry};

fn init_env_filter(env_filter: EnvFilter) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_level(true)
        .with_target(true);

    let subscriber = subscriber.finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn run(args: Args) -> std::io::Result<()> {
    let registry = SocketRegistry::with_capacity(args.sockets);
    let driver = Rc::new(RefCell::new(HostDriver::new(args.sockets)?));
    let config = ClientConfig {
        settle_delay: Duration::from_millis(args.settle_ms),
    };
    let mut client = EspClient::with_config(registry, driver, config);

    client.connect(&args.host, args.port)?;
    println!("Connected to {}:{} on socket {:?}", args.host, args.port, client.handle());

    if let Some(message) = args.message {
        let mut payload = message.into_bytes();
        payload.extend_from_slice(b"\r\n");
        let n = client.write(&payload);
        if n == 0 {
            println!("Failed to send message");
            return Ok(());
        }
        println!("Wrote {n} bytes");
    }

    let mut out = std::io::stdout();
    let poll = Duration::from_millis(args.poll_ms);
    while client.connected() {
        let mut idle = true;
        while let Some(b) = client.read() {
            out.write_all(&[b])?;
            idle = false;
        }
        out.flush()?;
        if idle {
            std::thread::sleep(poll);
        }
    }
    println!();
    println!("Connection closed by remote peer");
    client.stop();
    Ok(())
}

fn main() -> std::io::Result<()> {
    tracing_log::LogTracer::init().expect("Failed to set logger");

    // Initialize tracing subscriber
    match EnvFilter::try_from_default_env() {
        Ok(env_filter) => init_env_filter(env_filter),
        _ => { }
    }

    let args = Args::parse();
    run(args)
}

/// Connects through a pooled client socket, sends a line and prints what comes back
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The host to connect to
    #[arg(long)]
    host: String,
    /// The port to connect to
    #[arg(short, long)]
    port: u16,
    /// A line to send once connected
    #[arg(short, long)]
    message: Option<String>,
    /// The number of socket slots in the pool
    #[arg(short, long, default_value = "4")]
    sockets: usize,
    /// Wait after a failed write, in milliseconds
    #[arg(long, default_value = "4000")]
    settle_ms: u64,
    /// Idle wait between reads, in milliseconds
    #[arg(long, default_value = "10")]
    poll_ms: u64,
}
