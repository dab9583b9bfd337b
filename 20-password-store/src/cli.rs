use std::net::SocketAddr;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Socket address the HTTP server should bind to. Use port 0 for an ephemeral port.
    #[arg(long, default_value = "127.0.0.1:8090")]
    pub listen: SocketAddr,

    /// Number of commands the record store queue holds before callers wait.
    #[arg(long, default_value_t = 200)]
    pub queue_capacity: usize,

    /// Milliseconds a submitted password waits before it is hashed and stored.
    #[arg(long, default_value_t = 5000)]
    pub commit_delay_ms: u64,

    /// Milliseconds to wait after a shutdown request before checking the queue.
    #[arg(long, default_value_t = 5000)]
    pub grace_period_ms: u64,

    /// Milliseconds between queue checks while draining.
    #[arg(long, default_value_t = 1000)]
    pub drain_poll_ms: u64,
}
