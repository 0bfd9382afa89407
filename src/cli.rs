//! Command line interface for the `fragmux` binary.
//!
//! Also compiled by the build script to render the man page, so it must not
//! depend on the library crate.

use std::net::SocketAddr;

use clap::Parser;

/// Command line arguments for the `fragmux` binary.
#[derive(Debug, Parser)]
#[command(
    name = "fragmux",
    version,
    about = "Reassemble fragmented media frames from many concurrent TCP connections"
)]
pub struct Cli {
    /// Address to accept fragment connections on.
    #[arg(short, long, default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,
    /// Number of reassembly workers (default: available cores, at most 8).
    #[arg(short, long)]
    pub workers: Option<usize>,
    /// Bound of each worker's fragment queue.
    #[arg(long)]
    pub queue_capacity: Option<usize>,
    /// Maximum number of simultaneous connections (1-254).
    #[arg(long)]
    pub max_connections: Option<usize>,
    /// Largest frame, in bytes, that will be reassembled.
    #[arg(long)]
    pub max_frame_size: Option<usize>,
    /// Largest payload, in bytes, accepted in one fragment.
    #[arg(long)]
    pub max_fragment_payload: Option<usize>,
    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_listen: Option<SocketAddr>,
}
