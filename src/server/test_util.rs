//! Test helpers shared across server modules.

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
};

use rstest::fixture;

use super::{Bound, FrameServer};
use crate::{
    config::EngineConfig,
    dispatch::Dispatcher,
    ident::IdentifierPool,
    lifecycle::LifecycleAdapter,
    reassembly::Frame,
};

/// Build an adapter with a small dispatcher delivering to `sink`.
///
/// Must be called inside a Tokio runtime.
pub fn adapter_with_sink<F>(sink: F) -> LifecycleAdapter
where
    F: Fn(Frame) + Send + Sync + 'static,
{
    let pool = Arc::new(IdentifierPool::new());
    let config = EngineConfig {
        workers: 2,
        ..EngineConfig::default()
    };
    let dispatcher =
        Dispatcher::spawn(&config, Arc::clone(&pool), Arc::new(sink)).expect("spawn dispatcher");
    LifecycleAdapter::new(pool, dispatcher)
}

#[fixture]
/// Returns a bound [`StdTcpListener`] on a free port for use in tests.
///
/// Keeping the listener bound prevents another process from claiming the
/// port between discovery and use.
pub fn free_listener() -> StdTcpListener {
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    StdTcpListener::bind(addr).expect("Failed to bind free port listener")
}

/// Bind a server discarding every frame to `listener`.
pub fn bind_server(listener: StdTcpListener) -> FrameServer<Bound> {
    FrameServer::new(adapter_with_sink(|_frame: Frame| {}))
        .accept_workers(2)
        .bind_listener(listener)
        .expect("Failed to bind")
}
