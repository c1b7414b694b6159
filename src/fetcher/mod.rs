pub mod block;
pub mod client;
pub mod errors;
pub mod gate;
pub mod pacing;
pub mod pipeline;
pub mod retry;
pub mod types;

pub use block::BlockMarker;
pub use client::Fetcher;
pub use errors::{BlockedError, FetchError};
pub use types::{
    ChannelSink, Charset, FetchEvent, FetchEventSink, FetcherConfig, HostPacing, NoopSink,
};
