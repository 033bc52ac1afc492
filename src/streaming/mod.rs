mod handlers;
mod server;
mod stats;

pub use server::{router, ServerState, StreamServer};
pub use stats::{StreamStats, StreamStatsSnapshot};
