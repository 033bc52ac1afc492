mod envelope;
mod slot;
#[cfg(test)]
mod tests;

pub use envelope::{FrameEnvelope, StatusSnapshot};
pub use slot::{ExchangeStats, ExchangeStatsSnapshot, FrameExchange};
