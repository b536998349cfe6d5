//! Outbound notification contract and the simulated Telegram gateway.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

/// Artificial round-trip delay for the simulated gateway.
const SIMULATED_DELAY_MS: u64 = 500;

/// Best-effort delivery of a message, and optionally a one-time code, to a
/// user's out-of-band destination. Returns whether delivery succeeded.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, destination: &str, message: &str, code: Option<&str>) -> bool;
}

/// Stand-in for a real Telegram bot.
///
/// Logs the message, pretends the network round trip took a moment, and
/// always reports success. A real implementation would POST to a backend
/// holding the bot token.
pub struct TelegramSim;

#[async_trait]
impl Notifier for TelegramSim {
    async fn send(&self, destination: &str, message: &str, code: Option<&str>) -> bool {
        match code {
            Some(code) => info!(destination, code, "[telegram] {}", message),
            None => info!(destination, "[telegram] {}", message),
        }
        tokio::time::sleep(Duration::from_millis(SIMULATED_DELAY_MS)).await;
        true
    }
}
