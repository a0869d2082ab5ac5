//! Discord webhook backend (spec §4.9).

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{Quota, RateLimiter};

use crate::constants::notifier::{
    DISCORD_MESSAGE_CAP, DISPATCH_TIMEOUT_SECS, TOKEN_BUCKET_BURST, TOKEN_BUCKET_PERIOD_SECS,
};

type DirectRateLimiter =
    RateLimiter<governor::state::NotKeyed, governor::state::InMemoryState, governor::clock::DefaultClock>;

/// Posts notifications to a Discord incoming webhook, with a per-backend
/// token bucket (default 1 token/2s, burst 5) and a bounded-timeout HTTP
/// attempt detached from the caller's request (spec §4.9a/b).
pub struct DiscordNotifier {
    webhook_url: String,
    client: reqwest::Client,
    limiter: DirectRateLimiter,
}

impl DiscordNotifier {
    /// Builds a notifier posting to `webhook_url`.
    #[must_use]
    pub fn new(webhook_url: String) -> Self {
        let quota = Quota::with_period(Duration::from_secs(TOKEN_BUCKET_PERIOD_SECS))
            .unwrap_or_else(|| unreachable!("TOKEN_BUCKET_PERIOD_SECS is a nonzero constant"))
            .allow_burst(NonZeroU32::new(TOKEN_BUCKET_BURST).unwrap_or_else(|| {
                unreachable!("TOKEN_BUCKET_BURST is a nonzero constant")
            }));
        Self {
            webhook_url,
            client: reqwest::Client::new(),
            limiter: RateLimiter::direct(quota),
        }
    }

    fn truncate(message: &str) -> String {
        if message.chars().count() <= DISCORD_MESSAGE_CAP {
            return message.to_string();
        }
        let mut truncated: String = message.chars().take(DISCORD_MESSAGE_CAP - 1).collect();
        truncated.push('\u{2026}');
        truncated
    }
}

#[async_trait::async_trait]
impl super::Notify for DiscordNotifier {
    async fn send(&self, notification: &super::Notification) -> anyhow::Result<()> {
        if self.limiter.check().is_err() {
            crate::logging::log_security_event(
                "notifier_rate_limited",
                &format!("dropped notification from {}", notification.source),
            );
            return Ok(());
        }

        let content = Self::truncate(&notification.message);
        let body = serde_json::json!({ "content": content });
        let client = self.client.clone();
        let webhook_url = self.webhook_url.clone();
        tokio::spawn(async move {
            let result = client
                .post(&webhook_url)
                .timeout(Duration::from_secs(DISPATCH_TIMEOUT_SECS))
                .json(&body)
                .send()
                .await;
            if let Err(err) = result {
                tracing::warn!(error = %err, "discord webhook dispatch failed");
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_cap() {
        let long = "a".repeat(DISCORD_MESSAGE_CAP + 50);
        let truncated = DiscordNotifier::truncate(&long);
        assert_eq!(truncated.chars().count(), DISCORD_MESSAGE_CAP);
        assert!(truncated.ends_with('\u{2026}'));
    }

    #[test]
    fn short_message_unchanged() {
        assert_eq!(DiscordNotifier::truncate("hello"), "hello");
    }
}
