//! Live dashboard feed.
//!
//! The backend pushes JSON messages over an unauthenticated WebSocket.
//! Messages are decoded into a tagged union before anything touches view
//! state - a payload that fails to decode is logged and dropped, never
//! merged. The feed task owns the connection and forwards validated
//! messages through the app's channel; on disconnect it reconnects with
//! bounded exponential backoff.

use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use crate::models::DashboardStats;

/// Base reconnect delay in seconds
const RECONNECT_BASE_DELAY_SECS: u64 = 2;

/// Maximum reconnect delay in seconds
const RECONNECT_MAX_DELAY_SECS: u64 = 30;

/// Give up after this many consecutive failed connections
const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Validated live-feed message
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    /// Partial dashboard metrics; present fields overwrite current values
    Dashboard {
        total_users: Option<i64>,
        total_new_users: Option<i64>,
        overall_total_coins: Option<i64>,
    },
    /// Hint that an entity collection changed server-side
    Refresh { entity: String },
}

impl LiveMessage {
    /// Field-wise merge into the dashboard view state. Only the fields the
    /// message carries are overwritten (last write per key wins).
    pub fn apply(&self, stats: &mut DashboardStats) {
        if let LiveMessage::Dashboard {
            total_users,
            total_new_users,
            overall_total_coins,
        } = self
        {
            if let Some(n) = total_users {
                stats.user_totals.total_users = *n;
            }
            if let Some(n) = total_new_users {
                stats.new_user_totals.total_new_users = *n;
            }
            if let Some(n) = overall_total_coins {
                stats.coin_totals.overall_total_coins = *n;
            }
        }
    }
}

/// Reconnect delay for the given attempt (1-based), capped
fn reconnect_delay(attempt: u32) -> Duration {
    let secs = RECONNECT_BASE_DELAY_SECS
        .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
        .min(RECONNECT_MAX_DELAY_SECS);
    Duration::from_secs(secs)
}

/// Spawn the feed task. It runs until the sender's receiver is dropped or
/// the reconnect budget is exhausted.
pub fn spawn(url: String, tx: mpsc::Sender<LiveMessage>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut attempts: u32 = 0;

        loop {
            match connect_async(&url).await {
                Ok((ws_stream, _)) => {
                    info!(%url, "Live feed connected");
                    attempts = 0;

                    let (_, mut read) = ws_stream.split();
                    while let Some(msg_result) = read.next().await {
                        match msg_result {
                            Ok(Message::Text(text)) => {
                                match serde_json::from_str::<LiveMessage>(&text) {
                                    Ok(message) => {
                                        debug!(?message, "Live message");
                                        if tx.send(message).await.is_err() {
                                            // App is gone
                                            return;
                                        }
                                    }
                                    Err(e) => {
                                        warn!(error = %e, "Dropping malformed live message");
                                    }
                                }
                            }
                            Ok(Message::Close(_)) => {
                                info!("Live feed closed by server");
                                break;
                            }
                            Ok(_) => {}
                            Err(e) => {
                                warn!(error = %e, "Live feed error");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Live feed connect failed");
                }
            }

            if tx.is_closed() {
                return;
            }

            attempts += 1;
            if attempts > MAX_RECONNECT_ATTEMPTS {
                warn!("Live feed giving up after {} attempts", MAX_RECONNECT_ATTEMPTS);
                return;
            }
            let delay = reconnect_delay(attempts);
            debug!(attempt = attempts, delay_secs = delay.as_secs(), "Live feed reconnecting");
            tokio::time::sleep(delay).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_dashboard_message() {
        let msg: LiveMessage =
            serde_json::from_str(r#"{"type": "dashboard", "total_users": 48211}"#).unwrap();
        assert_eq!(
            msg,
            LiveMessage::Dashboard {
                total_users: Some(48211),
                total_new_users: None,
                overall_total_coins: None,
            }
        );
    }

    #[test]
    fn test_decode_refresh_message() {
        let msg: LiveMessage =
            serde_json::from_str(r#"{"type": "refresh", "entity": "tasks"}"#).unwrap();
        assert_eq!(
            msg,
            LiveMessage::Refresh {
                entity: "tasks".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_or_malformed_messages_rejected() {
        // Unknown discriminator
        assert!(serde_json::from_str::<LiveMessage>(r#"{"type": "surprise"}"#).is_err());
        // Missing discriminator
        assert!(serde_json::from_str::<LiveMessage>(r#"{"total_users": 5}"#).is_err());
        // Wrong field type inside a known variant
        assert!(serde_json::from_str::<LiveMessage>(
            r#"{"type": "dashboard", "total_users": "lots"}"#
        )
        .is_err());
        // Not even JSON
        assert!(serde_json::from_str::<LiveMessage>("tick").is_err());
    }

    #[test]
    fn test_apply_merges_only_present_fields() {
        let mut stats = DashboardStats::default();
        stats.user_totals.total_users = 100;
        stats.coin_totals.overall_total_coins = 5000;

        let msg: LiveMessage =
            serde_json::from_str(r#"{"type": "dashboard", "overall_total_coins": 6000}"#).unwrap();
        msg.apply(&mut stats);

        assert_eq!(stats.user_totals.total_users, 100); // untouched
        assert_eq!(stats.coin_totals.overall_total_coins, 6000);
    }

    #[test]
    fn test_refresh_does_not_touch_stats() {
        let mut stats = DashboardStats::default();
        stats.user_totals.total_users = 7;
        let msg = LiveMessage::Refresh {
            entity: "users".to_string(),
        };
        msg.apply(&mut stats);
        assert_eq!(stats.user_totals.total_users, 7);
    }

    #[test]
    fn test_reconnect_delay_backoff_capped() {
        assert_eq!(reconnect_delay(1), Duration::from_secs(2));
        assert_eq!(reconnect_delay(2), Duration::from_secs(4));
        assert_eq!(reconnect_delay(3), Duration::from_secs(8));
        assert_eq!(reconnect_delay(5), Duration::from_secs(30)); // capped
        assert_eq!(reconnect_delay(30), Duration::from_secs(30));
    }
}
