//! Control channel: commands the hosted page sends to the worker.
//!
//! Messages are JSON objects carrying a `type` field. Unknown types are
//! logged and dropped without a reply.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::manager::GenerationManager;
use crate::network::Host;

/// A recognised control message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControlMessage {
    SkipWaiting,
    ClearCache,
    GetCacheStatus,
}

impl ControlMessage {
    /// Parse a raw message; `None` for anything unrecognised.
    pub fn parse(message: &Value) -> Option<Self> {
        match ControlMessage::deserialize(message) {
            Ok(command) => Some(command),
            Err(e) => {
                let message_type = message.get("type").and_then(Value::as_str);
                tracing::info!(?message_type, error = %e, "unknown control message");
                None
            }
        }
    }
}

/// Reply posted back on the caller's channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reply {
    Cleared { success: bool },
    Status { status: BTreeMap<String, u64> },
}

/// Execute `message` against the generation manager.
pub async fn handle(manager: &GenerationManager, host: &dyn Host, message: ControlMessage) -> Option<Reply> {
    match message {
        ControlMessage::SkipWaiting => {
            host.skip_waiting().await;
            None
        }
        ControlMessage::ClearCache => {
            let success = match manager.clear_all().await {
                Ok(_) => true,
                Err(e) => {
                    tracing::error!(error = %e, "failed to clear caches");
                    false
                }
            };
            Some(Reply::Cleared { success })
        }
        ControlMessage::GetCacheStatus => {
            let status = manager.status().await.unwrap_or_else(|e| {
                tracing::error!(error = %e, "failed to read cache status");
                BTreeMap::new()
            });
            Some(Reply::Status { status })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    use serde_json::json;

    use super::*;
    use crate::cache::CacheDb;
    use crate::http::{Request, Response};
    use crate::worker::testing::{MockNetwork, RecordingHost, url};

    async fn manager() -> (GenerationManager, Arc<RecordingHost>) {
        let db = CacheDb::open_in_memory().await.unwrap();
        let host = Arc::new(RecordingHost::default());
        (GenerationManager::new(db, Arc::new(MockNetwork::new()), host.clone()), host)
    }

    #[test]
    fn test_parse_known_messages() {
        assert_eq!(ControlMessage::parse(&json!({"type": "SKIP_WAITING"})), Some(ControlMessage::SkipWaiting));
        assert_eq!(ControlMessage::parse(&json!({"type": "CLEAR_CACHE"})), Some(ControlMessage::ClearCache));
        assert_eq!(
            ControlMessage::parse(&json!({"type": "GET_CACHE_STATUS", "payload": null})),
            Some(ControlMessage::GetCacheStatus)
        );
    }

    #[test]
    fn test_parse_unknown_messages() {
        assert_eq!(ControlMessage::parse(&json!({"type": "REFRESH"})), None);
        assert_eq!(ControlMessage::parse(&json!({"kind": "CLEAR_CACHE"})), None);
        assert_eq!(ControlMessage::parse(&json!("CLEAR_CACHE")), None);
        assert_eq!(ControlMessage::parse(&json!({"type": 7})), None);
        assert_eq!(ControlMessage::parse(&json!({"type": "clear_cache"})), None);
    }

    #[test]
    fn test_reply_wire_format() {
        let cleared = serde_json::to_value(Reply::Cleared { success: true }).unwrap();
        assert_eq!(cleared, json!({"success": true}));

        let status = Reply::Status { status: BTreeMap::from([("static".to_string(), 2)]) };
        assert_eq!(serde_json::to_value(status).unwrap(), json!({"status": {"static": 2}}));
    }

    #[tokio::test]
    async fn test_clear_cache_empties_store() {
        let (manager, host) = manager().await;
        for name in ["static-v1", "dynamic-v1"] {
            let generation = manager.ensure_generation(name).await.unwrap();
            manager.db().put_entry(&generation, &Request::get(url("/a")), &Response::new(200, "a")).await.unwrap();
        }

        let reply = handle(&manager, host.as_ref(), ControlMessage::ClearCache).await;

        assert_eq!(reply, Some(Reply::Cleared { success: true }));
        assert!(manager.list_generations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_cache_status() {
        let (manager, host) = manager().await;
        let shell = manager.ensure_generation("static").await.unwrap();
        let runtime = manager.ensure_generation("dynamic").await.unwrap();
        for path in ["/1", "/2"] {
            manager.db().put_entry(&shell, &Request::get(url(path)), &Response::new(200, "s")).await.unwrap();
        }
        for path in ["/3", "/4", "/5"] {
            manager.db().put_entry(&runtime, &Request::get(url(path)), &Response::new(200, "d")).await.unwrap();
        }

        let reply = handle(&manager, host.as_ref(), ControlMessage::GetCacheStatus).await;

        let expected = BTreeMap::from([("static".to_string(), 2), ("dynamic".to_string(), 3)]);
        assert_eq!(reply, Some(Reply::Status { status: expected }));
    }

    #[tokio::test]
    async fn test_skip_waiting_has_no_reply() {
        let (manager, host) = manager().await;
        let reply = handle(&manager, host.as_ref(), ControlMessage::SkipWaiting).await;
        assert_eq!(reply, None);
        assert_eq!(host.skip_waiting.load(Ordering::SeqCst), 1);
    }
}
