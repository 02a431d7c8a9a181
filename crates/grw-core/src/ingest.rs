//! Inbound event classification and persistence.

use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dedup::{dedup_key, DedupWindow},
    domain::{value_as_i64, GiftEvent},
    normalize::normalize_update,
    ports::BackendPort,
    utils::{iso_timestamp_utc, truncate_text},
};

/// Classifies inbound platform updates and persists gift-received records.
///
/// Everything here is defensive: a malformed or unpersistable update is
/// logged and dropped, never allowed to take down the subscription loop.
pub struct GiftIngestor {
    backend: Arc<dyn BackendPort>,
}

impl GiftIngestor {
    pub fn new(backend: Arc<dyn BackendPort>) -> Self {
        Self { backend }
    }

    /// Handle one raw provider update. Infallible by contract.
    pub async fn handle_update(&self, dedup: &mut DedupWindow, raw: &Value) {
        let update = normalize_update(raw);
        if !is_message_shaped(&update) {
            return;
        }

        let message_id = update.get("id").map(json_id_string);
        let action = update.get("action");
        let action_type = action
            .and_then(|a| a.get("className"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let gift = action.and_then(|a| a.get("gift"));
        let gift_id = gift.and_then(|g| g.get("id")).map(json_id_string);

        let key = dedup_key(
            message_id.as_deref(),
            action_type.as_deref(),
            gift_id.as_deref(),
        );
        if dedup.seen(&key) {
            println!("[INGEST] duplicate delivery dropped: {key}");
            return;
        }
        dedup.remember(&key);

        // Message-shaped but not a gift notification: nothing to persist.
        let Some(gift) = gift else {
            return;
        };

        let event = build_gift_event(&update, gift);
        match self.backend.store_gift(&event).await {
            Ok(()) => println!(
                "[INGEST] stored gift {} ({})",
                event.uuid,
                event.collection_name.as_deref().unwrap_or("?")
            ),
            Err(e) => eprintln!(
                "[INGEST] failed to store gift record {}: {}",
                event.uuid,
                truncate_text(&e.to_string(), 300)
            ),
        }
    }
}

/// Cheap shape pre-filter run before any deeper parsing: message/action
/// top-level keys, or a constructor-name hint.
fn is_message_shaped(update: &Value) -> bool {
    let Some(obj) = update.as_object() else {
        return false;
    };
    if obj.contains_key("message") || obj.contains_key("action") {
        return true;
    }
    let hint = Regex::new(r"(?i)message|update|msg|action").expect("valid regex");
    obj.get("className")
        .and_then(Value::as_str)
        .map(|c| hint.is_match(c))
        .unwrap_or(false)
}

fn json_id_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn build_gift_event(update: &Value, gift: &Value) -> GiftEvent {
    let first_attribute_name = gift
        .get("attributes")
        .and_then(Value::as_array)
        .and_then(|xs| xs.first())
        .and_then(|a| a.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);

    GiftEvent {
        uuid: Uuid::new_v4().to_string(),
        telegram_message_id: update.get("id").and_then(value_as_i64),
        sender: update
            .get("peerId")
            .and_then(|p| p.get("userId"))
            .and_then(value_as_i64),
        collection_name: gift
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string),
        num: gift.get("num").and_then(value_as_i64),
        model: first_attribute_name,
        gift_id_long: gift.get("id").map(json_id_string),
        gift_slug: gift.get("slug").and_then(Value::as_str).map(str::to_string),
        saved_id: update
            .get("action")
            .and_then(|a| a.get("saved_id").or_else(|| a.get("savedId")))
            .map(json_id_string),
        created_at: iso_timestamp_utc(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeBackend;
    use serde_json::json;

    fn gift_update(msg_id: i64, gift_id: &str) -> Value {
        json!({
            "className": "UpdateNewMessage",
            "id": msg_id,
            "peerId": { "className": "PeerUser", "userId": { "value": "12345" } },
            "action": {
                "className": "MessageActionStarGiftUnique",
                "saved_id": { "value": "999000111" },
                "gift": {
                    "className": "StarGiftUnique",
                    "id": { "value": gift_id },
                    "title": "Astral Shard",
                    "slug": "AstralShard-777",
                    "num": 777,
                    "attributes": [
                        { "name": "Nebula", "rarity_permille": 5 },
                        { "name": "Onyx", "rarity_permille": 12 }
                    ]
                }
            }
        })
    }

    #[tokio::test]
    async fn persists_one_record_per_unique_delivery() {
        let backend = Arc::new(FakeBackend::default());
        let ingestor = GiftIngestor::new(backend.clone());
        let mut dedup = DedupWindow::new(100);

        let update = gift_update(42, "5168043875654172773");
        ingestor.handle_update(&mut dedup, &update).await;
        ingestor.handle_update(&mut dedup, &update).await;

        assert_eq!(backend.stored().len(), 1);

        ingestor
            .handle_update(&mut dedup, &gift_update(43, "5168043875654172773"))
            .await;
        assert_eq!(backend.stored().len(), 2);
    }

    #[tokio::test]
    async fn extracts_gift_fields_from_normalized_update() {
        let backend = Arc::new(FakeBackend::default());
        let ingestor = GiftIngestor::new(backend.clone());
        let mut dedup = DedupWindow::new(100);

        ingestor
            .handle_update(&mut dedup, &gift_update(42, "5168043875654172773"))
            .await;

        let stored = backend.stored();
        let event = &stored[0];
        assert_eq!(event.telegram_message_id, Some(42));
        assert_eq!(event.sender, Some(12345));
        assert_eq!(event.collection_name.as_deref(), Some("Astral Shard"));
        assert_eq!(event.num, Some(777));
        assert_eq!(event.model.as_deref(), Some("Nebula"));
        assert_eq!(event.gift_id_long.as_deref(), Some("5168043875654172773"));
        assert_eq!(event.gift_slug.as_deref(), Some("AstralShard-777"));
        assert_eq!(event.saved_id.as_deref(), Some("999000111"));
        assert!(!event.uuid.is_empty());
    }

    #[tokio::test]
    async fn ignores_updates_that_are_not_message_shaped() {
        let backend = Arc::new(FakeBackend::default());
        let ingestor = GiftIngestor::new(backend.clone());
        let mut dedup = DedupWindow::new(100);

        ingestor
            .handle_update(&mut dedup, &json!({ "className": "ChatFull", "id": 1 }))
            .await;
        ingestor.handle_update(&mut dedup, &json!("scalar")).await;

        assert!(backend.stored().is_empty());
        assert!(dedup.is_empty());
    }

    #[tokio::test]
    async fn message_without_gift_consumes_dedup_slot_but_stores_nothing() {
        let backend = Arc::new(FakeBackend::default());
        let ingestor = GiftIngestor::new(backend.clone());
        let mut dedup = DedupWindow::new(100);

        let update = json!({ "id": 9, "message": "hello", "peerId": { "userId": 1 } });
        ingestor.handle_update(&mut dedup, &update).await;

        assert!(backend.stored().is_empty());
        assert_eq!(dedup.len(), 1);
    }

    #[tokio::test]
    async fn store_failures_are_swallowed() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_fail_store(true);
        let ingestor = GiftIngestor::new(backend.clone());
        let mut dedup = DedupWindow::new(100);

        ingestor
            .handle_update(&mut dedup, &gift_update(42, "1"))
            .await;

        assert!(backend.stored().is_empty());
        // The delivery is still remembered; persistence is not retried.
        assert_eq!(dedup.len(), 1);
    }

    #[test]
    fn shape_filter_accepts_constructor_name_hints() {
        assert!(is_message_shaped(&json!({ "className": "UpdateShortMessage" })));
        assert!(is_message_shaped(&json!({ "action": {} })));
        assert!(is_message_shaped(&json!({ "message": "x" })));
        assert!(!is_message_shaped(&json!({ "className": "ChatFull" })));
        assert!(!is_message_shaped(&json!(42)));
    }
}
