use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An identifier that upstream JSON may carry as a number or a string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Str(String),
}

impl RawId {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            RawId::Int(n) => Some(*n),
            RawId::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Int(n) => write!(f, "{n}"),
            RawId::Str(s) => f.write_str(s),
        }
    }
}

/// Coerce a JSON value into an i64, accepting numbers and decimal strings.
pub fn value_as_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A resolved remote peer, in the encodings the wire protocol accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PeerRef {
    User { user_id: i64 },
    Chat { chat_id: i64 },
    /// Placeholder used when a structured peer object carries no id.
    Empty,
}

/// One of three mutually-exclusive remote encodings of a specific gift.
///
/// Message-scoped is the freshest and most specific; the slug is a stable
/// catalog identifier of last resort.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GiftRef {
    Message { message_id: i64 },
    Saved { peer: PeerRef, saved_id: String },
    Slug { slug: String },
}

/// What the payment subsystem is asked to cover: this gift to this peer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransferInvoice {
    pub gift: GiftRef,
    pub to: PeerRef,
}

/// Persisted record of one gift received by the controlled account.
///
/// Created exactly once per unique dedup key and never mutated; the
/// ingestion path is its only owner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GiftEvent {
    pub uuid: String,
    pub telegram_message_id: Option<i64>,
    pub sender: Option<i64>,
    pub collection_name: Option<String>,
    pub num: Option<i64>,
    pub model: Option<String>,
    /// Stringified to avoid precision loss on 64-bit gift ids.
    pub gift_id_long: Option<String>,
    pub gift_slug: Option<String>,
    pub saved_id: Option<String>,
    pub created_at: String,
}

/// One gift to be transferred, as named in an operator batch.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GiftDescriptor {
    pub uuid: Option<String>,
    /// Older operator payloads carry `message_id`; it feeds the result
    /// label only. Reference building reads `telegram_message_id`.
    pub message_id: Option<RawId>,
    pub telegram_message_id: Option<RawId>,
    pub gift_id_long: Option<RawId>,
    pub slug: Option<String>,
    pub saved_id: Option<RawId>,
    pub peer: Option<Value>,
    #[serde(alias = "collection_name")]
    pub name: Option<String>,
    pub model: Option<String>,
    pub number: Option<i64>,
    pub value: Option<i64>,
}

impl GiftDescriptor {
    /// Operator-facing label used in results and logs.
    pub fn label(&self) -> String {
        if let Some(u) = self.uuid.as_deref().filter(|u| !u.is_empty()) {
            return u.to_string();
        }
        if let Some(id) = &self.message_id {
            return id.to_string();
        }
        "(unknown)".to_string()
    }

    /// Normalized subset sent along with a compensation notice.
    pub fn summary(&self) -> GiftSummary {
        GiftSummary {
            uuid: self.uuid.clone(),
            telegram_message_id: self.telegram_message_id.clone(),
            slug: self.slug.clone(),
            saved_id: self.saved_id.clone(),
            name: self.name.clone(),
            model: self.model.clone(),
            number: self.number,
            value: self.value,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct GiftSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_message_id: Option<RawId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_id: Option<RawId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

/// Operator withdrawal batch, as received in a `withdraw` command payload.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct WithdrawalRequest {
    #[serde(rename = "requestId")]
    pub request_id: Option<String>,
    pub recipient: Option<Value>,
    pub requester_telegram: Option<Value>,
    pub gifts: Option<Value>,
}

/// Per-gift outcome of a batch; exactly one per input gift, in input order.
#[derive(Clone, Debug, Serialize)]
pub struct TransferResult {
    pub gift: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
}

/// Tells the record-of-truth backend to reverse its optimistic inventory
/// change after a failed transfer. Fire-and-forget.
#[derive(Clone, Debug, Serialize)]
pub struct CompensationNotice {
    pub owner_telegram: Value,
    pub gift: GiftSummary,
    pub reason: String,
    pub attempted_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_id_accepts_number_or_string() {
        let a: RawId = serde_json::from_value(json!(42)).unwrap();
        let b: RawId = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(a.as_i64(), Some(42));
        assert_eq!(b.as_i64(), Some(42));
        assert_eq!(a.to_string(), "42");
        assert_eq!(b.to_string(), "42");
    }

    #[test]
    fn label_prefers_uuid_then_legacy_message_id() {
        let g: GiftDescriptor =
            serde_json::from_value(json!({ "uuid": "u-1", "message_id": 7 })).unwrap();
        assert_eq!(g.label(), "u-1");

        let g: GiftDescriptor = serde_json::from_value(json!({ "message_id": 7 })).unwrap();
        assert_eq!(g.label(), "7");

        let g: GiftDescriptor =
            serde_json::from_value(json!({ "telegram_message_id": 42 })).unwrap();
        assert_eq!(g.label(), "(unknown)");
    }

    #[test]
    fn descriptor_accepts_collection_name_alias() {
        let g: GiftDescriptor =
            serde_json::from_value(json!({ "collection_name": "Astral Shard" })).unwrap();
        assert_eq!(g.name.as_deref(), Some("Astral Shard"));
    }

    #[test]
    fn value_as_i64_handles_numbers_and_decimal_strings() {
        assert_eq!(value_as_i64(&json!(9)), Some(9));
        assert_eq!(value_as_i64(&json!("9")), Some(9));
        assert_eq!(value_as_i64(&json!("x")), None);
        assert_eq!(value_as_i64(&json!(null)), None);
    }

    #[test]
    fn gift_ref_serializes_with_type_tag() {
        let r = GiftRef::Message { message_id: 5 };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v, json!({ "type": "message", "message_id": 5 }));
    }
}
