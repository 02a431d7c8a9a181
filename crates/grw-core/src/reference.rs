//! Gift reference construction.
//!
//! The remote protocol accepts three encodings for "which gift": a
//! message-scoped reference (freshest, most specific), a saved-id pinned to
//! a chat peer, and a catalog slug (least specific). They are tried in that
//! priority order; the first usable one wins.

use serde_json::{Map, Value};

use crate::{
    domain::{value_as_i64, GiftDescriptor, GiftRef, PeerRef},
    errors::Error,
    Result,
};

/// Build the remote reference for a gift descriptor.
pub fn resolve_reference(gift: &GiftDescriptor) -> Result<GiftRef> {
    if let Some(id) = gift.telegram_message_id.as_ref().and_then(|r| r.as_i64()) {
        return Ok(GiftRef::Message { message_id: id });
    }

    if let Some(saved) = &gift.saved_id {
        if let Some(obj) = gift.peer.as_ref().and_then(Value::as_object) {
            let peer = peer_from_object(obj).unwrap_or(PeerRef::Empty);
            return Ok(GiftRef::Saved {
                peer,
                saved_id: saved.to_string(),
            });
        }
    }

    if let Some(slug) = gift.slug.as_deref().filter(|s| !s.trim().is_empty()) {
        return Ok(GiftRef::Slug {
            slug: slug.to_string(),
        });
    }

    Err(Error::Reference(
        "need telegram_message_id, saved_id with a structured peer, or slug".to_string(),
    ))
}

/// Coerce a peer-shaped object into a peer reference: user id first, then
/// chat id. Returns None when neither id is present.
pub fn peer_from_object(obj: &Map<String, Value>) -> Option<PeerRef> {
    if let Some(id) = obj
        .get("userId")
        .or_else(|| obj.get("user_id"))
        .and_then(value_as_i64)
    {
        return Some(PeerRef::User { user_id: id });
    }
    if let Some(id) = obj
        .get("chatId")
        .or_else(|| obj.get("chat_id"))
        .and_then(value_as_i64)
    {
        return Some(PeerRef::Chat { chat_id: id });
    }
    None
}
