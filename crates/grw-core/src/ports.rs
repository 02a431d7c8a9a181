use async_trait::async_trait;
use serde_json::Value;

use crate::{
    domain::{CompensationNotice, GiftEvent, GiftRef, PeerRef, TransferInvoice},
    Result,
};

/// Remote wire protocol for gift transfers, implemented by the platform
/// adapter holding the authenticated session.
///
/// Success payloads are opaque provider objects; failures carry the
/// provider's human-readable message (`Error::Rpc`), which is the only
/// signal available for classification.
#[async_trait]
pub trait GiftTransport: Send + Sync {
    /// Directory lookup: resolve a username or id string to a peer.
    async fn resolve_peer(&self, query: &str) -> Result<PeerRef>;

    /// Ask the payment subsystem whether this transfer needs a paid form.
    /// An error here means "no form applies", not a fatal fault.
    async fn get_payment_form(&self, invoice: &TransferInvoice) -> Result<Value>;

    /// Finalize payment against a previously returned form.
    async fn send_stars_form(&self, form_id: i64, invoice: &TransferInvoice) -> Result<Value>;

    /// Free/direct transfer path used when no payment form applies.
    async fn transfer_gift(&self, gift: &GiftRef, to: &PeerRef) -> Result<Value>;
}

/// Record-of-truth backend, consulted via exactly two calls.
#[async_trait]
pub trait BackendPort: Send + Sync {
    async fn store_gift(&self, event: &GiftEvent) -> Result<()>;
    async fn notify_transfer_failed(&self, notice: &CompensationNotice) -> Result<()>;
}
