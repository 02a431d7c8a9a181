//! Outbound transfer orchestration.
//!
//! One gift, one recipient, one pass through the remote payment protocol:
//! build the gift reference, resolve the recipient, negotiate a payment
//! form (falling back to a direct transfer when none applies), finalize.
//! Every failure is folded into a classified `TransferFailure`; nothing
//! here propagates a raw transport fault to the caller.

use serde_json::Value;

use crate::{
    domain::{value_as_i64, GiftDescriptor, PeerRef, TransferInvoice},
    ports::GiftTransport,
    reference::{peer_from_object, resolve_reference},
    utils::truncate_text,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferErrorKind {
    ReferenceBuild,
    Resolution,
    BalanceTooLow,
    RecipientInvalid,
    NotTransferableYet,
    RecipientRejects,
    DirectTransferFailed,
    Unknown,
}

impl TransferErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransferErrorKind::ReferenceBuild => "REFERENCE_BUILD_ERROR",
            TransferErrorKind::Resolution => "RESOLUTION_ERROR",
            TransferErrorKind::BalanceTooLow => "BALANCE_TOO_LOW",
            TransferErrorKind::RecipientInvalid => "RECIPIENT_INVALID_OR_UNREACHABLE",
            TransferErrorKind::NotTransferableYet => "GIFT_NOT_TRANSFERABLE_YET",
            TransferErrorKind::RecipientRejects => "RECIPIENT_REJECTS_GIFTS_OR_PRIVACY_BLOCK",
            TransferErrorKind::DirectTransferFailed => "DIRECT_TRANSFER_FAILED",
            TransferErrorKind::Unknown => "UNKNOWN_TRANSFER_ERROR",
        }
    }
}

/// A classified, terminal transfer failure.
#[derive(Clone, Debug)]
pub struct TransferFailure {
    pub kind: TransferErrorKind,
    pub detail: String,
}

impl TransferFailure {
    pub fn new(kind: TransferErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    /// Operator-facing rendering, e.g. `BALANCE_TOO_LOW: STARGIFT...`.
    pub fn render(&self) -> String {
        format!("{}: {}", self.kind.as_str(), self.detail)
    }
}

/// Classify a provider error message.
///
/// The upstream protocol exposes no structured error codes; ordered
/// case-insensitive substring matching on the human-readable text is the
/// only signal available. First match wins.
pub fn classify_transfer_error(message: &str) -> TransferErrorKind {
    let m = message.to_lowercase();

    const RULES: &[(&[&str], TransferErrorKind)] = &[
        (
            &["balance_too_low", "insufficient", "not enough"],
            TransferErrorKind::BalanceTooLow,
        ),
        (
            &[
                "peer_id_invalid",
                "user_id_invalid",
                "username_not_occupied",
                "user not found",
                "deactivated",
            ],
            TransferErrorKind::RecipientInvalid,
        ),
        (
            &["transfer_too_early", "too early"],
            TransferErrorKind::NotTransferableYet,
        ),
        (
            &["forbidden", "private", "restricted", "not allowed", "privacy"],
            TransferErrorKind::RecipientRejects,
        ),
    ];

    for (patterns, kind) in RULES {
        if patterns.iter().any(|p| m.contains(p)) {
            return *kind;
        }
    }
    TransferErrorKind::Unknown
}

/// Drive the full transfer protocol for one gift to one recipient.
pub async fn transfer_one(
    transport: &dyn GiftTransport,
    gift: &GiftDescriptor,
    recipient: &Value,
) -> std::result::Result<Value, TransferFailure> {
    let gift_ref = resolve_reference(gift)
        .map_err(|e| TransferFailure::new(TransferErrorKind::ReferenceBuild, e.to_string()))?;

    let to = resolve_recipient(transport, recipient).await?;

    let invoice = TransferInvoice {
        gift: gift_ref.clone(),
        to: to.clone(),
    };

    let form = match transport.get_payment_form(&invoice).await {
        Ok(form) => form,
        Err(e) => {
            // The payment subsystem refusing a form means the transfer is
            // free; fall through to the direct path.
            println!(
                "[TRANSFER] no payment form ({}), trying direct transfer",
                truncate_text(&e.to_string(), 200)
            );
            return transport.transfer_gift(&gift_ref, &to).await.map_err(|e| {
                TransferFailure::new(TransferErrorKind::DirectTransferFailed, e.to_string())
            });
        }
    };

    let Some(form_id) = form_id_of(&form) else {
        // Nothing to finalize: upstream hands back id-less forms for
        // zero-cost transfers and the form response doubles as the result.
        // TODO: confirm with the provider that this cannot mask a dropped
        // transfer; see the open-question notes in DESIGN.md.
        return Ok(form);
    };

    match transport.send_stars_form(form_id, &invoice).await {
        Ok(payload) => Ok(payload),
        Err(e) => {
            let msg = e.to_string();
            Err(TransferFailure::new(classify_transfer_error(&msg), msg))
        }
    }
}

/// Resolve the batch recipient: directory lookup for identifier strings,
/// with a fallback to treating an already-peer-shaped object as resolved.
async fn resolve_recipient(
    transport: &dyn GiftTransport,
    recipient: &Value,
) -> std::result::Result<PeerRef, TransferFailure> {
    if let Some(query) = recipient.as_str() {
        match transport.resolve_peer(query).await {
            Ok(peer) => return Ok(peer),
            Err(e) => {
                eprintln!("[TRANSFER] recipient lookup failed for {query}: {e}");
            }
        }
    }

    if let Some(obj) = recipient.as_object() {
        if let Some(peer) = peer_from_object(obj) {
            return Ok(peer);
        }
    }

    Err(TransferFailure::new(
        TransferErrorKind::Resolution,
        format!("could not resolve recipient {recipient}"),
    ))
}

fn form_id_of(form: &Value) -> Option<i64> {
    form.get("formId")
        .or_else(|| form.get("form_id"))
        .and_then(value_as_i64)
}
