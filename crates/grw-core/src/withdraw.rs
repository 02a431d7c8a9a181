//! Operator withdrawal batches.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    domain::{CompensationNotice, GiftDescriptor, TransferResult, WithdrawalRequest},
    errors::Error,
    ports::{BackendPort, GiftTransport},
    transfer::{transfer_one, TransferErrorKind, TransferFailure},
    utils::{iso_timestamp_utc, truncate_text},
    Result,
};

/// Hard cap on gifts per batch; oversized batches are rejected before any
/// remote call.
pub const MAX_BATCH_GIFTS: usize = 15;

/// Executes operator withdrawal batches.
///
/// Compensation is strictly best-effort: one attempt per failed item, no
/// retry, no durable outbox. If the compensation endpoint is down, the
/// affected inventory correction is lost until the backend reconciles on
/// its own.
pub struct WithdrawHandler {
    transport: Arc<dyn GiftTransport>,
    backend: Arc<dyn BackendPort>,
    max_batch: usize,
}

impl WithdrawHandler {
    pub fn new(
        transport: Arc<dyn GiftTransport>,
        backend: Arc<dyn BackendPort>,
        max_batch: usize,
    ) -> Self {
        Self {
            transport,
            backend,
            max_batch,
        }
    }

    /// Validate and execute one batch, returning one result per gift in
    /// input order. Validation failures reject the whole batch up front;
    /// after that, one item's failure never stops its siblings.
    pub async fn withdraw(&self, payload: &Value) -> Result<Vec<TransferResult>> {
        let req: WithdrawalRequest = serde_json::from_value(payload.clone())
            .map_err(|e| Error::Validation(format!("malformed withdraw payload: {e}")))?;

        let recipient = match req.recipient {
            Some(r) if !r.is_null() => r,
            _ => return Err(Error::Validation("recipient is required".to_string())),
        };
        let gifts = match req.gifts.as_ref().and_then(Value::as_array) {
            Some(xs) => xs,
            None => return Err(Error::Validation("gifts must be an array".to_string())),
        };
        if gifts.len() > self.max_batch {
            return Err(Error::BatchTooLarge(format!(
                "{} gifts exceeds the limit of {}",
                gifts.len(),
                self.max_batch
            )));
        }

        println!(
            "[WITHDRAW] batch {} with {} gift(s)",
            req.request_id.as_deref().unwrap_or("-"),
            gifts.len()
        );

        let owner = req.requester_telegram.clone().unwrap_or(Value::Null);
        Ok(self.run_batch_sequential(&recipient, &owner, gifts).await)
    }

    /// Transfers run strictly one at a time, in input order.
    ///
    /// The serialization is deliberate, not incidental: transfers are
    /// stateful remote operations scoped to the one controlling account,
    /// and interleaving them trips remote rate limits and reorders
    /// payment-form state. Do not turn this into concurrent calls.
    async fn run_batch_sequential(
        &self,
        recipient: &Value,
        owner: &Value,
        gifts: &[Value],
    ) -> Vec<TransferResult> {
        let mut results = Vec::with_capacity(gifts.len());
        for raw in gifts {
            results.push(self.transfer_item(recipient, owner, raw).await);
        }
        results
    }

    async fn transfer_item(&self, recipient: &Value, owner: &Value, raw: &Value) -> TransferResult {
        let gift: GiftDescriptor = match serde_json::from_value(raw.clone()) {
            Ok(g) => g,
            Err(e) => {
                let failure = TransferFailure::new(
                    TransferErrorKind::Unknown,
                    format!("malformed gift entry: {e}"),
                );
                return self
                    .fail_item(owner, &GiftDescriptor::default(), label_of_raw(raw), failure)
                    .await;
            }
        };

        let label = gift.label();
        match transfer_one(self.transport.as_ref(), &gift, recipient).await {
            Ok(payload) => {
                println!("[WITHDRAW] transferred {label}");
                TransferResult {
                    gift: label,
                    ok: true,
                    error: None,
                    result: Some(payload),
                }
            }
            Err(failure) => self.fail_item(owner, &gift, label, failure).await,
        }
    }

    /// Record the failure and fire the single compensation attempt. The
    /// notice outcome never changes the result already computed.
    async fn fail_item(
        &self,
        owner: &Value,
        gift: &GiftDescriptor,
        label: String,
        failure: TransferFailure,
    ) -> TransferResult {
        let reason = failure.render();
        eprintln!(
            "[WITHDRAW] transfer failed for {label}: {}",
            truncate_text(&reason, 300)
        );

        let notice = CompensationNotice {
            owner_telegram: owner.clone(),
            gift: gift.summary(),
            reason: reason.clone(),
            attempted_at: iso_timestamp_utc(),
        };
        if let Err(e) = self.backend.notify_transfer_failed(&notice).await {
            eprintln!("[WITHDRAW] compensation notice for {label} failed (not retried): {e}");
        }

        TransferResult {
            gift: label,
            ok: false,
            error: Some(reason),
            result: None,
        }
    }
}

fn label_of_raw(raw: &Value) -> String {
    raw.get("uuid")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "(unknown)".to_string())
}
