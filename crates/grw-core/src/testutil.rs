//! Hand-rolled fakes shared by the unit tests.

use std::{
    collections::VecDeque,
    sync::Mutex,
};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::{
    domain::{CompensationNotice, GiftEvent, GiftRef, PeerRef, TransferInvoice},
    errors::Error,
    ports::{BackendPort, GiftTransport},
    Result,
};

/// Scripted transport fake: queued results pop per call, with permissive
/// defaults when a queue runs dry.
#[derive(Default)]
pub struct FakeTransport {
    resolve_results: Mutex<VecDeque<Result<PeerRef>>>,
    form_results: Mutex<VecDeque<Result<Value>>>,
    send_results: Mutex<VecDeque<Result<Value>>>,
    direct_results: Mutex<VecDeque<Result<Value>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn push_resolve(&self, r: Result<PeerRef>) {
        self.resolve_results.lock().unwrap().push_back(r);
    }

    pub fn push_form(&self, r: Result<Value>) {
        self.form_results.lock().unwrap().push_back(r);
    }

    pub fn push_send(&self, r: Result<Value>) {
        self.send_results.lock().unwrap().push_back(r);
    }

    pub fn push_direct(&self, r: Result<Value>) {
        self.direct_results.lock().unwrap().push_back(r);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }
}

#[async_trait]
impl GiftTransport for FakeTransport {
    async fn resolve_peer(&self, _query: &str) -> Result<PeerRef> {
        self.record("resolve_peer");
        self.resolve_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(PeerRef::User { user_id: 777 }))
    }

    async fn get_payment_form(&self, _invoice: &TransferInvoice) -> Result<Value> {
        self.record("get_payment_form");
        self.form_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "formId": 42 })))
    }

    async fn send_stars_form(&self, form_id: i64, _invoice: &TransferInvoice) -> Result<Value> {
        self.record("send_stars_form");
        self.send_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "paid": true, "formId": form_id })))
    }

    async fn transfer_gift(&self, _gift: &GiftRef, _to: &PeerRef) -> Result<Value> {
        self.record("transfer_gift");
        self.direct_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "transferred": true })))
    }
}

/// Recording backend fake with switchable failure modes.
#[derive(Default)]
pub struct FakeBackend {
    stored: Mutex<Vec<GiftEvent>>,
    notices: Mutex<Vec<CompensationNotice>>,
    fail_store: Mutex<bool>,
    fail_notify: Mutex<bool>,
}

impl FakeBackend {
    pub fn stored(&self) -> Vec<GiftEvent> {
        self.stored.lock().unwrap().clone()
    }

    pub fn notices(&self) -> Vec<CompensationNotice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn set_fail_store(&self, fail: bool) {
        *self.fail_store.lock().unwrap() = fail;
    }

    pub fn set_fail_notify(&self, fail: bool) {
        *self.fail_notify.lock().unwrap() = fail;
    }
}

#[async_trait]
impl BackendPort for FakeBackend {
    async fn store_gift(&self, event: &GiftEvent) -> Result<()> {
        if *self.fail_store.lock().unwrap() {
            return Err(Error::External("record store unavailable".to_string()));
        }
        self.stored.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn notify_transfer_failed(&self, notice: &CompensationNotice) -> Result<()> {
        if *self.fail_notify.lock().unwrap() {
            return Err(Error::External(
                "compensation endpoint unavailable".to_string(),
            ));
        }
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}
