//! The standing worker: one logical task fed by two inbound sources.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    dedup::DedupWindow,
    dispatch::{CommandDispatcher, CommandReply},
    ingest::GiftIngestor,
    ports::{BackendPort, GiftTransport},
    withdraw::WithdrawHandler,
};

/// Owns the dedup window and drives ingestion and command dispatch.
///
/// Updates and commands interleave at await points only; every dedup
/// mutation is a synchronous step between awaits, so the window needs no
/// locking.
pub struct Worker {
    dedup: DedupWindow,
    ingestor: GiftIngestor,
    dispatcher: CommandDispatcher,
}

impl Worker {
    /// The dedup window is constructed by the caller and injected so its
    /// bound is visible at startup and fakes can take its place in tests.
    pub fn new(
        cfg: &Config,
        dedup: DedupWindow,
        transport: Arc<dyn GiftTransport>,
        backend: Arc<dyn BackendPort>,
    ) -> Self {
        let withdraw = WithdrawHandler::new(transport, backend.clone(), cfg.max_withdraw_batch);
        Self {
            dedup,
            ingestor: GiftIngestor::new(backend),
            dispatcher: CommandDispatcher::new(withdraw),
        }
    }

    /// Run until `shutdown` fires or an inbound channel closes.
    ///
    /// There is no cancellation for an in-flight batch: once a `withdraw`
    /// command is picked up it runs to completion before the next message
    /// is read.
    pub async fn run(
        mut self,
        mut updates: mpsc::UnboundedReceiver<Value>,
        mut commands: mpsc::UnboundedReceiver<Value>,
        replies: mpsc::UnboundedSender<CommandReply>,
        shutdown: CancellationToken,
    ) {
        println!(
            "[WORKER] started (dedup window bound: {})",
            self.dedup.capacity()
        );
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    println!("[WORKER] shutdown requested");
                    break;
                }
                maybe = updates.recv() => {
                    let Some(raw) = maybe else {
                        println!("[WORKER] update stream closed");
                        break;
                    };
                    self.ingestor.handle_update(&mut self.dedup, &raw).await;
                }
                maybe = commands.recv() => {
                    let Some(raw) = maybe else {
                        println!("[WORKER] command channel closed");
                        break;
                    };
                    if let Some(reply) = self.dispatcher.dispatch(&raw).await {
                        if replies.send(reply).is_err() {
                            println!("[WORKER] reply channel closed");
                            break;
                        }
                    }
                }
            }
        }
    }
}
