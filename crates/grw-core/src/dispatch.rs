//! Operator command dispatch.

use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    domain::GiftDescriptor,
    errors::Error,
    reference::resolve_reference,
    utils::iso_timestamp_utc,
    withdraw::WithdrawHandler,
    Result,
};

/// Reply envelope correlated to a command by its request id.
#[derive(Clone, Debug, Serialize)]
pub struct CommandReply {
    #[serde(rename = "replyTo")]
    pub reply_to: Value,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Routes operator commands to handlers. Every handler failure folds into
/// an `ok:false` reply; nothing escapes to the worker loop.
pub struct CommandDispatcher {
    withdraw: WithdrawHandler,
}

impl CommandDispatcher {
    pub fn new(withdraw: WithdrawHandler) -> Self {
        Self { withdraw }
    }

    /// Dispatch one inbound message. Returns `None` for malformed messages
    /// (no `cmd`), which are dropped without a reply.
    pub async fn dispatch(&self, raw: &Value) -> Option<CommandReply> {
        let Some(cmd) = raw.get("cmd").and_then(Value::as_str) else {
            eprintln!("[CMD] dropping inbound message without cmd");
            return None;
        };
        let id = raw.get("id").cloned().unwrap_or(Value::Null);
        let payload = raw.get("payload").cloned().unwrap_or(Value::Null);

        let reply = match self.execute(cmd, &payload).await {
            Ok(result) => CommandReply {
                reply_to: id,
                ok: true,
                result: Some(result),
                error: None,
            },
            Err(e) => {
                eprintln!("[CMD] {cmd} failed: {e}");
                CommandReply {
                    reply_to: id,
                    ok: false,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        };
        Some(reply)
    }

    async fn execute(&self, cmd: &str, payload: &Value) -> Result<Value> {
        match cmd {
            "ping" => Ok(json!({ "pong": true, "at": iso_timestamp_utc() })),
            "manualTrigger" => Ok(dry_run_record(payload)),
            "withdraw" => {
                let results = self.withdraw.withdraw(payload).await?;
                Ok(json!({ "ok": true, "results": results }))
            }
            other => Err(Error::UnknownCommand(other.to_string())),
        }
    }
}

/// Diagnostic for `manualTrigger`: reports what a withdrawal of this
/// payload would do, without a single call to the transfer protocol.
fn dry_run_record(payload: &Value) -> Value {
    let gifts = payload
        .get("gifts")
        .and_then(Value::as_array)
        .map(|xs| {
            xs.iter()
                .map(|raw| {
                    let Ok(gift) = serde_json::from_value::<GiftDescriptor>(raw.clone()) else {
                        return json!({ "gift": "(unknown)", "reference": "malformed gift entry" });
                    };
                    let reference = match resolve_reference(&gift) {
                        Ok(r) => serde_json::to_value(&r).unwrap_or(Value::Null),
                        Err(e) => Value::String(e.to_string()),
                    };
                    json!({ "gift": gift.label(), "reference": reference })
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    json!({
        "dryRun": true,
        "at": iso_timestamp_utc(),
        "recipient": payload.get("recipient").cloned().unwrap_or(Value::Null),
        "gifts": gifts,
    })
}
