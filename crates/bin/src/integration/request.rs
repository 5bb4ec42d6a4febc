//! Answer one wire-format simulation request.

use serde_json::{Value, json};
use tailrisk::risk::{SimulationLimits, SimulationRequest, VarWorker};
use tracing::warn;

/// Parse, compute and render a request as a JSON response.
///
/// Every outcome is a response: failures become `{"ok": false, "error": ..}`.
pub(crate) async fn respond(body: &str, limits: SimulationLimits, seed: Option<u64>) -> Value {
    let request: SimulationRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return failure(format!("malformed request: {}", e)),
    };

    let worker = VarWorker::new(seed).with_limits(limits);
    match worker.submit(request).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(Value::Object(mut fields)) => {
                fields.insert("ok".to_string(), Value::Bool(true));
                Value::Object(fields)
            }
            Ok(other) => failure(format!("unexpected result shape: {}", other)),
            Err(e) => failure(e.to_string()),
        },
        Err(e) => failure(e.to_string()),
    }
}

fn failure(message: String) -> Value {
    warn!(error = %message, "request failed");
    json!({ "ok": false, "error": message })
}
