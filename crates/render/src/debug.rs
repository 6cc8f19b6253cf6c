use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DebugSeverity {
    Notification,
    Low,
    Medium,
    High,
}

/// A message from the backend's asynchronous debug channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugMessage {
    pub source: String,
    pub id: u32,
    pub severity: DebugSeverity,
    pub message: String,
}

/// Route a GPU debug message into the log. Diagnostic only.
pub fn log_debug_message(msg: &DebugMessage) {
    match msg.severity {
        DebugSeverity::High => {
            tracing::error!(source = %msg.source, id = msg.id, "gpu: {}", msg.message)
        }
        DebugSeverity::Medium => {
            tracing::warn!(source = %msg.source, id = msg.id, "gpu: {}", msg.message)
        }
        DebugSeverity::Low => {
            tracing::info!(source = %msg.source, id = msg.id, "gpu: {}", msg.message)
        }
        DebugSeverity::Notification => {
            tracing::trace!(source = %msg.source, id = msg.id, "gpu: {}", msg.message)
        }
    }
}
