//! Shared types for log-history snapshots.
//!
//! These types match the JSON envelope served by the master's `/` route.
//! They are the common data format between the master producer and this
//! dashboard consumer.

use serde::{Deserialize, Serialize};

/// A complete snapshot of the master's rolling log history.
pub type LogHistory = Vec<LogEntry>;

/// Top-level envelope returned by `GET {base}/`.
///
/// All fields other than `logs_history` are ignored; a missing field
/// deserializes to an empty history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryEnvelope {
    #[serde(default)]
    pub logs_history: LogHistory,
}

/// One processed request record with its classification outcome.
///
/// Every field is optional on the wire: the master appends entries as soon
/// as a log is dispatched and fills in the prediction fields only once the
/// worker reports back.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogEntry {
    /// The raw request record, as dispatched to the worker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<RawLog>,

    /// Classification label reported by the worker ("Normal" or an attack
    /// label).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<String>,

    /// URL or hostname of the worker that processed this entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker: Option<String>,

    /// Classifier confidence in [0, 1].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Whether the prediction matched the ground-truth category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,

    /// Worker-side processing time in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_time: Option<f64>,

    /// ISO-8601 timestamp of when the master dispatched the log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<String>,
}

/// The raw request record carried inside a [`LogEntry`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLog {
    /// Request payload (body or query string).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,

    /// Request endpoint/path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Timestamp recorded by the log generator.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Ground-truth category, used as a fallback classification when no
    /// prediction has arrived yet.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub real_category: Option<String>,
}
