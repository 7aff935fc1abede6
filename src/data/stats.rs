//! Log-history aggregation.
//!
//! This module transforms a raw log-history snapshot into the derived
//! statistics record the dashboard renders. The whole record is rebuilt
//! from scratch on every refresh cycle; nothing here persists across
//! cycles.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Utc};

use super::worker::worker_display_name;
use crate::source::LogEntry;

/// Maximum number of recent-attack summaries kept per cycle.
pub const RECENT_ATTACKS_LIMIT: usize = 10;

/// Description shown for attacks whose entry carries neither payload nor
/// endpoint.
const NO_PAYLOAD_PLACEHOLDER: &str = "Pas de payload";

/// The fixed set of attack categories the classifier emits.
///
/// Any other non-"Normal" label still counts toward the attack total but
/// is not attributed to a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttackType {
    SqlInjection,
    Xss,
    CommandInjection,
    PathTraversal,
    SuspiciousUserAgent,
}

impl AttackType {
    /// All categories, in display order.
    pub const ALL: [AttackType; 5] = [
        AttackType::SqlInjection,
        AttackType::Xss,
        AttackType::CommandInjection,
        AttackType::PathTraversal,
        AttackType::SuspiciousUserAgent,
    ];

    /// The classifier's wire label for this category.
    pub fn label(&self) -> &'static str {
        match self {
            AttackType::SqlInjection => "SQLi",
            AttackType::Xss => "XSS",
            AttackType::CommandInjection => "CommandInjection",
            AttackType::PathTraversal => "PathTraversal",
            AttackType::SuspiciousUserAgent => "SuspiciousUA",
        }
    }

    /// Short label for narrow table columns.
    pub fn short_label(&self) -> &'static str {
        match self {
            AttackType::SqlInjection => "SQLi",
            AttackType::Xss => "XSS",
            AttackType::CommandInjection => "CmdInj",
            AttackType::PathTraversal => "PathTrav",
            AttackType::SuspiciousUserAgent => "SuspUA",
        }
    }

    /// Map a wire label to a category, if it is one of the known five.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.label() == label)
    }
}

/// Per-worker statistics, keyed by display name.
///
/// Built fresh on each aggregation pass and discarded after rendering.
#[derive(Debug, Clone, Default)]
pub struct WorkerStats {
    /// Entries processed by this worker.
    pub logs: u64,
    /// Entries classified as attacks.
    pub attacks: u64,
    /// Processing times in dispatch order, milliseconds.
    pub processing_times: Vec<f64>,
    /// Raw timestamp of the worker's most recently seen dispatch.
    pub last_heartbeat: String,
}

impl WorkerStats {
    /// Mean processing time in milliseconds, if any samples were seen.
    pub fn avg_processing_time(&self) -> Option<f64> {
        if self.processing_times.is_empty() {
            return None;
        }
        Some(self.processing_times.iter().sum::<f64>() / self.processing_times.len() as f64)
    }

    /// A worker is shown as online once it has processed anything.
    pub fn is_online(&self) -> bool {
        self.logs > 0
    }
}

/// Confidence tier used for display coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

/// Summary of one attack for the recent-attacks feed.
#[derive(Debug, Clone)]
pub struct RecentAttack {
    /// The resolved classification label (may be outside [`AttackType`]).
    pub attack_type: String,
    /// Payload, endpoint, or a placeholder.
    pub description: String,
    /// Worker display name.
    pub worker: String,
    /// Classifier confidence, 0 when absent.
    pub confidence: f64,
    /// Ground-truth verdict, when known.
    pub is_correct: Option<bool>,
    /// Processing time in milliseconds, when reported.
    pub processing_time: Option<f64>,
    /// Timestamp the attack was observed at, when parsable.
    pub observed_at: Option<DateTime<Utc>>,
}

impl RecentAttack {
    /// Display tier for the confidence value: >90% high, >70% medium,
    /// low otherwise.
    pub fn confidence_tier(&self) -> ConfidenceTier {
        let percent = self.confidence * 100.0;
        if percent > 90.0 {
            ConfidenceTier::High
        } else if percent > 70.0 {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }
}

/// Classifier performance totals accumulated over one pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct Performance {
    /// Sum of all reported processing times, milliseconds.
    pub total_processing_time: f64,
    /// Entries whose prediction matched ground truth.
    pub correct_predictions: u64,
    /// Entries carrying a classification result.
    pub logs_with_results: u64,
}

/// The derived statistics record, produced once per refresh cycle.
#[derive(Debug, Clone)]
pub struct DashboardStats {
    /// Entries with a usable inner log record.
    pub total_logs: u64,
    /// Entries classified as attacks.
    pub total_attacks: u64,
    /// Per-category attack counts; always seeded with all five categories.
    pub attack_types: BTreeMap<AttackType, u64>,
    /// Up to [`RECENT_ATTACKS_LIMIT`] attack summaries, newest first.
    pub recent_attacks: Vec<RecentAttack>,
    /// Per-worker buckets, keyed by display name.
    pub workers: BTreeMap<String, WorkerStats>,
    /// Classifier performance totals.
    pub performance: Performance,
    /// Parsed timestamps of all entries, in iteration order.
    pub timeline: Vec<DateTime<Utc>>,
    /// Derived: throughput over the observed timeline span.
    pub logs_per_second: f64,
    /// Derived: percentage of result-bearing entries predicted correctly.
    pub detection_rate: f64,
}

impl Default for DashboardStats {
    fn default() -> Self {
        Self {
            total_logs: 0,
            total_attacks: 0,
            attack_types: AttackType::ALL.iter().map(|t| (*t, 0)).collect(),
            recent_attacks: Vec::new(),
            workers: BTreeMap::new(),
            performance: Performance::default(),
            timeline: Vec::new(),
            logs_per_second: 0.0,
            detection_rate: 0.0,
        }
    }
}

impl DashboardStats {
    /// Sum of the per-category buckets.
    ///
    /// Always `<= total_attacks`; attacks with unrecognized labels are
    /// counted in the total but not in any bucket.
    pub fn bucketed_attacks(&self) -> u64 {
        self.attack_types.values().sum()
    }

    /// Count for one category.
    pub fn attack_count(&self, kind: AttackType) -> u64 {
        self.attack_types.get(&kind).copied().unwrap_or(0)
    }
}

/// Aggregate a log-history snapshot into a [`DashboardStats`] record.
///
/// Single pass over the entries. Entries without an inner `log` record
/// are discarded. A prediction is considered present only when the string
/// exists and is non-empty; when absent, the log's ground-truth category
/// stands in for it. An entry is an attack iff its resolved prediction is
/// present and not `"Normal"`.
///
/// Derived metrics are left at zero; run
/// [`calculate_metrics`](super::metrics::calculate_metrics) afterwards.
pub fn analyze(history: &[LogEntry]) -> DashboardStats {
    let mut stats = DashboardStats::default();

    for entry in history {
        let Some(log) = &entry.log else {
            continue;
        };
        stats.total_logs += 1;

        // Fall back to the ground-truth category while the worker's
        // result is still pending.
        let prediction = non_empty(entry.prediction.as_deref())
            .or_else(|| non_empty(log.real_category.as_deref()));
        let attack_label = prediction.filter(|p| *p != "Normal");

        let worker_name = worker_display_name(entry.worker.as_deref().unwrap_or(""));

        // Only non-zero processing times count, matching the producer
        // which reports 0 for unprocessed entries.
        let processing_time = entry.processing_time.filter(|t| *t != 0.0);

        {
            let worker = stats
                .workers
                .entry(worker_name.clone())
                .or_insert_with(|| WorkerStats {
                    last_heartbeat: entry
                        .sent_at
                        .clone()
                        .unwrap_or_else(|| Utc::now().to_rfc3339()),
                    ..WorkerStats::default()
                });
            worker.logs += 1;
            if attack_label.is_some() {
                worker.attacks += 1;
            }
            if let Some(t) = processing_time {
                worker.processing_times.push(t);
            }
        }

        // An entry carries a result once its own prediction and a
        // confidence value have arrived; a confidence of 0.0 counts.
        if non_empty(entry.prediction.as_deref()).is_some() && entry.confidence.is_some() {
            stats.performance.logs_with_results += 1;
        }

        if let Some(label) = attack_label {
            stats.total_attacks += 1;

            if let Some(kind) = AttackType::from_label(label) {
                *stats.attack_types.entry(kind).or_insert(0) += 1;
            }

            // Keep the first N in iteration order; ordering is applied
            // after the pass.
            if stats.recent_attacks.len() < RECENT_ATTACKS_LIMIT {
                stats.recent_attacks.push(RecentAttack {
                    attack_type: label.to_string(),
                    description: non_empty(log.payload.as_deref())
                        .or_else(|| non_empty(log.endpoint.as_deref()))
                        .unwrap_or(NO_PAYLOAD_PLACEHOLDER)
                        .to_string(),
                    worker: worker_name.clone(),
                    confidence: entry.confidence.unwrap_or(0.0),
                    is_correct: entry.is_correct,
                    processing_time: entry.processing_time,
                    observed_at: observed_timestamp(entry),
                });
            }
        }

        if let Some(t) = processing_time {
            stats.performance.total_processing_time += t;
        }

        if entry.is_correct == Some(true) {
            stats.performance.correct_predictions += 1;
        }

        if let Some(ts) = observed_timestamp(entry) {
            stats.timeline.push(ts);
        }
    }

    // Newest attacks first; summaries without a parsable timestamp keep
    // their insertion order at the end.
    stats.recent_attacks.sort_by(|a, b| match (a.observed_at, b.observed_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    stats
}

/// The instant an entry was observed: the log's own timestamp when
/// present, else the master's dispatch time.
fn observed_timestamp(entry: &LogEntry) -> Option<DateTime<Utc>> {
    let raw = entry
        .log
        .as_ref()
        .and_then(|log| non_empty(log.timestamp.as_deref()))
        .or_else(|| non_empty(entry.sent_at.as_deref()))?;
    parse_timestamp(raw)
}

/// Parse the timestamp formats the pipeline produces: RFC 3339 from the
/// master, naive `YYYY-mm-dd HH:MM:SS` variants from the log generator.
/// Naive timestamps are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RawLog;

    fn entry(prediction: Option<&str>, worker: &str) -> LogEntry {
        LogEntry {
            log: Some(RawLog::default()),
            prediction: prediction.map(str::to_string),
            worker: Some(worker.to_string()),
            ..LogEntry::default()
        }
    }

    #[test]
    fn test_empty_history() {
        let stats = analyze(&[]);
        assert_eq!(stats.total_logs, 0);
        assert_eq!(stats.total_attacks, 0);
        assert_eq!(stats.bucketed_attacks(), 0);
        assert!(stats.workers.is_empty());
        assert!(stats.recent_attacks.is_empty());
        assert!(stats.timeline.is_empty());
    }

    #[test]
    fn test_entry_without_log_is_discarded() {
        let history = vec![
            LogEntry {
                log: None,
                prediction: Some("SQLi".to_string()),
                ..LogEntry::default()
            },
            entry(Some("Normal"), "http://127.0.0.1:8001/"),
        ];

        let stats = analyze(&history);
        assert_eq!(stats.total_logs, 1);
        assert_eq!(stats.total_attacks, 0);
    }

    #[test]
    fn test_single_attack_entry() {
        // Scenario: one fully-populated SQLi entry from the local worker.
        let history = vec![LogEntry {
            log: Some(RawLog {
                timestamp: Some("2025-11-02T10:00:00+00:00".to_string()),
                ..RawLog::default()
            }),
            prediction: Some("SQLi".to_string()),
            confidence: Some(0.95),
            is_correct: Some(true),
            processing_time: Some(120.0),
            worker: Some("http://127.0.0.1:8080/x".to_string()),
            ..LogEntry::default()
        }];

        let stats = analyze(&history);
        assert_eq!(stats.total_logs, 1);
        assert_eq!(stats.total_attacks, 1);
        assert_eq!(stats.attack_count(AttackType::SqlInjection), 1);
        assert_eq!(stats.performance.logs_with_results, 1);
        assert_eq!(stats.performance.correct_predictions, 1);
        assert_eq!(stats.performance.total_processing_time, 120.0);
        assert_eq!(stats.timeline.len(), 1);

        let worker = stats.workers.get("Worker Local").unwrap();
        assert_eq!(worker.logs, 1);
        assert_eq!(worker.attacks, 1);
        assert_eq!(worker.processing_times, vec![120.0]);
    }

    #[test]
    fn test_same_worker_shares_bucket() {
        let history = vec![
            entry(Some("XSS"), "http://127.0.0.1:8001/process_log"),
            entry(Some("Normal"), "http://127.0.0.1:8001/process_log"),
        ];

        let stats = analyze(&history);
        assert_eq!(stats.workers.len(), 1);
        let worker = stats.workers.get("Worker Local").unwrap();
        assert_eq!(worker.logs, 2);
        assert_eq!(worker.attacks, 1);
    }

    #[test]
    fn test_real_category_fallback() {
        // No prediction yet, but the ground-truth category marks it XSS.
        let history = vec![LogEntry {
            log: Some(RawLog {
                real_category: Some("XSS".to_string()),
                ..RawLog::default()
            }),
            ..LogEntry::default()
        }];

        let stats = analyze(&history);
        assert_eq!(stats.total_attacks, 1);
        assert_eq!(stats.attack_count(AttackType::Xss), 1);
        // Fallback classification is not a worker result.
        assert_eq!(stats.performance.logs_with_results, 0);
    }

    #[test]
    fn test_empty_prediction_string_is_absent() {
        let mut e = entry(Some(""), "");
        e.log = Some(RawLog {
            real_category: Some("SQLi".to_string()),
            ..RawLog::default()
        });
        e.confidence = Some(0.9);

        let stats = analyze(&[e]);
        // The empty prediction falls through to the ground-truth label...
        assert_eq!(stats.total_attacks, 1);
        // ...and does not count as a worker result.
        assert_eq!(stats.performance.logs_with_results, 0);
    }

    #[test]
    fn test_unrecognized_label_counts_in_total_only() {
        let history = vec![
            entry(Some("ZeroDay"), ""),
            entry(Some("SQLi"), ""),
        ];

        let stats = analyze(&history);
        assert_eq!(stats.total_attacks, 2);
        assert_eq!(stats.bucketed_attacks(), 1);
        assert!(stats.bucketed_attacks() <= stats.total_attacks);
        // Unrecognized labels still appear in the recent feed.
        assert_eq!(stats.recent_attacks.len(), 2);
    }

    #[test]
    fn test_results_require_own_prediction_and_confidence() {
        let mut with_both = entry(Some("Normal"), "");
        with_both.confidence = Some(0.0); // zero confidence still counts

        let mut without_confidence = entry(Some("Normal"), "");
        without_confidence.confidence = None;

        let stats = analyze(&[with_both, without_confidence]);
        assert_eq!(stats.performance.logs_with_results, 1);
    }

    #[test]
    fn test_is_correct_requires_strict_true() {
        let mut correct = entry(Some("Normal"), "");
        correct.is_correct = Some(true);
        let mut wrong = entry(Some("Normal"), "");
        wrong.is_correct = Some(false);
        let unknown = entry(Some("Normal"), "");

        let stats = analyze(&[correct, wrong, unknown]);
        assert_eq!(stats.performance.correct_predictions, 1);
    }

    #[test]
    fn test_zero_processing_time_not_counted() {
        let mut zero = entry(Some("Normal"), "http://127.0.0.1:1/");
        zero.processing_time = Some(0.0);
        let mut real = entry(Some("Normal"), "http://127.0.0.1:1/");
        real.processing_time = Some(80.0);

        let stats = analyze(&[zero, real]);
        assert_eq!(stats.performance.total_processing_time, 80.0);
        let worker = stats.workers.get("Worker Local").unwrap();
        assert_eq!(worker.processing_times, vec![80.0]);
    }

    #[test]
    fn test_recent_attacks_capped_at_limit() {
        let history: Vec<LogEntry> =
            (0..25).map(|_| entry(Some("XSS"), "")).collect();

        let stats = analyze(&history);
        assert_eq!(stats.total_attacks, 25);
        assert_eq!(stats.recent_attacks.len(), RECENT_ATTACKS_LIMIT);
    }

    #[test]
    fn test_recent_attacks_take_first_in_iteration_order() {
        // 12 attacks with distinct payloads; the feed keeps the first 10
        // seen, not the 10 highest-confidence ones.
        let history: Vec<LogEntry> = (0..12)
            .map(|i| {
                let mut e = entry(Some("SQLi"), "");
                e.confidence = Some(i as f64 / 12.0);
                e.log = Some(RawLog {
                    payload: Some(format!("payload-{}", i)),
                    ..RawLog::default()
                });
                e
            })
            .collect();

        let stats = analyze(&history);
        let payloads: Vec<&str> =
            stats.recent_attacks.iter().map(|a| a.description.as_str()).collect();
        assert_eq!(payloads.len(), 10);
        assert!(payloads.contains(&"payload-0"));
        assert!(!payloads.contains(&"payload-10"));
    }

    #[test]
    fn test_recent_attacks_sorted_newest_first() {
        let mut older = entry(Some("SQLi"), "");
        older.log = Some(RawLog {
            timestamp: Some("2025-11-02T10:00:00+00:00".to_string()),
            payload: Some("older".to_string()),
            ..RawLog::default()
        });
        let mut newer = entry(Some("XSS"), "");
        newer.log = Some(RawLog {
            timestamp: Some("2025-11-02T11:00:00+00:00".to_string()),
            payload: Some("newer".to_string()),
            ..RawLog::default()
        });

        let stats = analyze(&[older, newer]);
        assert_eq!(stats.recent_attacks[0].description, "newer");
        assert_eq!(stats.recent_attacks[1].description, "older");
    }

    #[test]
    fn test_recent_attacks_unparsable_timestamps_keep_insertion_order() {
        let mut dated = entry(Some("SQLi"), "");
        dated.log = Some(RawLog {
            timestamp: Some("2025-11-02T10:00:00+00:00".to_string()),
            payload: Some("dated".to_string()),
            ..RawLog::default()
        });
        let mut garbled_a = entry(Some("XSS"), "");
        garbled_a.log = Some(RawLog {
            timestamp: Some("yesterday-ish".to_string()),
            payload: Some("garbled-a".to_string()),
            ..RawLog::default()
        });
        let mut garbled_b = entry(Some("XSS"), "");
        garbled_b.log = Some(RawLog {
            timestamp: Some("???".to_string()),
            payload: Some("garbled-b".to_string()),
            ..RawLog::default()
        });

        let stats = analyze(&[garbled_a.clone(), dated, garbled_b]);
        let order: Vec<&str> =
            stats.recent_attacks.iter().map(|a| a.description.as_str()).collect();
        assert_eq!(order, vec!["dated", "garbled-a", "garbled-b"]);
    }

    #[test]
    fn test_description_prefers_payload_then_endpoint() {
        let mut with_payload = entry(Some("SQLi"), "");
        with_payload.log = Some(RawLog {
            payload: Some("1 OR 1=1".to_string()),
            endpoint: Some("/login".to_string()),
            ..RawLog::default()
        });
        let mut endpoint_only = entry(Some("SQLi"), "");
        endpoint_only.log = Some(RawLog {
            endpoint: Some("/admin".to_string()),
            ..RawLog::default()
        });
        let bare = entry(Some("SQLi"), "");

        let stats = analyze(&[with_payload, endpoint_only, bare]);
        let descriptions: Vec<&str> =
            stats.recent_attacks.iter().map(|a| a.description.as_str()).collect();
        assert!(descriptions.contains(&"1 OR 1=1"));
        assert!(descriptions.contains(&"/admin"));
        assert!(descriptions.contains(&"Pas de payload"));
    }

    #[test]
    fn test_timeline_prefers_log_timestamp() {
        let e = LogEntry {
            log: Some(RawLog {
                timestamp: Some("2025-11-02T10:00:00+00:00".to_string()),
                ..RawLog::default()
            }),
            sent_at: Some("2025-11-02T12:00:00+00:00".to_string()),
            ..LogEntry::default()
        };

        let stats = analyze(&[e]);
        assert_eq!(stats.timeline.len(), 1);
        assert_eq!(
            stats.timeline[0],
            parse_timestamp("2025-11-02T10:00:00+00:00").unwrap()
        );
    }

    #[test]
    fn test_timeline_skips_unparsable() {
        let e = LogEntry {
            log: Some(RawLog {
                timestamp: Some("not a timestamp".to_string()),
                ..RawLog::default()
            }),
            ..LogEntry::default()
        };

        let stats = analyze(&[e]);
        assert!(stats.timeline.is_empty());
    }

    #[test]
    fn test_missing_worker_is_unknown_bucket() {
        let e = LogEntry {
            log: Some(RawLog::default()),
            ..LogEntry::default()
        };

        let stats = analyze(&[e]);
        assert!(stats.workers.contains_key("Worker Inconnu"));
    }

    #[test]
    fn test_heartbeat_seeded_from_sent_at() {
        let mut e = entry(Some("Normal"), "http://127.0.0.1:1/");
        e.sent_at = Some("2025-11-02T10:00:01+00:00".to_string());

        let stats = analyze(&[e]);
        let worker = stats.workers.get("Worker Local").unwrap();
        assert_eq!(worker.last_heartbeat, "2025-11-02T10:00:01+00:00");
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2025-11-02T10:00:00+00:00").is_some());
        assert!(parse_timestamp("2025-11-02T10:00:00.123456+01:00").is_some());
        assert!(parse_timestamp("2025-11-02 10:00:00").is_some());
        assert!(parse_timestamp("2025-11-02T10:00:00").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_attack_type_labels_round_trip() {
        for kind in AttackType::ALL {
            assert_eq!(AttackType::from_label(kind.label()), Some(kind));
        }
        assert_eq!(AttackType::from_label("Normal"), None);
        assert_eq!(AttackType::from_label("ZeroDay"), None);
    }
}
