//! HTTP polling data source.
//!
//! Fetches the master's log history from its `/` route on a fixed
//! interval. This is the normal mode of operation: the master serves its
//! rolling `logs_history` as a JSON envelope, and this source polls it.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

use super::{DataSource, HistoryEnvelope, LogHistory};

/// A data source that polls the master's HTTP endpoint.
///
/// Spawns a background task that issues `GET {base}/` every refresh
/// interval and makes the decoded history available via `poll()`. The
/// first fetch fires immediately.
///
/// Transport failures, non-success statuses, and decode failures all fold
/// into one connection-error outcome: the task records the error for the
/// status indicator and delivers an empty history, so the dashboard shows
/// zeroed statistics until a later cycle succeeds. Errors never propagate
/// past this source.
#[derive(Debug)]
pub struct HttpSource {
    receiver: mpsc::Receiver<LogHistory>,
    description: String,
    last_error: Arc<Mutex<Option<String>>>,
    task: tokio::task::JoinHandle<()>,
}

impl HttpSource {
    /// Spawn a background task polling `{base_url}/` every `refresh`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(base_url: &str, refresh: Duration) -> Self {
        let description = format!("master: {}", base_url);
        let url = format!("{}/", base_url.trim_end_matches('/'));
        let (tx, rx) = mpsc::channel(16);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();

        let task = tokio::spawn(async move {
            let client = reqwest::Client::new();
            let mut ticker = tokio::time::interval(refresh);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let history = match fetch_history(&client, &url).await {
                    Ok(history) => {
                        tracing::debug!(entries = history.len(), "fetched log history");
                        *error_handle.lock().unwrap() = None;
                        history
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, url = %url, "fetch from master failed");
                        *error_handle.lock().unwrap() = Some(e.to_string());
                        // Connection failure surfaces as an empty history
                        Vec::new()
                    }
                };

                if tx.send(history).await.is_err() {
                    // Receiver dropped
                    break;
                }
            }
        });

        Self {
            receiver: rx,
            description,
            last_error,
            task,
        }
    }
}

/// Fetch one snapshot from the master without standing up a polling task.
///
/// Used by the non-interactive export mode.
pub async fn fetch_once(base_url: &str) -> Result<LogHistory> {
    let url = format!("{}/", base_url.trim_end_matches('/'));
    let client = reqwest::Client::new();
    fetch_history(&client, &url).await
}

/// Issue one GET against the master and decode the envelope.
///
/// Non-2xx statuses and JSON decode failures are errors like any
/// transport failure.
async fn fetch_history(client: &reqwest::Client, url: &str) -> Result<LogHistory> {
    let response = client.get(url).send().await?;
    let envelope: HistoryEnvelope = response.error_for_status()?.json().await?;
    Ok(envelope.logs_history)
}

impl DataSource for HttpSource {
    fn poll(&mut self) -> Option<LogHistory> {
        // Drain the channel so a slow TUI loop always sees the newest
        // snapshot; intermediate ones are superseded anyway.
        let mut latest = None;
        while let Ok(history) = self.receiver.try_recv() {
            latest = Some(history);
        }
        latest
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.lock().unwrap().clone()
    }
}

impl Drop for HttpSource {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on an ephemeral port.
    async fn one_shot_server(body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });

        format!("http://{}", addr)
    }

    async fn poll_until(source: &mut HttpSource, attempts: u32) -> Option<LogHistory> {
        for _ in 0..attempts {
            if let Some(history) = source.poll() {
                return Some(history);
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        None
    }

    #[tokio::test]
    async fn test_http_source_fetches_history() {
        let base = one_shot_server(
            r#"{"logs_history":[{"log":{"timestamp":"t1"},"prediction":"SQLi"}]}"#,
        )
        .await;

        let mut source = HttpSource::spawn(&base, Duration::from_secs(60));

        let history = poll_until(&mut source, 40).await.expect("no snapshot received");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].prediction.as_deref(), Some("SQLi"));
        assert!(source.error().is_none());
    }

    #[tokio::test]
    async fn test_http_source_empty_envelope() {
        let base = one_shot_server(r#"{"status":"ok"}"#).await;

        let mut source = HttpSource::spawn(&base, Duration::from_secs(60));

        let history = poll_until(&mut source, 40).await.expect("no snapshot received");
        assert!(history.is_empty());
        assert!(source.error().is_none());
    }

    #[tokio::test]
    async fn test_http_source_connection_error_yields_empty() {
        // Nothing is listening on this port; bind-then-drop to reserve one.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut source = HttpSource::spawn(&format!("http://{}", addr), Duration::from_secs(60));

        let history = poll_until(&mut source, 40).await.expect("no snapshot received");
        assert!(history.is_empty());
        assert!(source.error().is_some());
    }

    #[tokio::test]
    async fn test_fetch_once() {
        let base = one_shot_server(r#"{"logs_history":[{"log":{}}]}"#).await;
        let history = fetch_once(&base).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_http_source_description() {
        let source = HttpSource::spawn("http://127.0.0.1:5000", Duration::from_secs(60));
        assert_eq!(source.description(), "master: http://127.0.0.1:5000");
    }
}
