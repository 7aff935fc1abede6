//! Worker display-name resolution.
//!
//! Raw worker identifiers are URLs (ngrok tunnels, local addresses). The
//! dashboard folds them to short stable display names. The mapping is
//! deliberately many-to-one: distinct raw URLs that resolve to the same
//! display name share one statistics bucket.

/// Display name used when an entry carries no worker identifier.
pub const UNKNOWN_WORKER: &str = "Worker Inconnu";

/// Display name for workers running on the loopback interface.
pub const LOCAL_WORKER: &str = "Worker Local";

/// Hostname fragments of the two provisioned tunnel workers.
const KNOWN_WORKER_HOSTS: &[(&str, &str)] = &[
    ("unlikably-unremissible-yamileth", "Worker 1"),
    ("nonduplicative-monet-vividly", "Worker 2"),
];

/// Resolve a raw worker URL to its display name.
///
/// - empty input resolves to [`UNKNOWN_WORKER`]
/// - anything mentioning `127.0.0.1` resolves to [`LOCAL_WORKER`]
/// - the authority (third `/`-delimited segment) is matched against the
///   known tunnel hosts
/// - otherwise the first dot-delimited label of the authority is used,
///   falling back to `"Worker"` when there is none
pub fn worker_display_name(url: &str) -> String {
    if url.is_empty() {
        return UNKNOWN_WORKER.to_string();
    }

    if url.contains("127.0.0.1") {
        return LOCAL_WORKER.to_string();
    }

    let authority = url.split('/').nth(2).unwrap_or("");
    for (hint, name) in KNOWN_WORKER_HOSTS {
        if authority.contains(hint) {
            return (*name).to_string();
        }
    }

    match authority.split('.').next() {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => "Worker".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_unknown() {
        assert_eq!(worker_display_name(""), "Worker Inconnu");
    }

    #[test]
    fn test_loopback_is_local() {
        assert_eq!(worker_display_name("http://127.0.0.1:9999/"), "Worker Local");
        assert_eq!(
            worker_display_name("http://127.0.0.1:8080/process_log"),
            "Worker Local"
        );
    }

    #[test]
    fn test_known_tunnel_hosts() {
        assert_eq!(
            worker_display_name(
                "https://unlikably-unremissible-yamileth.ngrok-free.dev/process_log"
            ),
            "Worker 1"
        );
        assert_eq!(
            worker_display_name("https://nonduplicative-monet-vividly.ngrok-free.dev/process_log"),
            "Worker 2"
        );
    }

    #[test]
    fn test_fallback_to_first_host_label() {
        assert_eq!(
            worker_display_name("https://gpu-node.example.com/process_log"),
            "gpu-node"
        );
    }

    #[test]
    fn test_no_authority_falls_back_to_generic() {
        assert_eq!(worker_display_name("Unknown"), "Worker");
        assert_eq!(worker_display_name("not-a-url"), "Worker");
    }

    #[test]
    fn test_many_to_one_folding() {
        // Different ports on the loopback interface share one bucket.
        let a = worker_display_name("http://127.0.0.1:8001/process_log");
        let b = worker_display_name("http://127.0.0.1:8002/process_log");
        assert_eq!(a, b);
    }
}
