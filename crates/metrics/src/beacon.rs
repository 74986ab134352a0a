//! HTTP beacon: fire-and-forget POST of encoded hits to the collector.

use std::time::Duration;

use addon_core::event_bus::BeaconSender;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Sends each hit on a detached tokio task. The caller never waits and
/// failures end up in the log only.
///
/// Sends outlive the beacon: dropping it detaches in-flight tasks rather than
/// aborting them.
pub struct HttpBeacon {
    client: reqwest::Client,
    inflight: Mutex<Vec<JoinHandle<()>>>,
}

impl HttpBeacon {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_timeout(timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            inflight: Mutex::new(Vec::new()),
        }
    }

    /// Number of tracked sends that have not finished yet.
    pub fn pending(&self) -> usize {
        self.inflight
            .lock()
            .iter()
            .filter(|task| !task.is_finished())
            .count()
    }

    /// Wait for every outstanding send. Short-lived processes call this before
    /// exiting; long-running hosts never need to.
    pub async fn drain(&self) {
        let tasks = std::mem::take(&mut *self.inflight.lock());
        for task in tasks {
            if let Err(e) = task.await {
                warn!(error = %e, "beacon task did not complete");
            }
        }
    }
}

impl Default for HttpBeacon {
    fn default() -> Self {
        Self::new()
    }
}

impl BeaconSender for HttpBeacon {
    fn send_beacon(&self, url: &str, body: String) {
        let Ok(handle) = Handle::try_current() else {
            warn!(url, "no async runtime available, beacon dropped");
            return;
        };

        let request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body);
        let url = url.to_string();

        let task = handle.spawn(async move {
            match request.send().await {
                Ok(resp) => debug!(url = %url, status = %resp.status(), "beacon delivered"),
                Err(e) => warn!(url = %url, error = %e, "beacon failed"),
            }
        });

        let mut inflight = self.inflight.lock();
        // forget finished sends so the list does not grow without bound
        inflight.retain(|task| !task.is_finished());
        inflight.push(task);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn local_beacon() -> HttpBeacon {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        HttpBeacon::with_client(client)
    }

    #[test]
    fn test_send_without_runtime_is_dropped() {
        let beacon = HttpBeacon::new();
        beacon.send_beacon("http://127.0.0.1:9/collect", "v=1".into());
        assert_eq!(beacon.pending(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_collector_does_not_surface() {
        let beacon = HttpBeacon::with_timeout(Duration::from_millis(200)).unwrap();
        // port 9 (discard) is closed on test machines; the failure is logged only
        beacon.send_beacon("http://127.0.0.1:9/collect", "v=1&t=event".into());

        beacon.drain().await;
        assert_eq!(beacon.pending(), 0);
    }

    #[tokio::test]
    async fn test_dropped_beacon_still_delivers() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/collect", listener.local_addr().unwrap());

        {
            let beacon = local_beacon();
            beacon.send_beacon(&url, "v=1&t=event".into());
        }

        let accepted = tokio::time::timeout(Duration::from_secs(2), listener.accept()).await;
        let (mut socket, _) = accepted.expect("collector never saw the hit").unwrap();

        let mut request = vec![0u8; 1024];
        let n = socket.read(&mut request).await.unwrap();
        let request = String::from_utf8_lossy(&request[..n]);
        assert!(request.starts_with("POST /collect"));
    }
}
