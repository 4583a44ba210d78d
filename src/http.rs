//! Reverse geocoding against a Nominatim-compatible HTTP API.
//!
//! [`NominatimResolver`] implements [`StreetResolver`]:
//! - Request starts are spaced at least `request_delay_ms` apart
//! - Every failure (transport, status, body, JSON) is logged and becomes UNKNOWN
//! - The street is taken from `address.road`, then `footway`, then `pedestrian`
//!
//! There is no retry. A point that fails to resolve is simply a gap for the
//! debouncer.

use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::runtime::Runtime;
use tokio::sync::Mutex;

use crate::{ExtractError, Result, Street, StreetResolver};

/// Configuration for the Nominatim resolver.
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Base URL of the service, without the `/reverse` path.
    /// Default: "https://nominatim.openstreetmap.org"
    pub base_url: String,

    /// User-Agent header. The public Nominatim usage policy requires one that
    /// identifies the application.
    pub user_agent: String,

    /// Minimum spacing between request starts in milliseconds.
    /// Default: 500
    pub request_delay_ms: u64,

    /// Per-request timeout in seconds.
    /// Default: 10
    pub timeout_secs: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("street-extractor/", env!("CARGO_PKG_VERSION")).to_string(),
            request_delay_ms: 500,
            timeout_secs: 10,
        }
    }
}

/// Response of the `/reverse?format=jsonv2` endpoint (only the fields we read)
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<Address>,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    road: Option<String>,
    footway: Option<String>,
    pedestrian: Option<String>,
}

/// Pick the street out of a reverse-geocode response body.
fn parse_street(body: &[u8]) -> std::result::Result<Street, serde_json::Error> {
    let data: ReverseResponse = serde_json::from_slice(body)?;
    let address = data.address.unwrap_or_default();
    let name = [address.road, address.footway, address.pedestrian]
        .into_iter()
        .flatten()
        .find(|n| !n.trim().is_empty());
    Ok(Street::from_option(name))
}

/// Dispatch pacer - spaces out when requests START.
/// Each caller reserves the next slot, `interval` after the previous one.
struct DispatchPacer {
    next_dispatch: Mutex<Instant>,
    interval: Duration,
    dispatched_count: AtomicU32,
}

impl DispatchPacer {
    fn new(interval: Duration) -> Self {
        Self {
            next_dispatch: Mutex::new(Instant::now()),
            interval,
            dispatched_count: AtomicU32::new(0),
        }
    }

    /// Wait for our dispatch slot and return its sequence number.
    async fn wait_for_dispatch_slot(&self) -> u32 {
        let (wait_duration, dispatch_num) = {
            let mut next = self.next_dispatch.lock().await;
            let now = Instant::now();

            let dispatch_at = if *next > now { *next } else { now };
            *next = dispatch_at + self.interval;

            let num = self.dispatched_count.fetch_add(1, Ordering::Relaxed) + 1;
            (dispatch_at.saturating_duration_since(now), num)
        };

        // Wait outside the lock
        if wait_duration > Duration::from_millis(5) {
            debug!("[Nominatim #{}] Waiting {:?} for slot", dispatch_num, wait_duration);
            tokio::time::sleep(wait_duration).await;
        }

        dispatch_num
    }
}

/// Street resolver backed by a Nominatim reverse-geocoding endpoint.
///
/// Use [`resolve_async`](Self::resolve_async) from async code. The
/// [`StreetResolver`] impl blocks on an internal runtime, built on first use,
/// and must not be called from inside another tokio runtime.
pub struct NominatimResolver {
    client: Client,
    reverse_url: String,
    pacer: DispatchPacer,
    runtime: OnceLock<Runtime>,
}

impl NominatimResolver {
    pub fn new(config: NominatimConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExtractError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            reverse_url: format!("{}/reverse", config.base_url.trim_end_matches('/')),
            pacer: DispatchPacer::new(Duration::from_millis(config.request_delay_ms)),
            runtime: OnceLock::new(),
        })
    }

    /// Runtime for the blocking path, created the first time it is needed.
    fn blocking_runtime(&self) -> Option<&Runtime> {
        if let Some(rt) = self.runtime.get() {
            return Some(rt);
        }
        match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(rt) => {
                // A concurrent caller may have won the race; either runtime will do
                let _ = self.runtime.set(rt);
                self.runtime.get()
            }
            Err(e) => {
                warn!("[Nominatim] Failed to create tokio runtime: {}", e);
                None
            }
        }
    }

    /// Reverse-geocode one coordinate. Never fails: problems become UNKNOWN.
    pub async fn resolve_async(&self, latitude: f64, longitude: f64) -> Street {
        let dispatch_num = self.pacer.wait_for_dispatch_slot().await;
        let req_start = Instant::now();

        let response = self
            .client
            .get(&self.reverse_url)
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("format", "jsonv2".to_string()),
            ])
            .send()
            .await;

        let resp = match response {
            Ok(resp) => resp,
            Err(e) => {
                warn!("[Nominatim #{}] Request failed: {}", dispatch_num, e);
                return Street::Unknown;
            }
        };

        let status = resp.status();
        if !status.is_success() {
            warn!("[Nominatim #{}] Returned status {}", dispatch_num, status);
            return Street::Unknown;
        }

        let bytes = match resp.bytes().await {
            Ok(b) => b,
            Err(e) => {
                warn!("[Nominatim #{}] Body download error: {}", dispatch_num, e);
                return Street::Unknown;
            }
        };

        match parse_street(&bytes) {
            Ok(street) => {
                debug!(
                    "[Nominatim #{}] ({:.6}, {:.6}) -> {} in {:?}",
                    dispatch_num, latitude, longitude, street, req_start.elapsed()
                );
                street
            }
            Err(e) => {
                warn!("[Nominatim #{}] JSON parse error: {}", dispatch_num, e);
                Street::Unknown
            }
        }
    }
}

impl StreetResolver for NominatimResolver {
    fn resolve(&self, latitude: f64, longitude: f64) -> Street {
        match self.blocking_runtime() {
            Some(rt) => rt.block_on(self.resolve_async(latitude, longitude)),
            None => Street::Unknown,
        }
    }
}

impl Drop for NominatimResolver {
    fn drop(&mut self) {
        // Dropping a runtime blocks, which panics inside an async context
        if let Some(rt) = self.runtime.take() {
            rt.shutdown_background();
        }
    }
}
