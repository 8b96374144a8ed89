use std::time::{Duration, Instant};

use anyhow::Context;
use mdns_sd::{ServiceDaemon, ServiceEvent};
use tracing::{debug, info, warn};

/// Browses for a host advertising `service_type` and returns `ip:port` of
/// the first one resolved. Blocks for at most `timeout`.
pub fn find_local_host(service_type: &str, timeout: Duration) -> anyhow::Result<Option<String>> {
    let mdns = ServiceDaemon::new().context("failed to create mdns daemon")?;
    let receiver = mdns.browse(service_type).context("failed to browse")?;
    debug!(service_type, "browsing for host");

    let deadline = Instant::now() + timeout;
    let mut found = None;
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        let Ok(event) = receiver.recv_timeout(left) else {
            break;
        };
        if let ServiceEvent::ServiceResolved(info) = event {
            let Some(addr) = info.get_addresses().iter().next().copied() else {
                continue;
            };
            let port = info.get_port();
            info!(instance = info.get_fullname(), "found host at {addr}:{port}");
            found = Some(format!("{addr}:{port}"));
            break;
        }
    }

    if let Err(e) = mdns.shutdown() {
        warn!("failed to shut down mdns daemon: {e}");
    }
    Ok(found)
}
