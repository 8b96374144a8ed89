use std::net::IpAddr;

use anyhow::Context;
use mdns_sd::{ServiceDaemon, ServiceInfo};

pub fn register_mdns(ip: IpAddr, port: u16, service_type: &str, instance_name: &str) -> anyhow::Result<ServiceDaemon> {
    let mdns = ServiceDaemon::new().context("failed to create mdns daemon")?;

    let host_name = format!("{ip}.local.");
    let properties = [("role", "host")];

    let service = ServiceInfo::new(service_type, instance_name, &host_name, ip, port, &properties[..])
        .context("invalid mdns service info")?;

    mdns.register(service).context("failed to register mdns service")?;
    Ok(mdns)
}
