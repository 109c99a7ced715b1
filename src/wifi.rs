// wifi.rs

use std::net::Ipv4Addr;

use log::*;

use crate::StatusIndicator;

/// Link-layer view of the wireless interface. Association and credential
/// handling live behind this seam.
pub trait NetLink {
    /// Current link state.
    fn is_connected(&mut self) -> bool;

    /// Begins association with the given credentials. Progress is
    /// observed by polling [`NetLink::is_connected`].
    fn start_connect(&mut self, ssid: &str, pass: &str);

    /// Address assigned to the interface once associated.
    fn address(&self) -> Ipv4Addr;
}

/// Blocks until the link is up and returns the assigned address.
///
/// Retries forever with no backoff beyond the association blink cadence.
/// There is deliberately no failure exit: a box that cannot reach the
/// network has nothing better to do than keep trying.
pub fn ensure_connected<W, B>(
    link: &mut W,
    ssid: &str,
    pass: &str,
    indicator: &mut B,
) -> Ipv4Addr
where
    W: NetLink,
    B: StatusIndicator,
{
    if link.is_connected() {
        return link.address();
    }

    info!("WiFi connecting to {ssid}...");
    link.start_connect(ssid, pass);
    while !link.is_connected() {
        info!("WiFi waiting for association...");
        indicator.associating();
    }

    let ip = link.address();
    info!("WiFi connected on {ip}");
    ip
}


// EOF
