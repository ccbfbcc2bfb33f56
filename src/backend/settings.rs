use std::time::Duration;

/// Runtime knobs for the backend.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Well-known name of the core daemon
    pub bus_name: String,
    /// Well-known name of the VPN daemon
    pub vpn_bus_name: String,
    /// Object path the credential agent is exported at
    pub agent_path: String,
    pub vpn_agent_path: String,
    /// Period of the rescan timer while a network picker is open
    pub rescan_interval: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bus_name: "net.connman".into(),
            vpn_bus_name: "net.connman.vpn".into(),
            agent_path: "/dev/connman_applet/Agent".into(),
            vpn_agent_path: "/dev/connman_applet/VpnAgent".into(),
            rescan_interval: Duration::from_secs(15),
        }
    }
}
