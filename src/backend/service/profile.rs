//! Per-type presentation table for services.

use super::super::types::ConnectionType;

pub const ERROR_ICON: &str = "network-error-symbolic";

/// Icon shown while a service is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectedIcon {
    Fixed(&'static str),
    /// `{prefix}-{grade}-symbolic`, graded by `Strength`
    Graded(&'static str),
}

#[derive(Debug)]
pub struct ServiceProfile {
    pub kind: ConnectionType,
    pub default_label: &'static str,
    pub settings_label: &'static str,
    /// Panel name handed to the host's settings launcher
    pub settings_panel: &'static str,
    pub connected: ConnectedIcon,
    pub acquiring: &'static str,
    pub offline: &'static str,
    /// Show a lock badge derived from `Security`
    pub security_badge: bool,
    /// Use the interface name as status text when known
    pub interface_status: bool,
}

static ETHERNET: ServiceProfile = ServiceProfile {
    kind: ConnectionType::Ethernet,
    default_label: "Wired Connection",
    settings_label: "Wired Settings",
    settings_panel: "network",
    connected: ConnectedIcon::Fixed("network-wired-symbolic"),
    acquiring: "network-wired-acquiring-symbolic",
    offline: "network-wired-disconnected-symbolic",
    security_badge: false,
    interface_status: true,
};

static WIFI: ServiceProfile = ServiceProfile {
    kind: ConnectionType::Wifi,
    default_label: "Wireless Connection",
    settings_label: "Wireless Settings",
    settings_panel: "wifi",
    connected: ConnectedIcon::Graded("network-wireless-signal"),
    acquiring: "network-wireless-acquiring-symbolic",
    offline: "network-wireless-offline-symbolic",
    security_badge: true,
    interface_status: false,
};

static BLUETOOTH: ServiceProfile = ServiceProfile {
    kind: ConnectionType::Bluetooth,
    default_label: "Bluetooth Connection",
    settings_label: "Bluetooth Settings",
    settings_panel: "bluetooth",
    connected: ConnectedIcon::Fixed("bluetooth-active-symbolic"),
    acquiring: "bluetooth-active-symbolic",
    offline: "bluetooth-disabled-symbolic",
    security_badge: false,
    interface_status: false,
};

static CELLULAR: ServiceProfile = ServiceProfile {
    kind: ConnectionType::Cellular,
    default_label: "Cellular Connection",
    settings_label: "Mobile Broadband Settings",
    settings_panel: "wwan",
    connected: ConnectedIcon::Graded("network-cellular-signal"),
    acquiring: "network-cellular-acquiring-symbolic",
    offline: "network-cellular-offline-symbolic",
    security_badge: false,
    interface_status: false,
};

static VPN: ServiceProfile = ServiceProfile {
    kind: ConnectionType::Vpn,
    default_label: "VPN Connection",
    settings_label: "VPN Settings",
    settings_panel: "network",
    connected: ConnectedIcon::Fixed("network-vpn-symbolic"),
    acquiring: "network-vpn-acquiring-symbolic",
    offline: "network-vpn-disconnected-symbolic",
    security_badge: false,
    interface_status: false,
};

static P2P: ServiceProfile = ServiceProfile {
    kind: ConnectionType::P2p,
    default_label: "Connection",
    settings_label: "Network Settings",
    settings_panel: "network",
    connected: ConnectedIcon::Fixed("network-transmit-receive-symbolic"),
    acquiring: "network-transmit-receive-symbolic",
    offline: "network-offline-symbolic",
    security_badge: false,
    interface_status: false,
};

static OTHER: ServiceProfile = ServiceProfile {
    kind: ConnectionType::Other,
    default_label: "Connection",
    settings_label: "Network Settings",
    settings_panel: "network",
    connected: ConnectedIcon::Fixed("network-transmit-receive-symbolic"),
    acquiring: "network-transmit-receive-symbolic",
    offline: "network-offline-symbolic",
    security_badge: false,
    interface_status: false,
};

pub fn profile_for(kind: ConnectionType) -> &'static ServiceProfile {
    match kind {
        ConnectionType::Ethernet => &ETHERNET,
        ConnectionType::Wifi => &WIFI,
        ConnectionType::Bluetooth => &BLUETOOTH,
        ConnectionType::Cellular => &CELLULAR,
        ConnectionType::Vpn => &VPN,
        ConnectionType::P2p => &P2P,
        ConnectionType::Other => &OTHER,
    }
}

impl ServiceProfile {
    pub fn connected_icon(&self, strength: Option<i64>) -> String {
        match self.connected {
            ConnectedIcon::Fixed(icon) => icon.to_string(),
            ConnectedIcon::Graded(prefix) => {
                format!("{}-{}-symbolic", prefix, signal_grade(strength.unwrap_or(0)))
            }
        }
    }
}

/// Bucket a 0-100 strength into the icon theme's signal grades.
pub fn signal_grade(strength: i64) -> &'static str {
    if strength > 80 {
        "excellent"
    } else if strength > 55 {
        "good"
    } else if strength > 30 {
        "ok"
    } else if strength > 5 {
        "weak"
    } else {
        "none"
    }
}

/// Lock badge for a wifi security method.
pub fn security_badge(security: Option<&str>) -> Option<&'static str> {
    match security? {
        "none" => None,
        "ieee8021x" => Some("security-high-symbolic"),
        "wep" => Some("security-low-symbolic"),
        _ => Some("security-medium-symbolic"),
    }
}

/// Label for a wifi network that never reported a `Name`.
pub fn hidden_network_label(security: Option<&str>) -> &'static str {
    match security {
        Some("ieee8021x") => "Hidden 802.1X network",
        Some("psk") => "Hidden WPA network",
        Some("wep") => "Hidden WEP network",
        Some("wps") => "Hidden WPS network",
        Some("none") => "Hidden open network",
        _ => "Hidden network",
    }
}
