//! Data types shared between backend and UI layers.

use std::collections::HashMap;
use std::fmt;

/// Category of connectivity, used both as technology key and service type.
///
/// Declaration order is the display order of technology sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectionType {
    Ethernet,
    Wifi,
    Bluetooth,
    P2p,
    Cellular,
    Vpn,
    Other,
}

impl ConnectionType {
    pub fn parse(value: &str) -> Self {
        match value {
            "ethernet" => Self::Ethernet,
            "wifi" => Self::Wifi,
            "bluetooth" => Self::Bluetooth,
            "p2p" => Self::P2p,
            "cellular" => Self::Cellular,
            "vpn" => Self::Vpn,
            _ => Self::Other,
        }
    }

    /// Technology paths end with the type key: `/net/connman/technology/wifi`.
    pub fn from_technology_path(path: &str) -> Self {
        Self::parse(last_segment(path))
    }

    /// Guess the type from a service identifier when the daemon omits `Type`.
    ///
    /// Service paths look like `/net/connman/service/wifi_0011_ssid_managed_psk`,
    /// VPN connections live under `/net/connman/vpn/connection/`.
    pub fn from_service_path(path: &str) -> Self {
        if path.contains("/vpn/") {
            return Self::Vpn;
        }
        let segment = last_segment(path);
        Self::parse(segment.split('_').next().unwrap_or(segment))
    }

    /// Lower value sorts first in the menu.
    pub fn priority(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ethernet => "ethernet",
            Self::Wifi => "wifi",
            Self::Bluetooth => "bluetooth",
            Self::P2p => "p2p",
            Self::Cellular => "cellular",
            Self::Vpn => "vpn",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Service connection state as reported by the `State` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Idle,
    Failure,
    Association,
    Configuration,
    Ready,
    Disconnect,
    Online,
    /// No `State` seen yet, or a value this applet does not know.
    Unknown,
}

impl ServiceState {
    pub fn parse(value: &str) -> Self {
        match value {
            "idle" => Self::Idle,
            "failure" => Self::Failure,
            "association" => Self::Association,
            "configuration" => Self::Configuration,
            "ready" => Self::Ready,
            "disconnect" => Self::Disconnect,
            "online" => Self::Online,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Failure => "failure",
            Self::Association => "association",
            Self::Configuration => "configuration",
            Self::Ready => "ready",
            Self::Disconnect => "disconnect",
            Self::Online => "online",
            Self::Unknown => "unknown",
        }
    }

    /// States from which the toggle action issues a connect request.
    pub fn wants_connect(self) -> bool {
        matches!(self, Self::Idle | Self::Failure | Self::Disconnect)
    }

    /// Counted as an active connection on a wireless interface.
    pub fn is_active(self) -> bool {
        !matches!(self, Self::Idle | Self::Disconnect | Self::Failure)
    }

    pub fn action_label(self) -> &'static str {
        match self {
            Self::Idle | Self::Disconnect => "Connect",
            Self::Failure => "Reconnect",
            _ => "Disconnect",
        }
    }
}

/// Which daemon object backs a service mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// `net.connman.Service` on the core daemon
    Service,
    /// `net.connman.vpn.Connection` on the VPN daemon
    VpnConnection,
}

/// Commands sent from UI to backend
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Shutdown the backend gracefully
    Shutdown,
    /// Connect or disconnect a service depending on its state
    ToggleService { path: String },
    /// Flip the `Powered` property of a technology
    TogglePowered { technology: ConnectionType },
    /// Open the network picker for one wireless interface
    OpenPicker { interface: String },
    PickerSelect { path: String },
    PickerCancel,
    /// Response to a credential prompt
    SubmitCredentials { values: HashMap<String, String> },
    CancelCredentials,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn technology_key_comes_from_last_segment() {
        assert_eq!(
            ConnectionType::from_technology_path("/net/connman/technology/wifi"),
            ConnectionType::Wifi
        );
        assert_eq!(
            ConnectionType::from_technology_path("/net/connman/technology/gadget"),
            ConnectionType::Other
        );
    }

    #[test]
    fn service_type_falls_back_to_identifier() {
        assert_eq!(
            ConnectionType::from_service_path("/net/connman/service/ethernet_001122334455_cable"),
            ConnectionType::Ethernet
        );
        assert_eq!(
            ConnectionType::from_service_path("/net/connman/vpn/connection/example_com"),
            ConnectionType::Vpn
        );
    }

    #[test]
    fn display_order_follows_priority() {
        let mut types = vec![
            ConnectionType::Vpn,
            ConnectionType::Ethernet,
            ConnectionType::Cellular,
            ConnectionType::Wifi,
            ConnectionType::P2p,
            ConnectionType::Bluetooth,
        ];
        types.sort_by_key(|t| t.priority());
        assert_eq!(
            types,
            vec![
                ConnectionType::Ethernet,
                ConnectionType::Wifi,
                ConnectionType::Bluetooth,
                ConnectionType::P2p,
                ConnectionType::Cellular,
                ConnectionType::Vpn,
            ]
        );
    }

    #[test]
    fn action_label_tracks_state() {
        assert_eq!(ServiceState::Idle.action_label(), "Connect");
        assert_eq!(ServiceState::Disconnect.action_label(), "Connect");
        assert_eq!(ServiceState::Failure.action_label(), "Reconnect");
        assert_eq!(ServiceState::Online.action_label(), "Disconnect");
        assert_eq!(ServiceState::Unknown.action_label(), "Disconnect");
    }
}
