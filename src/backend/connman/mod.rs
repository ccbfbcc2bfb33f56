//! Bus-facing half of the backend: proxies, exported agents and the
//! [`Remote`](super::remote::Remote) that issues calls on the system bus.

pub mod agent;
pub mod proxy;
mod remote;

pub use agent::{AgentCore, AgentEvent, AgentOwner, ConnmanAgent, CredentialRequest, VpnAgent};
pub use remote::DbusRemote;

use super::properties::PropertyMap;
use proxy::{ManagerProxy, ObjectList, VpnManagerProxy};

/// Convert an enumeration reply, dropping entries that fail to decode.
pub fn decode_objects(objects: &ObjectList) -> Vec<(String, PropertyMap)> {
    objects
        .iter()
        .filter_map(|(path, properties)| match PropertyMap::from_dbus(properties) {
            Ok(properties) => Some((path.as_str().to_string(), properties)),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", path.as_str(), e);
                None
            }
        })
        .collect()
}

pub type Objects = Vec<(String, PropertyMap)>;

/// Technologies and services of the core daemon.
pub async fn enumerate(manager: &ManagerProxy<'_>) -> zbus::Result<(Objects, Objects)> {
    let technologies = decode_objects(&manager.get_technologies().await?);
    let services = decode_objects(&manager.get_services().await?);
    tracing::debug!(
        "Enumerated {} technologies and {} services",
        technologies.len(),
        services.len()
    );
    Ok((technologies, services))
}

/// Connections of the VPN daemon.
pub async fn enumerate_vpn(manager: &VpnManagerProxy<'_>) -> zbus::Result<Objects> {
    let connections = decode_objects(&manager.get_connections().await?);
    tracing::debug!("Enumerated {} vpn connections", connections.len());
    Ok(connections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use zbus::zvariant::{OwnedObjectPath, OwnedValue, Signature, Value};

    fn object(
        path: &str,
        entries: Vec<(&str, Value<'static>)>,
    ) -> (OwnedObjectPath, HashMap<String, OwnedValue>) {
        let properties = entries
            .into_iter()
            .map(|(name, value)| (name.to_string(), OwnedValue::try_from(value).unwrap()))
            .collect();
        (OwnedObjectPath::try_from(path).unwrap(), properties)
    }

    #[test]
    fn enumeration_reply_keeps_paths_and_properties() {
        let decoded = decode_objects(&vec![
            object(
                "/net/connman/technology/wifi",
                vec![("Powered", Value::from(true)), ("Type", Value::from("wifi"))],
            ),
            object("/net/connman/technology/ethernet", vec![("Powered", Value::from(false))]),
        ]);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].0, "/net/connman/technology/wifi");
        assert_eq!(decoded[0].1.bool("Powered"), Some(true));
        assert_eq!(decoded[1].1.bool("Powered"), Some(false));
    }

    #[test]
    fn undecodable_entries_are_dropped() {
        let decoded = decode_objects(&vec![
            object(
                "/net/connman/service/wifi_odd",
                vec![("Raw", Value::from(Signature::from_static_str_unchecked("(yy)")))],
            ),
            object(
                "/net/connman/service/ethernet_cable",
                vec![("State", Value::from("online"))],
            ),
        ]);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].1.str("State"), Some("online"));
    }
}
