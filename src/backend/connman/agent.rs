//! ConnMan Agent implementation for credential prompts
//!
//! The core and VPN daemons call an exported agent object when a connection
//! needs input (WiFi passphrase, VPN username, ...). Both agents forward the
//! request to the backend loop, which shows a prompt and answers through a
//! oneshot channel.

use std::collections::HashMap;

use async_channel::Sender;
use tokio::sync::oneshot;
use zbus::interface;
use zbus::zvariant::{ObjectPath, OwnedValue, Value};

use super::super::properties::{PropertyMap, PropertyValue};

/// Daemon an agent is registered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentOwner {
    Connman,
    Vpn,
}

/// Request sent from an agent to the backend for credential input
pub struct CredentialRequest {
    pub owner: AgentOwner,
    pub service: String,
    /// Names of the mandatory fields, in the daemon's order
    pub fields: Vec<String>,
    /// `None` means the user canceled
    pub response_tx: oneshot::Sender<Option<HashMap<String, String>>>,
}

impl std::fmt::Debug for CredentialRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRequest")
            .field("owner", &self.owner)
            .field("service", &self.service)
            .field("fields", &self.fields)
            .finish()
    }
}

#[derive(Debug)]
pub enum AgentEvent {
    Request(CredentialRequest),
    /// The daemon aborted the request in flight
    Cancel(AgentOwner),
    /// The daemon dropped the agent
    Release(AgentOwner),
}

#[derive(Debug, thiserror::Error)]
pub enum AgentFailure {
    #[error("canceled by user")]
    Canceled,
    #[error("backend is gone")]
    Closed,
}

#[derive(Debug, zbus::DBusError)]
#[zbus(prefix = "net.connman.Agent.Error")]
pub enum ConnmanAgentError {
    #[zbus(error)]
    ZBus(zbus::Error),
    Canceled(String),
    /// Part of the daemon's error domain; this agent never asks for a retry.
    Retry(String),
}

#[derive(Debug, zbus::DBusError)]
#[zbus(prefix = "net.connman.vpn.Agent.Error")]
pub enum VpnAgentError {
    #[zbus(error)]
    ZBus(zbus::Error),
    Canceled(String),
    /// Part of the daemon's error domain; this agent never asks for a retry.
    Retry(String),
}

impl From<AgentFailure> for ConnmanAgentError {
    fn from(failure: AgentFailure) -> Self {
        Self::Canceled(failure.to_string())
    }
}

impl From<AgentFailure> for VpnAgentError {
    fn from(failure: AgentFailure) -> Self {
        Self::Canceled(failure.to_string())
    }
}

/// Fields the user has to fill in.
///
/// Each entry of `RequestInput`'s dictionary describes one field; only those
/// with `Requirement = mandatory` are asked for. Optional, alternate and
/// informational fields are left out.
pub fn mandatory_fields(specs: &PropertyMap) -> Vec<String> {
    specs
        .iter()
        .filter(|(name, spec)| {
            let requirement = match spec {
                PropertyValue::Map(inner) => inner.get("Requirement").and_then(PropertyValue::as_str),
                _ => None,
            };
            if requirement != Some("mandatory") {
                tracing::debug!("Skipping {:?} field {}", requirement, name);
                return false;
            }
            true
        })
        .map(|(name, _)| name.clone())
        .collect()
}

/// Interaction logic shared by both agents.
#[derive(Clone)]
pub struct AgentCore {
    owner: AgentOwner,
    events: Sender<AgentEvent>,
}

impl AgentCore {
    pub fn new(owner: AgentOwner, events: Sender<AgentEvent>) -> Self {
        Self { owner, events }
    }

    /// Ask the backend for the mandatory fields and wait for the answer.
    pub async fn request_input(
        &self,
        service: &str,
        specs: &PropertyMap,
    ) -> Result<HashMap<String, String>, AgentFailure> {
        let fields = mandatory_fields(specs);
        tracing::info!("Input requested for {}: {:?}", service, fields);

        let (response_tx, response_rx) = oneshot::channel();
        let request = CredentialRequest {
            owner: self.owner,
            service: service.to_string(),
            fields,
            response_tx,
        };
        if self.events.send(AgentEvent::Request(request)).await.is_err() {
            tracing::error!("Failed to send credential request to backend");
            return Err(AgentFailure::Closed);
        }

        match response_rx.await {
            Ok(Some(values)) => {
                tracing::info!("Got credentials for {}", service);
                Ok(values)
            }
            Ok(None) => {
                tracing::info!("User canceled credential entry for {}", service);
                Err(AgentFailure::Canceled)
            }
            Err(_) => {
                tracing::error!("Credential response channel closed");
                Err(AgentFailure::Closed)
            }
        }
    }

    pub async fn cancel(&self) {
        let _ = self.events.send(AgentEvent::Cancel(self.owner)).await;
    }

    pub async fn release(&self) {
        let _ = self.events.send(AgentEvent::Release(self.owner)).await;
    }
}

fn decode_specs(fields: &HashMap<String, OwnedValue>) -> zbus::Result<PropertyMap> {
    PropertyMap::from_dbus(fields).map_err(|e| zbus::Error::Failure(e.to_string()))
}

fn reply(values: HashMap<String, String>) -> HashMap<String, Value<'static>> {
    values
        .into_iter()
        .map(|(name, value)| (name, Value::from(value)))
        .collect()
}

/// Agent registered with the core daemon
pub struct ConnmanAgent {
    core: AgentCore,
}

impl ConnmanAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }
}

#[interface(name = "net.connman.Agent")]
impl ConnmanAgent {
    async fn release(&self) -> zbus::fdo::Result<()> {
        tracing::info!("ConnMan agent released");
        self.core.release().await;
        Ok(())
    }

    async fn report_error(&self, service: ObjectPath<'_>, error: String) -> zbus::fdo::Result<()> {
        tracing::warn!("ConnMan reported error on {}: {}", service, error);
        Ok(())
    }

    async fn request_browser(&self, service: ObjectPath<'_>, url: String) -> zbus::fdo::Result<()> {
        tracing::info!("ConnMan requested browser for {} at {}", service, url);
        Ok(())
    }

    async fn request_input(
        &self,
        service: ObjectPath<'_>,
        fields: HashMap<String, OwnedValue>,
    ) -> Result<HashMap<String, Value<'static>>, ConnmanAgentError> {
        let specs = decode_specs(&fields)?;
        let values = self.core.request_input(service.as_str(), &specs).await?;
        Ok(reply(values))
    }

    async fn cancel(&self) -> zbus::fdo::Result<()> {
        tracing::info!("ConnMan canceled agent request");
        self.core.cancel().await;
        Ok(())
    }
}

/// Agent registered with the VPN daemon
pub struct VpnAgent {
    core: AgentCore,
}

impl VpnAgent {
    pub fn new(core: AgentCore) -> Self {
        Self { core }
    }
}

#[interface(name = "net.connman.vpn.Agent")]
impl VpnAgent {
    async fn release(&self) -> zbus::fdo::Result<()> {
        tracing::info!("VPN agent released");
        self.core.release().await;
        Ok(())
    }

    async fn report_error(&self, service: ObjectPath<'_>, error: String) -> zbus::fdo::Result<()> {
        tracing::warn!("VPN daemon reported error on {}: {}", service, error);
        Ok(())
    }

    async fn request_browser(&self, service: ObjectPath<'_>, url: String) -> zbus::fdo::Result<()> {
        tracing::info!("VPN daemon requested browser for {} at {}", service, url);
        Ok(())
    }

    async fn request_input(
        &self,
        service: ObjectPath<'_>,
        fields: HashMap<String, OwnedValue>,
    ) -> Result<HashMap<String, Value<'static>>, VpnAgentError> {
        let specs = decode_specs(&fields)?;
        let values = self.core.request_input(service.as_str(), &specs).await?;
        Ok(reply(values))
    }

    async fn cancel(&self) -> zbus::fdo::Result<()> {
        tracing::info!("VPN daemon canceled agent request");
        self.core.cancel().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(kind: &str, requirement: &str) -> PropertyMap {
        PropertyMap::new()
            .with("Type", kind)
            .with("Requirement", requirement)
    }

    fn psk_request() -> PropertyMap {
        PropertyMap::new()
            .with("Passphrase", field("psk", "mandatory"))
            .with("WPS", field("wpspin", "alternate"))
            .with("Identity", field("string", "optional"))
    }

    #[test]
    fn only_mandatory_fields_are_requested() {
        assert_eq!(mandatory_fields(&psk_request()), vec!["Passphrase".to_string()]);
    }

    #[tokio::test]
    async fn request_shows_one_field_and_cancel_fails() {
        let (tx, rx) = async_channel::unbounded();
        let core = AgentCore::new(AgentOwner::Connman, tx);

        let pending = tokio::spawn(async move {
            core.request_input("/net/connman/service/wifi_home", &psk_request())
                .await
        });

        let AgentEvent::Request(request) = rx.recv().await.unwrap() else {
            panic!("expected a credential request");
        };
        assert_eq!(request.fields, vec!["Passphrase".to_string()]);
        request.response_tx.send(None).unwrap();

        let result = pending.await.unwrap();
        assert!(matches!(result, Err(AgentFailure::Canceled)));
    }

    #[tokio::test]
    async fn confirmed_values_are_returned() {
        let (tx, rx) = async_channel::unbounded();
        let core = AgentCore::new(AgentOwner::Connman, tx);

        let pending = tokio::spawn(async move {
            core.request_input("/net/connman/service/wifi_home", &psk_request())
                .await
        });

        let AgentEvent::Request(request) = rx.recv().await.unwrap() else {
            panic!("expected a credential request");
        };
        let values = HashMap::from([("Passphrase".to_string(), "hunter22".to_string())]);
        request.response_tx.send(Some(values.clone())).unwrap();

        assert_eq!(pending.await.unwrap().unwrap(), values);
    }

    #[tokio::test]
    async fn closed_backend_is_reported() {
        let (tx, rx) = async_channel::unbounded();
        drop(rx);
        let core = AgentCore::new(AgentOwner::Connman, tx);
        let result = core.request_input("/net/connman/service/wifi_home", &psk_request()).await;
        assert!(matches!(result, Err(AgentFailure::Closed)));
    }

    #[tokio::test]
    async fn events_name_the_agent_they_come_from() {
        let (tx, rx) = async_channel::unbounded();
        let connman = AgentCore::new(AgentOwner::Connman, tx.clone());
        let vpn = AgentCore::new(AgentOwner::Vpn, tx);

        vpn.cancel().await;
        connman.release().await;

        assert!(matches!(rx.recv().await.unwrap(), AgentEvent::Cancel(AgentOwner::Vpn)));
        assert!(matches!(rx.recv().await.unwrap(), AgentEvent::Release(AgentOwner::Connman)));

        let pending = tokio::spawn(async move {
            let specs = PropertyMap::new().with("Username", field("string", "mandatory"));
            vpn.request_input("/net/connman/vpn/connection/office", &specs)
                .await
        });
        let AgentEvent::Request(request) = rx.recv().await.unwrap() else {
            panic!("expected a credential request");
        };
        assert_eq!(request.owner, AgentOwner::Vpn);
        request.response_tx.send(None).unwrap();
        assert!(matches!(pending.await.unwrap(), Err(AgentFailure::Canceled)));
    }

    #[test]
    fn failures_map_to_canceled_errors() {
        let err = ConnmanAgentError::from(AgentFailure::Canceled);
        assert!(matches!(err, ConnmanAgentError::Canceled(_)));
        let err = VpnAgentError::from(AgentFailure::Closed);
        assert!(matches!(err, VpnAgentError::Canceled(_)));
    }
}
