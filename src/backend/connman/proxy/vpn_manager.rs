use std::collections::HashMap;

use zbus::proxy;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, OwnedValue};

use super::ObjectList;

/// net.connman.vpn.Manager interface
/// Object path: /
#[proxy(
    interface = "net.connman.vpn.Manager",
    default_service = "net.connman.vpn",
    default_path = "/",
    gen_blocking = false
)]
pub trait VpnManager {
    fn get_connections(&self) -> zbus::Result<ObjectList>;

    fn register_agent(&self, path: &ObjectPath<'_>) -> zbus::Result<()>;

    fn unregister_agent(&self, path: &ObjectPath<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    fn connection_added(
        &self,
        path: OwnedObjectPath,
        properties: HashMap<String, OwnedValue>,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    fn connection_removed(&self, path: OwnedObjectPath) -> zbus::Result<()>;
}
