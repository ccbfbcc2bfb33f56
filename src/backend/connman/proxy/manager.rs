use std::collections::HashMap;

use zbus::proxy;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, OwnedValue};

use super::ObjectList;

/// net.connman.Manager interface
/// Object path: /
#[proxy(
    interface = "net.connman.Manager",
    default_service = "net.connman",
    default_path = "/",
    gen_blocking = false
)]
pub trait Manager {
    fn get_technologies(&self) -> zbus::Result<ObjectList>;

    /// Services in the daemon's preference order
    fn get_services(&self) -> zbus::Result<ObjectList>;

    fn register_agent(&self, path: &ObjectPath<'_>) -> zbus::Result<()>;

    fn unregister_agent(&self, path: &ObjectPath<'_>) -> zbus::Result<()>;

    #[zbus(signal)]
    fn technology_added(
        &self,
        path: OwnedObjectPath,
        properties: HashMap<String, OwnedValue>,
    ) -> zbus::Result<()>;

    #[zbus(signal)]
    fn technology_removed(&self, path: OwnedObjectPath) -> zbus::Result<()>;

    /// Changed services carry only the properties that changed
    #[zbus(signal)]
    fn services_changed(&self, changed: ObjectList, removed: Vec<OwnedObjectPath>)
        -> zbus::Result<()>;

    /// Global `State` and `OfflineMode`
    #[zbus(signal, name = "PropertyChanged")]
    fn manager_property_changed(&self, name: String, value: OwnedValue) -> zbus::Result<()>;
}
