use zbus::proxy;
use zbus::zvariant::{OwnedValue, Value};

/// net.connman.Technology interface
/// Object path: /net/connman/technology/{type}
#[proxy(
    interface = "net.connman.Technology",
    default_service = "net.connman",
    gen_blocking = false
)]
pub trait Technology {
    #[zbus(name = "SetProperty")]
    fn set_technology_property(&self, name: &str, value: &Value<'_>) -> zbus::Result<()>;

    /// Returns once the scan finished; results arrive as `ServicesChanged`
    fn scan(&self) -> zbus::Result<()>;

    #[zbus(signal, name = "PropertyChanged")]
    fn technology_property_changed(&self, name: String, value: OwnedValue) -> zbus::Result<()>;
}
