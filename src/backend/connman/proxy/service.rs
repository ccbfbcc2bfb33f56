use zbus::proxy;
use zbus::zvariant::OwnedValue;

/// net.connman.Service interface
/// Object path: /net/connman/service/{identifier}
#[proxy(
    interface = "net.connman.Service",
    default_service = "net.connman",
    gen_blocking = false
)]
pub trait Service {
    fn connect(&self) -> zbus::Result<()>;

    fn disconnect(&self) -> zbus::Result<()>;

    #[zbus(signal, name = "PropertyChanged")]
    fn service_property_changed(&self, name: String, value: OwnedValue) -> zbus::Result<()>;
}
