use zbus::proxy;
use zbus::zvariant::OwnedValue;

/// net.connman.vpn.Connection interface
/// Object path: /net/connman/vpn/connection/{identifier}
#[proxy(
    interface = "net.connman.vpn.Connection",
    default_service = "net.connman.vpn",
    gen_blocking = false
)]
pub trait VpnConnection {
    fn connect(&self) -> zbus::Result<()>;

    fn disconnect(&self) -> zbus::Result<()>;

    #[zbus(signal, name = "PropertyChanged")]
    fn connection_property_changed(&self, name: String, value: OwnedValue) -> zbus::Result<()>;
}
