//! zbus proxy traits for the ConnMan D-Bus interfaces
//!
//! ConnMan publishes two services:
//! - `net.connman`: Manager, Technology and Service objects
//! - `net.connman.vpn`: VPN Manager and Connection objects
//!
//! Every object reports its state as `a{sv}` and announces single changes
//! through a `PropertyChanged(s, v)` signal. Each interface lives in its own
//! module so the generated `PropertyChanged` types do not collide.

use std::collections::HashMap;

use zbus::zvariant::{OwnedObjectPath, OwnedValue};

mod manager;
mod service;
mod technology;
mod vpn_connection;
mod vpn_manager;

pub use manager::{
    ManagerProxy, PropertyChanged as ManagerPropertyChanged,
    PropertyChangedStream as ManagerPropertyChangedStream, ServicesChanged, ServicesChangedStream,
    TechnologyAdded, TechnologyAddedStream, TechnologyRemoved, TechnologyRemovedStream,
};
pub use service::ServiceProxy;
pub use technology::TechnologyProxy;
pub use vpn_connection::VpnConnectionProxy;
pub use vpn_manager::{
    ConnectionAdded, ConnectionAddedStream, ConnectionRemoved, ConnectionRemovedStream,
    VpnManagerProxy,
};

/// `(path, properties)` pairs returned by enumeration calls.
pub type ObjectList = Vec<(OwnedObjectPath, HashMap<String, OwnedValue>)>;
