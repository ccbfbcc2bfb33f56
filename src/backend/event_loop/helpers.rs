use std::collections::HashMap;

use futures::{Stream, StreamExt};
use zbus::zvariant::{OwnedObjectPath, OwnedValue};

use super::super::connman::decode_objects;
use super::super::connman::proxy::{
    ConnectionAdded, ConnectionRemoved, ManagerPropertyChanged, ServicesChanged, TechnologyAdded,
    TechnologyRemoved,
};
use super::super::mirror::Inbound;
use super::super::properties::{PropertyMap, PropertyValue};

/// Poll the next item of an optional stream (or pend forever if None).
pub async fn next_from<S>(stream: &mut Option<S>) -> Option<S::Item>
where
    S: Stream + Unpin,
{
    match stream.as_mut() {
        Some(s) => StreamExt::next(s).await,
        None => std::future::pending().await,
    }
}

fn object_path(path: &OwnedObjectPath) -> String {
    path.as_str().to_string()
}

fn decode_properties(
    path: &OwnedObjectPath,
    raw: &HashMap<String, OwnedValue>,
) -> Option<PropertyMap> {
    match PropertyMap::from_dbus(raw) {
        Ok(properties) => Some(properties),
        Err(e) => {
            tracing::warn!("Ignoring malformed properties of {}: {}", path.as_str(), e);
            None
        }
    }
}

pub fn technology_added(signal: TechnologyAdded) -> Option<Inbound> {
    let args = log_args(signal.args(), "TechnologyAdded")?;
    Some(Inbound::TechnologyAdded {
        path: object_path(args.path()),
        properties: decode_properties(args.path(), args.properties())?,
    })
}

pub fn technology_removed(signal: TechnologyRemoved) -> Option<Inbound> {
    let args = log_args(signal.args(), "TechnologyRemoved")?;
    Some(Inbound::TechnologyRemoved {
        path: object_path(args.path()),
    })
}

pub fn services_changed(signal: ServicesChanged) -> Option<Inbound> {
    let args = log_args(signal.args(), "ServicesChanged")?;
    Some(Inbound::ServicesChanged {
        changed: decode_objects(args.changed()),
        removed: args.removed().iter().map(object_path).collect(),
    })
}

pub fn manager_property_changed(signal: ManagerPropertyChanged) -> Option<Inbound> {
    let args = log_args(signal.args(), "PropertyChanged")?;
    match PropertyValue::try_from(&**args.value()) {
        Ok(value) => Some(Inbound::ManagerPropertyChanged {
            name: args.name().clone(),
            value,
        }),
        Err(e) => {
            tracing::warn!("Ignoring manager property {}: {}", args.name(), e);
            None
        }
    }
}

pub fn connection_added(signal: ConnectionAdded) -> Option<Inbound> {
    let args = log_args(signal.args(), "ConnectionAdded")?;
    Some(Inbound::VpnConnectionAdded {
        path: object_path(args.path()),
        properties: decode_properties(args.path(), args.properties())?,
    })
}

pub fn connection_removed(signal: ConnectionRemoved) -> Option<Inbound> {
    let args = log_args(signal.args(), "ConnectionRemoved")?;
    Some(Inbound::VpnConnectionRemoved {
        path: object_path(args.path()),
    })
}

fn log_args<T>(args: zbus::Result<T>, signal: &str) -> Option<T> {
    match args {
        Ok(args) => Some(args),
        Err(e) => {
            tracing::warn!("Failed to parse {}: {}", signal, e);
            None
        }
    }
}
