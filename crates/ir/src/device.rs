//! Device inventory and pinned-device matching.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Source of the devices a graph may be placed on.
///
/// The order of [`DeviceInventory::devices`] is significant: the first
/// non-pinned device becomes the default placement target.
pub trait DeviceInventory {
    fn devices(&self) -> Vec<String>;

    /// Optional descriptive properties, used for statistics only.
    fn properties(&self, _device: &str) -> Option<DeviceProperties> {
        None
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceProperties {
    pub device_type: String,
    #[serde(default)]
    pub frequency_mhz: u64,
    #[serde(default)]
    pub num_cores: u32,
    #[serde(default)]
    pub memory_size: u64,
    #[serde(default)]
    pub bandwidth_kbps: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<DeviceProperties>,
}

/// Fixed, in-memory device inventory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VirtualCluster {
    pub devices: Vec<DeviceEntry>,
}

impl VirtualCluster {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            devices: names
                .into_iter()
                .map(|name| DeviceEntry {
                    name: name.into(),
                    properties: None,
                })
                .collect(),
        }
    }

    pub fn with_device<N: Into<String>>(mut self, name: N, properties: DeviceProperties) -> Self {
        self.devices.push(DeviceEntry {
            name: name.into(),
            properties: Some(properties),
        });
        self
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let cluster = serde_json::from_slice(&data)?;
        Ok(cluster)
    }
}

impl DeviceInventory for VirtualCluster {
    fn devices(&self) -> Vec<String> {
        self.devices.iter().map(|entry| entry.name.clone()).collect()
    }

    fn properties(&self, device: &str) -> Option<DeviceProperties> {
        self.devices
            .iter()
            .find(|entry| entry.name == device)
            .and_then(|entry| entry.properties.clone())
    }
}

/// Substring matcher for devices that must never receive relocated work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedDevices {
    pattern: String,
}

impl PinnedDevices {
    pub fn new<P: Into<String>>(pattern: P) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_pinned(&self, device: &str) -> bool {
        !self.pattern.is_empty() && device.contains(&self.pattern)
    }

    /// First non-pinned device in inventory order.
    pub fn default_device<'a>(&self, devices: &'a [String]) -> Option<&'a str> {
        devices
            .iter()
            .map(String::as_str)
            .find(|device| !self.is_pinned(device))
    }
}

impl Default for PinnedDevices {
    fn default() -> Self {
        Self::new("CPU")
    }
}
