//! The normalized per-device schema and its persisted index wrappers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Schema version written into `index.json`.
pub const INDEX_VERSION: &str = "0.1.0";

/// A `<memory>` region, keyed by its `id` attribute in [`DeviceRecord::memory`].
///
/// `start`/`size` are kept as the hex strings PDSC authors write them; the
/// engine never parses them as integers, since it only ever round-trips them
/// through the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub start: String,
    pub size: String,
}

/// An `<algorithm>` entry, keyed by its (slash-normalized) `name` attribute in
/// [`DeviceRecord::algorithm`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlgorithmRegion {
    pub start: String,
    pub size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_size: Option<String>,
    pub default: bool,
}

/// `<compile header= define=>`, merged across the scope chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub define: Option<String>,
}

impl CompileInfo {
    pub fn is_empty(&self) -> bool {
        self.header.is_none() && self.define.is_none()
    }
}

/// `<processor Dfpu= Dendian= Dclock=>`, merged across the scope chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fpu: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endianness: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock: Option<String>,
}

impl ProcessorInfo {
    pub fn is_empty(&self) -> bool {
        self.fpu.is_none() && self.endianness.is_none() && self.clock.is_none()
    }
}

/// The canonical, flattened record for a single `<device>` element.
///
/// `memory`/`algorithm` use `BTreeMap` (not `HashMap`) so that two runs over
/// identical input serialize to byte-identical JSON, satisfying the
/// idempotence invariant on `index.json` without a separate sort pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub pdsc_file: String,
    pub pack_file: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub memory: BTreeMap<String, MemoryRegion>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub algorithm: BTreeMap<String, AlgorithmRegion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile: Option<CompileInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor: Option<ProcessorInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
}

/// `index.json`'s wire shape: the device map plus a top-level schema version.
///
/// `devices` is flattened into the same JSON object as `version`, so the file
/// reads as `{"version": "0.1.0", "SomeDevice": {...}, ...}` exactly as the
/// distilled schema requires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalIndex {
    pub version: String,
    #[serde(flatten)]
    pub devices: BTreeMap<String, DeviceRecord>,
}

impl GlobalIndex {
    pub fn new() -> Self {
        GlobalIndex {
            version: INDEX_VERSION.to_string(),
            devices: BTreeMap::new(),
        }
    }
}

/// `aliases.json`'s wire shape: board name to the devices it mounts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalAliases {
    #[serde(flatten)]
    pub boards: BTreeMap<String, Vec<String>>,
}

impl GlobalAliases {
    pub fn new() -> Self {
        GlobalAliases::default()
    }

    /// Unions `devices` into the board's mounted-device list, keeping names
    /// unique while preserving first-seen order.
    pub fn add(&mut self, board: String, devices: impl IntoIterator<Item = String>) {
        let entry = self.boards.entry(board).or_default();
        for device in devices {
            if !entry.contains(&device) {
                entry.push(device);
            }
        }
    }
}
