// crates/capmesh-discovery/src/instance.rs
// ============================================================================
// Module: instance
// Description: On-disk cache of the issued service id.
// Purpose: Let a restarted capability process reclaim the id the router
//          issued to it instead of registering as a new instance.
// Dependencies: capmesh-core, serde, serde_json
// ============================================================================

//! ## Overview
//!
//! The router keys health history by service id, so a capability that
//! restarts should present the id it was issued before. [`InstanceDataFile`]
//! stores that id as a small JSON document under the service data
//! directory. Reads are best effort: a missing or corrupt file simply
//! yields no cached id and the service registers fresh.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use capmesh_core::ServiceId;
use serde::Deserialize;
use serde::Serialize;

/// Persisted identity of one capability instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct InstanceData {
    /// Id issued by the router on first registration.
    id: ServiceId,
    /// Service name the id was issued for.
    service_name: String,
}

/// JSON file caching the issued id for one service.
#[derive(Debug, Clone)]
pub struct InstanceDataFile {
    /// Full path of the cache file.
    path: PathBuf,
    /// Service name guarding against reusing another service's cache.
    service_name: String,
}

impl InstanceDataFile {
    /// Builds the cache handle for `service_name` under `data_dir`.
    #[must_use]
    pub fn new(data_dir: &Path, service_name: &str) -> Self {
        Self {
            path: data_dir.join(format!("{service_name}.instance.json")),
            service_name: service_name.to_string(),
        }
    }

    /// Returns the cached id, if a readable cache exists for this service.
    ///
    /// Corrupt or mismatched files are treated as absent.
    #[must_use]
    pub fn cached_id(&self) -> Option<ServiceId> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let data: InstanceData = serde_json::from_str(&raw).ok()?;
        if data.service_name == self.service_name {
            Some(data.id)
        } else {
            None
        }
    }

    /// Writes the issued id to disk, creating the data directory if needed.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`io::Error`] when the directory or file
    /// cannot be written. Callers treat this as non-fatal.
    pub fn store(&self, id: &ServiceId) -> Result<(), io::Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = InstanceData {
            id: id.clone(),
            service_name: self.service_name.clone(),
        };
        let payload = serde_json::to_string_pretty(&data).map_err(io::Error::other)?;
        fs::write(&self.path, payload)
    }
}
