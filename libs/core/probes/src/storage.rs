//! Storage probe: reports used/total/percent for a caller-supplied list of
//! mount paths. Unreadable paths are silently skipped — the others must
//! still be reported.

use crate::{Probe, ProbeError, ProbeOutput};
use capfox_domain_models::StorageMount;
use std::collections::HashMap;
use std::path::PathBuf;
use sysinfo::Disks;
use tracing::debug;

pub struct StorageProbe {
    paths: Vec<PathBuf>,
}

impl StorageProbe {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl Probe for StorageProbe {
    fn name(&self) -> &str {
        "storage"
    }

    fn collect(&mut self) -> Result<ProbeOutput, ProbeError> {
        let disks = Disks::new_with_refreshed_list();
        let mut result = HashMap::new();

        for path in &self.paths {
            let mount = disks
                .iter()
                .filter(|d| path.starts_with(d.mount_point()))
                .max_by_key(|d| d.mount_point().as_os_str().len());

            match mount {
                Some(disk) => {
                    let total = disk.total_space();
                    let available = disk.available_space();
                    let used = total.saturating_sub(available);
                    result.insert(
                        path.to_string_lossy().to_string(),
                        StorageMount::new(used, total),
                    );
                }
                None => {
                    debug!(path = %path.display(), "storage path not resolvable to a mounted disk, skipping");
                }
            }
        }

        Ok(ProbeOutput::Storage(result))
    }
}
