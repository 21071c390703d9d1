//! Config persistence adapter: a JSON document on a SPIFFS-backed VFS.
//!
//! The document layout matches what external tooling already writes, so
//! the file survives firmware upgrades in place. On the host the "file"
//! is an in-memory blob.

use log::{info, warn};

use crate::app::ports::{ConfigStorePort, LoadError, SaveError};
use crate::config::DeviceConfig;

#[cfg(target_os = "espidf")]
const CONFIG_PATH: &str = "/spiffs/config.json";

pub struct FsStoreAdapter {
    #[cfg(target_os = "espidf")]
    mounted: bool,
    #[cfg(not(target_os = "espidf"))]
    blob: Option<Vec<u8>>,
}

impl FsStoreAdapter {
    /// Mount the storage partition. A mount failure is not fatal here;
    /// it surfaces as `Mount` on every later load/save and the node
    /// runs on defaults without persistence.
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        {
            use esp_idf_sys::{esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register, ESP_OK};

            let conf = esp_vfs_spiffs_conf_t {
                base_path: c"/spiffs".as_ptr(),
                partition_label: core::ptr::null(),
                max_files: 4,
                format_if_mount_failed: true,
            };
            // SAFETY: called once from the main task before any file access.
            let ret = unsafe { esp_vfs_spiffs_register(&conf) };
            let mounted = ret == ESP_OK;
            if mounted {
                info!("FsStoreAdapter: SPIFFS mounted at /spiffs");
            } else {
                warn!("SPIFFS mount failed ({ret}), running without persistence");
            }
            Self { mounted }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            info!("FsStoreAdapter: simulation backend");
            Self { blob: None }
        }
    }

    /// Replace the stored blob (simulation only). Lets tests start from
    /// a pre-existing or corrupt document.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_sim_blob(&mut self, bytes: Vec<u8>) {
        self.blob = Some(bytes);
    }
}

impl Default for FsStoreAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn parse(bytes: &[u8]) -> Result<DeviceConfig, LoadError> {
    serde_json::from_slice(bytes).map_err(|e| {
        warn!("config document corrupt: {e}");
        LoadError::Corrupted
    })
}

impl ConfigStorePort for FsStoreAdapter {
    fn load(&self) -> Result<DeviceConfig, LoadError> {
        #[cfg(target_os = "espidf")]
        {
            if !self.mounted {
                return Err(LoadError::Mount);
            }
            match std::fs::read(CONFIG_PATH) {
                Ok(bytes) => {
                    let config = parse(&bytes)?;
                    info!("config loaded ({} bytes)", bytes.len());
                    Ok(config)
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    info!("no config document, using defaults");
                    Ok(DeviceConfig::default())
                }
                Err(e) => {
                    warn!("config read failed: {e}");
                    Err(LoadError::Mount)
                }
            }
        }

        #[cfg(not(target_os = "espidf"))]
        {
            match &self.blob {
                Some(bytes) => parse(bytes),
                None => Ok(DeviceConfig::default()),
            }
        }
    }

    fn save(&mut self, config: &DeviceConfig) -> Result<(), SaveError> {
        let bytes = serde_json::to_vec(config).map_err(|_| SaveError::Write)?;

        #[cfg(target_os = "espidf")]
        {
            if !self.mounted {
                return Err(SaveError::Mount);
            }
            std::fs::write(CONFIG_PATH, &bytes).map_err(|e| {
                warn!("config write failed: {e}");
                SaveError::Write
            })?;
            info!("config saved ({} bytes)", bytes.len());
            Ok(())
        }

        #[cfg(not(target_os = "espidf"))]
        {
            self.blob = Some(bytes);
            Ok(())
        }
    }
}
