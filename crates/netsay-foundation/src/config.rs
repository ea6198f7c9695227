//! Startup configuration, loaded once before the pipeline is built.
//!
//! Sources, in increasing precedence: built-in defaults, an optional
//! `netsay.toml` next to the binary, and `NETSAY_`-prefixed environment
//! variables (`NETSAY_QUEUE_CAPACITY=64`, `NETSAY_VOICE__ID=en-gb`, ...).

use crate::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Address the request front end binds to when the link is up.
    pub listen_addr: String,
    /// Capacity of the speech request queue. Producers block when full.
    pub queue_capacity: usize,
    /// Maximum decoded length of a request's text, in bytes. Longer
    /// requests are dropped, never truncated.
    pub max_text_bytes: usize,
    /// Per-chunk audio write timeout in milliseconds.
    pub write_timeout_ms: u64,
    pub voice: VoiceSettings,
    pub audio: AudioSettings,
    pub network: NetworkSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            queue_capacity: 32,
            max_text_bytes: 255,
            write_timeout_ms: 100,
            voice: VoiceSettings::default(),
            audio: AudioSettings::default(),
            network: NetworkSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// Engine voice identifier.
    pub id: String,
    /// Speaking rate in words per minute, engine default when unset.
    pub rate_wpm: Option<u32>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            id: "en".to_string(),
            rate_wpm: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Output device name; system default when unset.
    pub device: Option<String>,
}

/// Credentials for link monitors that perform association. The built-in
/// loopback monitor ignores these.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    pub ssid: Option<String>,
    pub passphrase: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("netsay").required(false))
            .add_source(config::Environment::with_prefix("NETSAY").separator("__"))
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let cfg: AppConfig = settings
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.queue_capacity == 0 {
            return Err(AppError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.max_text_bytes == 0 {
            return Err(AppError::Config(
                "max_text_bytes must be at least 1".to_string(),
            ));
        }
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(AppError::Config(format!(
                "listen_addr is not a valid socket address: {}",
                self.listen_addr
            )));
        }
        Ok(())
    }

    pub fn write_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.write_timeout_ms)
    }
}
