//! SQLite row models

use serde::{Deserialize, Serialize};

/// Host-visible application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// IANA timezone name used by the day-phase theme engine
    pub timezone: String,
    /// Loopback port for the OAuth redirect-capture server
    pub redirect_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timezone: "Asia/Vientiane".to_string(),
            redirect_port: 8889,
        }
    }
}
