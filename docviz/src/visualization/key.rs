//! Cache key policy

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ScatterOptions;

/// The one slot holding the whole-collection visualization
pub const SCATTER_CACHE_KEY: &str = "viz:scatter:main";

/// Strategy for generating cache keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// One cached visualization regardless of options (default)
    #[default]
    Single,

    /// One cached visualization per distinct option set
    PerOptions,
}

impl KeyStrategy {
    pub fn key_for(&self, options: &ScatterOptions) -> String {
        match self {
            Self::Single => SCATTER_CACHE_KEY.to_string(),
            Self::PerOptions => {
                // force_refresh changes how we read, not what we store
                let normalized = format!("limit={}", options.effective_limit());
                let digest = Sha256::digest(normalized.as_bytes());
                format!("viz:scatter:{}", &hex::encode(digest)[..16])
            }
        }
    }

    /// Whether more than one key can be live at a time
    pub fn is_multi_slot(&self) -> bool {
        matches!(self, Self::PerOptions)
    }
}
