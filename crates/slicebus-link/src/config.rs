use serde::{Deserialize, Serialize};
use slicebus_frame::{FrameConfig, DEFAULT_MAX_FRAME, DEFAULT_NUM_CPORTS, MAX_NUM_CPORTS};

use crate::error::Result;

/// Bus sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Number of local bundle cports. Clamped to 256 (one byte on the wire).
    pub num_cports: usize,
    /// Largest frame accepted from or queued to the base, header included.
    pub max_frame_size: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            num_cports: DEFAULT_NUM_CPORTS,
            max_frame_size: DEFAULT_MAX_FRAME,
        }
    }
}

impl BusConfig {
    /// Parse a JSON config. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Effective number of local cports.
    pub fn cports(&self) -> usize {
        self.num_cports.min(MAX_NUM_CPORTS)
    }

    /// Decoder limits derived from this config.
    pub fn frame_config(&self) -> FrameConfig {
        FrameConfig {
            num_cports: self.cports(),
            max_frame_size: self.max_frame_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = BusConfig::from_json(r#"{"num_cports": 4}"#).unwrap();
        assert_eq!(config.num_cports, 4);
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME);
    }

    #[test]
    fn empty_object_is_default() {
        assert_eq!(BusConfig::from_json("{}").unwrap(), BusConfig::default());
    }

    #[test]
    fn invalid_json_is_reported() {
        let err = BusConfig::from_json("{num_cports").unwrap_err();
        assert!(matches!(err, crate::BusError::Json(_)));
    }

    #[test]
    fn cport_count_is_clamped() {
        let config = BusConfig {
            num_cports: 4096,
            ..BusConfig::default()
        };
        assert_eq!(config.frame_config().num_cports, MAX_NUM_CPORTS);
    }
}
