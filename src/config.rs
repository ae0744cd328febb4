//! Layer configuration
//!
//! Serializable description of a scale-and-shift layer, in the same spirit as
//! a model config: plain data with serde derives so it can travel inside a
//! larger network description.
//!
//! ```rust
//! use scaleshift::ScaleShiftConfig;
//!
//! let config: ScaleShiftConfig = serde_json::from_str(r#"{"num_features": 64}"#)?;
//! assert_eq!(config.num_features, 64);
//! # Ok::<(), serde_json::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Scale-and-shift layer configuration
///
/// - `num_features`: Width of the feature dimension (D)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleShiftConfig {
    pub num_features: usize,
}

impl ScaleShiftConfig {
    /// Reject configurations that describe an empty layer
    pub fn validate(&self) -> Result<()> {
        if self.num_features == 0 {
            return Err(Error::InvalidArgument {
                arg: "num_features",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Parse a configuration from JSON and validate it
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::InvalidArgument {
            arg: "json",
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }
}
