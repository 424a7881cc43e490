//! Response tag: how the next `notify` payload must be interpreted.

use serde::{Deserialize, Serialize};

/// Interpretation requested for the next response packet.
///
/// The absence of a tag is modelled as `Option::None` by the holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseTag {
    /// Answer to a get-versioning query.
    Version,
    /// Answer to a get-power-state query.
    PowerState,
}

impl std::fmt::Display for ResponseTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Version => f.write_str("version"),
            Self::PowerState => f.write_str("power state"),
        }
    }
}
