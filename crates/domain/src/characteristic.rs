//! The five vendor characteristics the session works with.
//!
//! | Name | UUID | Direction |
//! |------|------|-----------|
//! | `antidos` | `22bb746f-2bbd-7554-2d6f-726568705327` | write |
//! | `wakecpu` | `22bb746f-2bbf-7554-2d6f-726568705327` | write |
//! | `txpower` | `22bb746f-2bb2-7554-2d6f-726568705327` | write |
//! | `notify` | `22bb746f-2ba6-7554-2d6f-726568705327` | notify |
//! | `roll` | `22bb746f-2ba1-7554-2d6f-726568705327` | write |

use serde::{Deserialize, Serialize};

pub const ANTIDOS_CHAR: uuid::Uuid =
    uuid::Uuid::from_u128(0x22bb_746f_2bbd_7554_2d6f_7265_6870_5327);
pub const WAKECPU_CHAR: uuid::Uuid =
    uuid::Uuid::from_u128(0x22bb_746f_2bbf_7554_2d6f_7265_6870_5327);
pub const TXPOWER_CHAR: uuid::Uuid =
    uuid::Uuid::from_u128(0x22bb_746f_2bb2_7554_2d6f_7265_6870_5327);
pub const NOTIFY_CHAR: uuid::Uuid =
    uuid::Uuid::from_u128(0x22bb_746f_2ba6_7554_2d6f_7265_6870_5327);
pub const ROLL_CHAR: uuid::Uuid =
    uuid::Uuid::from_u128(0x22bb_746f_2ba1_7554_2d6f_7265_6870_5327);

/// Logical name of one of the fixed characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CharacteristicName {
    /// Anti-interference token register.
    Antidos,
    /// Wake-up register for the main CPU.
    Wakecpu,
    /// Radio transmit power register.
    Txpower,
    /// Response and async packet stream.
    Notify,
    /// Command channel.
    Roll,
}

impl CharacteristicName {
    /// Every name, in table order.
    pub const ALL: [Self; 5] = [
        Self::Antidos,
        Self::Wakecpu,
        Self::Txpower,
        Self::Notify,
        Self::Roll,
    ];

    /// Well-known UUID bound to this name.
    #[must_use]
    pub fn uuid(self) -> uuid::Uuid {
        match self {
            Self::Antidos => ANTIDOS_CHAR,
            Self::Wakecpu => WAKECPU_CHAR,
            Self::Txpower => TXPOWER_CHAR,
            Self::Notify => NOTIFY_CHAR,
            Self::Roll => ROLL_CHAR,
        }
    }

    /// Reverse lookup of [`uuid`](Self::uuid).
    #[must_use]
    pub fn from_uuid(uuid: uuid::Uuid) -> Option<Self> {
        Self::ALL.into_iter().find(|name| name.uuid() == uuid)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Antidos => "antidos",
            Self::Wakecpu => "wakecpu",
            Self::Txpower => "txpower",
            Self::Notify => "notify",
            Self::Roll => "roll",
        }
    }
}

impl std::fmt::Display for CharacteristicName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque handle assigned by the adapter to a discovered characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharacteristicHandle(u16);

impl CharacteristicHandle {
    #[must_use]
    pub fn new(raw: u16) -> Self {
        Self(raw)
    }

    #[must_use]
    pub fn raw(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for CharacteristicHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
