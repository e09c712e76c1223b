use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a native top-level window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(pub u64);

impl WindowHandle {
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for WindowHandle {
    fn from(raw: u64) -> Self {
        WindowHandle(raw)
    }
}
