use crate::correlation::CorrelationTable;
use crate::pipes::PipeResolver;
use crate::vt::object_names::ObjectNameTable;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which peer sent the message. For ISOBUS-VT this distinguishes ECU->VT
/// from VT->ECU layouts under the same function code; for UASP and MA-USB
/// it distinguishes request from response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// ECU->VT, host->device, request.
    ToServer,
    /// VT->ECU, device->host, response.
    ToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ToServer => write!(f, "→srv"),
            Direction::ToClient => write!(f, "→cli"),
        }
    }
}

/// VT protocol version announced by the terminal. Layout switches that
/// depend on the version live here as single data facts, so decode
/// routines branch on a named predicate instead of a scattered literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VtVersion(pub u8);

impl VtVersion {
    /// Announced value 0xFF is the pre-version-3 convention for "version 2".
    pub fn from_announced(raw: u8) -> VtVersion {
        if raw == 0xFF {
            VtVersion(2)
        } else {
            VtVersion(raw)
        }
    }

    /// Pointing events carry a touch-state byte from version 4 on.
    pub fn has_touch_state(self) -> bool {
        self.0 >= 4
    }

    /// Execute Macro addresses objects with 2-byte identifiers from
    /// version 5 on, 1-byte before that.
    pub fn wide_macro_ids(self) -> bool {
        self.0 >= 5
    }

    /// The Working Set Maintenance initiating bit is only meaningful past
    /// version 3.
    pub fn has_initiating_bit(self) -> bool {
        self.0 > 3
    }
}

impl Default for VtVersion {
    fn default() -> Self {
        // Version unknown until a Working Set Maintenance or Get Memory
        // response announces it; version 2 layouts are the safe floor.
        VtVersion(2)
    }
}

/// Per-conversation dissection state.
///
/// One session per observed device/interface conversation; sessions own
/// their tables exclusively and are never shared, so concurrent dissection
/// of independent sessions needs no locking.
pub struct Session {
    pub vt_version: VtVersion,
    pub pipes: PipeResolver,
    pub correlation: CorrelationTable,
    pub object_names: ObjectNameTable,
}

impl Session {
    pub fn new() -> Self {
        Session {
            vt_version: VtVersion::default(),
            pipes: PipeResolver::new(),
            correlation: CorrelationTable::new(),
            object_names: ObjectNameTable::new(),
        }
    }

    /// Adopt a version announced on the wire.
    pub fn announce_vt_version(&mut self, raw: u8) {
        let version = VtVersion::from_announced(raw);
        if version != self.vt_version {
            debug!("session VT version {} -> {}", self.vt_version.0, version.0);
            self.vt_version = version;
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}
