//! busdissect: dissectors for ISOBUS-VT, UASP and MA-USB capture payloads.
//!
//! One call dissects one message: the host hands in the raw bytes plus the
//! contextual metadata it knows (direction, endpoint, frame number) and
//! gets back an ordered field tree with a summary line and any
//! diagnostics. Dissection is total; a malformed message yields a partial
//! tree with diagnostics, never an error, and never disturbs later
//! messages. Per-conversation state (VT version, pipe roles, tag
//! correlation) lives in a `Session` the host keeps per conversation.

pub mod correlation;
pub mod cursor;
pub mod data;
pub mod mausb;
pub mod pipes;
pub mod session;
pub mod tree;
pub mod uas;
pub mod vt;

// Re-export the types a host needs for the common path.
pub use self::correlation::{CorrelationTable, DataDirection, ItlNexus, ItlqNexus, ItlqNexusId, ReadyKind};
pub use self::cursor::{ByteCursor, DecodeError, Endianness};
pub use self::mausb::dissect_mausb;
pub use self::pipes::PipeRole;
pub use self::session::{Direction, Session, VtVersion};
pub use self::tree::{Diagnostic, FieldNode, FieldTree, FieldValue};
pub use self::uas::scsi::{OpcodeNamer, ScsiSink};
pub use self::uas::{dissect_pipe_usage, dissect_uas};
pub use self::vt::dissect_vt;
pub use self::vt::object_names::ObjectNameTable;
