use crate::data::uas_tables::scsi_status_name;

/// Boundary to the SCSI CDB decoder collaborator.
///
/// This crate dissects the IU framing and tag correlation around SCSI
/// traffic; the command/status bytes themselves cross this trait. Hosts
/// with a full CDB decoder implement it; `OpcodeNamer` is the built-in
/// fallback that just names common opcodes.
pub trait ScsiSink {
    /// A CDB was observed on the given LUN; returns a one-line description.
    fn command(&mut self, lun: u16, cdb: &[u8]) -> String;

    /// A command status was observed on the given LUN.
    fn status(&mut self, lun: u16, status: u8) -> String;
}

/// Default `ScsiSink` with no state: names well-known opcodes and renders
/// everything else as hex.
#[derive(Debug, Default)]
pub struct OpcodeNamer;

impl OpcodeNamer {
    pub fn new() -> Self {
        OpcodeNamer
    }
}

fn opcode_name(opcode: u8) -> Option<&'static str> {
    match opcode {
        0x00 => Some("TEST UNIT READY"),
        0x03 => Some("REQUEST SENSE"),
        0x08 => Some("READ(6)"),
        0x0A => Some("WRITE(6)"),
        0x12 => Some("INQUIRY"),
        0x1A => Some("MODE SENSE(6)"),
        0x25 => Some("READ CAPACITY(10)"),
        0x28 => Some("READ(10)"),
        0x2A => Some("WRITE(10)"),
        0x35 => Some("SYNCHRONIZE CACHE(10)"),
        0x88 => Some("READ(16)"),
        0x8A => Some("WRITE(16)"),
        0xA0 => Some("REPORT LUNS"),
        _ => None,
    }
}

impl ScsiSink for OpcodeNamer {
    fn command(&mut self, lun: u16, cdb: &[u8]) -> String {
        match cdb.first() {
            Some(&opcode) => match opcode_name(opcode) {
                Some(name) => format!("{} (LUN {})", name, lun),
                None => format!("SCSI opcode 0x{:02X} (LUN {})", opcode, lun),
            },
            None => format!("Empty CDB (LUN {})", lun),
        }
    }

    fn status(&mut self, lun: u16, status: u8) -> String {
        match scsi_status_name(status) {
            Some(name) => format!("{} (LUN {})", name, lun),
            None => format!("Status 0x{:02X} (LUN {})", status, lun),
        }
    }
}
