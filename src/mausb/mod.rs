//! Media Agnostic USB packet dissection.
//!
//! Every MA-USB packet opens with a 10-byte common header whose type byte
//! selects management, control or data handling; the subtype's low bit
//! separates requests from responses, so the request/response split falls
//! out of the same discriminant dispatch as everywhere else. The header
//! carries a declared total length which is reconciled against the bytes
//! actually present.

use crate::cursor::{ByteCursor, DecodeError, Endianness};
use crate::data::mausb_tables::{mausb_status_name, mausb_type_name};
use crate::tree::{Diagnostic, FieldTree};
use log::trace;

const LE: Endianness = Endianness::Little;

/// Top two bits of the type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketFamily {
    Management,
    Control,
    Data,
    Reserved,
}

impl PacketFamily {
    pub fn from_type_byte(type_byte: u8) -> PacketFamily {
        match type_byte >> 6 {
            0b00 => PacketFamily::Management,
            0b01 => PacketFamily::Control,
            0b10 => PacketFamily::Data,
            _ => PacketFamily::Reserved,
        }
    }
}

pub fn dissect_mausb(payload: &[u8]) -> FieldTree {
    let mut tree = FieldTree::new();
    let mut cursor = ByteCursor::new(payload);

    let header = (|| -> Result<(u8, usize), DecodeError> {
        let version_flags = cursor.read_u8()?;
        tree.push_uint("Version", (version_flags & 0x0F) as u64);
        tree.push_uint("Flags", (version_flags >> 4) as u64);

        let type_byte = cursor.read_u8()?;
        match mausb_type_name(type_byte) {
            Some(name) => tree.push_text("Type", format!("{} (0x{:02X})", name, type_byte)),
            None => tree.push_text("Type", format!("Unknown (0x{:02X})", type_byte)),
        }

        let declared_length = cursor.read_u16(LE)? as usize;
        tree.push_uint("Length", declared_length as u64);

        let handle = cursor.read_u24(LE)?;
        tree.push_uint("Device/EP handle", handle as u64);
        let device_address = cursor.read_u8()?;
        tree.push_uint("MA device address", device_address as u64);
        let ssid = cursor.read_u8()?;
        tree.push_uint("SSID", ssid as u64);
        let status = cursor.read_u8()?;
        match mausb_status_name(status) {
            Some(name) => tree.push_text("Status", format!("{} (0x{:02X})", name, status)),
            None => tree.push_uint("Status", status as u64),
        }
        Ok((type_byte, declared_length))
    })();

    let (type_byte, declared_length) = match header {
        Ok(h) => h,
        Err(DecodeError::OutOfBounds { offset, wanted, .. }) => {
            tree.diagnose(Diagnostic::OutOfBounds { offset, wanted });
            tree.set_summary("Truncated MA-USB header");
            return tree;
        }
    };
    trace!(
        "MA-USB type 0x{:02X}, declared {} of {} bytes",
        type_byte,
        declared_length,
        payload.len()
    );

    let family = PacketFamily::from_type_byte(type_byte);
    let known = mausb_type_name(type_byte).is_some();
    let result = match (family, known) {
        (PacketFamily::Data, true) => data_packet_fields(&mut cursor, &mut tree),
        (_, true) => {
            // Management/control subtypes past the common header are
            // type-specific blobs at this layer.
            let rest = cursor.read_remaining();
            if !rest.is_empty() {
                tree.push_bytes("Type-specific data", rest);
            }
            Ok(())
        }
        (_, false) => {
            let rest = cursor.read_remaining();
            if !rest.is_empty() {
                tree.push_bytes("Unparsed", rest);
            }
            tree.diagnose(Diagnostic::UnknownVariant {
                discriminant: type_byte as u32,
            });
            Ok(())
        }
    };
    if let Err(DecodeError::OutOfBounds { offset, wanted, .. }) = result {
        tree.diagnose(Diagnostic::OutOfBounds { offset, wanted });
        let rest = cursor.read_remaining();
        if !rest.is_empty() {
            tree.push_bytes("Unparsed", rest);
        }
    }

    // Reconcile the declared total length against what is really here.
    // Mismatches flag but never fail; excess bytes were already captured
    // above as type-specific or unparsed data.
    if declared_length != payload.len() {
        tree.diagnose(Diagnostic::LengthMismatch {
            declared: declared_length,
            consumed: payload.len(),
        });
    }

    let type_name = mausb_type_name(type_byte)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Unknown 0x{:02X}", type_byte));
    tree.set_summary(format!("MA-USB {} ({} bytes)", type_name, payload.len()));
    tree
}

/// Transfer request/response extension of the common header.
fn data_packet_fields(cursor: &mut ByteCursor, tree: &mut FieldTree) -> Result<(), DecodeError> {
    let eps_flags = cursor.read_u8()?;
    tree.push_text(
        "EP status",
        match eps_flags & 0x03 {
            0 => "Unassigned",
            1 => "Activated",
            2 => "Inactivated",
            _ => "Halted",
        },
    );
    let stream_id = cursor.read_u16(LE)?;
    tree.push_uint("Stream ID", stream_id as u64);
    let seq_number = cursor.read_u24(LE)?;
    tree.push_uint("Sequence number", seq_number as u64);
    let request_id = cursor.read_u8()?;
    tree.push_uint("Request ID", request_id as u64);
    let remaining_size = cursor.read_u32(LE)?;
    tree.push_uint("Remaining size/credit", remaining_size as u64);

    let data = cursor.read_remaining();
    if !data.is_empty() {
        tree.push_bytes("Payload", data);
    }
    Ok(())
}
