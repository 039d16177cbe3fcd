//! ISOBUS Virtual Terminal dissection.
//!
//! One message per call: the first byte selects the function, the session
//! direction selects the ECU->VT or VT->ECU layout for that function.
//! Dissection is total: unknown functions and truncated fields produce a
//! tree with diagnostics, never an error.

pub mod functions;
pub mod object_names;

use crate::cursor::{ByteCursor, DecodeError};
use crate::data::vt_tables::vt_function_name;
use crate::session::{Direction, Session};
use crate::tree::{Diagnostic, FieldTree};
use log::trace;

pub fn dissect_vt(session: &mut Session, direction: Direction, payload: &[u8]) -> FieldTree {
    let mut tree = FieldTree::new();
    let mut cursor = ByteCursor::new(payload);

    let function = match cursor.read_u8() {
        Ok(f) => f,
        Err(_) => {
            tree.diagnose(Diagnostic::OutOfBounds {
                offset: 0,
                wanted: 1,
            });
            tree.set_summary("Empty VT message");
            return tree;
        }
    };
    trace!("VT function 0x{:02X} {}", function, direction);

    match vt_function_name(function) {
        Some(name) => tree.push_text("Function", format!("{} (0x{:02X})", name, function)),
        None => tree.push_text("Function", format!("Unknown (0x{:02X})", function)),
    }

    let result = decode_function(session, direction, function, &mut cursor, &mut tree);

    match result {
        Ok(()) => {
            // CAN frames pad to 8 bytes; anything left over is rendered raw.
            if cursor.remaining() > 0 {
                let trailing = cursor.read_remaining();
                if !trailing.iter().all(|&b| b == 0xFF) {
                    tree.push_bytes("Trailing data", trailing);
                }
            }
        }
        Err(DecodeError::OutOfBounds { offset, wanted, .. }) => {
            tree.diagnose(Diagnostic::OutOfBounds { offset, wanted });
            let rest = cursor.read_remaining();
            if !rest.is_empty() {
                tree.push_bytes("Unparsed", rest);
            }
            if tree.summary.is_empty() {
                let name = vt_function_name(function).unwrap_or("Unknown function");
                tree.set_summary(format!("{} (truncated)", name));
            }
        }
    }
    tree
}

fn decode_function(
    session: &mut Session,
    direction: Direction,
    function: u8,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    match function {
        0x00 => functions::soft_key_activation(session, cursor, tree, "Soft Key Activation"),
        0x01 => functions::soft_key_activation(session, cursor, tree, "Button Activation"),
        0x04 => functions::pointing_event(session, cursor, tree),
        0x05 => functions::select_input_object(session, cursor, tree),
        0x08 => functions::vt_change_numeric_value(session, cursor, tree),
        0x24 => functions::aux_input_maintenance(cursor, tree),
        0x26 => functions::aux_assignment(session, direction, cursor, tree),
        0xA0 => functions::hide_show_object(session, direction, cursor, tree),
        0xA2 => functions::change_child_location(session, direction, cursor, tree),
        0xA3 => functions::change_size(session, direction, cursor, tree),
        0xA8 => functions::change_numeric_value(session, direction, cursor, tree),
        0xBE => functions::execute_macro(session, direction, cursor, tree),
        0xC0 => functions::get_memory(session, direction, cursor, tree),
        0xC2 => functions::get_number_of_soft_keys(direction, cursor, tree),
        0xC5 => functions::get_hardware(direction, cursor, tree),
        0xD0 => functions::version_command(direction, cursor, tree, "Store Version"),
        0xD1 => functions::version_command(direction, cursor, tree, "Load Version"),
        0xD2 => functions::version_command(direction, cursor, tree, "Delete Version"),
        0xFF => functions::working_set_maintenance(session, cursor, tree),
        _ => {
            let remaining = cursor.remaining();
            let rest = cursor.read_remaining();
            if !rest.is_empty() {
                tree.push_bytes("Unparsed", rest);
            }
            tree.diagnose(Diagnostic::UnknownVariant {
                discriminant: function as u32,
            });
            tree.set_summary(format!(
                "Unknown VT function 0x{:02X} ({} bytes)",
                function, remaining
            ));
            Ok(())
        }
    }
}
