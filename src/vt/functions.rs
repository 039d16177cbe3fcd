//! Per-function-code decode routines for ISOBUS-VT messages.
//!
//! Each routine reads a fixed, direction-dependent field sequence from the
//! cursor into the tree and sets the summary. Routines return `DecodeError`
//! on truncation; the dispatcher in `mod.rs` turns that into a diagnostic
//! instead of propagating it.

use crate::cursor::{decode_string, ByteCursor, DecodeError, Endianness};
use crate::data::vt_tables::*;
use crate::session::{Direction, Session};
use crate::tree::{expand_bit_flags, FieldNode, FieldTree, FieldValue};

const LE: Endianness = Endianness::Little;

fn read_object_id(
    session: &Session,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
    label: &str,
) -> Result<u16, DecodeError> {
    let id = cursor.read_u16(LE)?;
    tree.push_text(label, session.object_names.render(id));
    Ok(id)
}

fn push_error_flags(cursor: &mut ByteCursor, tree: &mut FieldTree, clauses: &[(u8, &str)]) -> Result<u8, DecodeError> {
    let raw = cursor.read_u8()?;
    tree.push("Error codes", expand_bit_flags(raw, clauses));
    Ok(raw)
}

/// 0x00 Soft Key Activation / 0x01 Button Activation. Same field sequence
/// in both directions; the response echoes the event.
pub fn soft_key_activation(
    session: &Session,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
    function_name: &str,
) -> Result<(), DecodeError> {
    let code = cursor.read_u8()?;
    let activation = key_activation_name(code).unwrap_or("reserved");
    tree.push_text("Activation", format!("{} ({})", activation, code));
    let object = read_object_id(session, cursor, tree, "Object ID")?;
    read_object_id(session, cursor, tree, "Parent Object ID")?;
    let key_number = cursor.read_u8()?;
    tree.push_uint("Key number", key_number as u64);
    tree.set_summary(format!(
        "{}: {} {}, key {}",
        function_name,
        session.object_names.render(object),
        activation,
        key_number
    ));
    Ok(())
}

/// 0x04 Pointing Event. The touch-state byte exists from VT version 4 on.
pub fn pointing_event(
    session: &Session,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    let x = cursor.read_u16(LE)?;
    let y = cursor.read_u16(LE)?;
    tree.push_uint("X position", x as u64);
    tree.push_uint("Y position", y as u64);
    let mut state = String::new();
    if session.vt_version.has_touch_state() {
        let code = cursor.read_u8()?;
        let name = touch_state_name(code).unwrap_or("reserved");
        tree.push_text("Touch state", format!("{} ({})", name, code));
        state = format!(", {}", name);
    }
    tree.set_summary(format!("Pointing Event: ({}, {}){}", x, y, state));
    Ok(())
}

/// 0x05 VT Select Input Object.
pub fn select_input_object(
    session: &Session,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    let object = read_object_id(session, cursor, tree, "Object ID")?;
    let selected = cursor.read_u8()?;
    tree.push_text(
        "Selection",
        if selected == 1 { "selected" } else { "deselected" },
    );
    tree.set_summary(format!(
        "VT Select Input Object: {} {}",
        session.object_names.render(object),
        if selected == 1 { "selected" } else { "deselected" }
    ));
    Ok(())
}

/// 0x08 VT Change Numeric Value (operator changed a value on the VT).
pub fn vt_change_numeric_value(
    session: &Session,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    let object = read_object_id(session, cursor, tree, "Object ID")?;
    cursor.skip(1)?; // reserved
    let value = cursor.read_u32(LE)?;
    tree.push_uint("New value", value as u64);
    tree.set_summary(format!(
        "VT Change Numeric Value: {} = {}",
        session.object_names.render(object),
        value
    ));
    Ok(())
}

/// 0x24 Auxiliary Input Type 2 Maintenance.
pub fn aux_input_maintenance(
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    let model = cursor.read_u16(LE)?;
    tree.push_uint("Model identification code", model as u64);
    let status = cursor.read_u8()?;
    tree.push_text(
        "Status",
        match status {
            0 => "initializing",
            1 => "ready",
            _ => "reserved",
        },
    );
    tree.set_summary(format!(
        "Auxiliary Input Type 2 Maintenance: model {}, {}",
        model,
        if status == 1 { "ready" } else { "initializing" }
    ));
    Ok(())
}

/// 0x26 Auxiliary Assignment Type 2.
///
/// The command carries a count of preferred-assignment units; each unit
/// names an input device and carries its own nested count of function
/// assignments. The outer counts are authoritative: decoding stops after
/// exactly that many entries regardless of total message length.
pub fn aux_assignment(
    session: &Session,
    direction: Direction,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    match direction {
        Direction::ToServer => {
            let unit_count = cursor.read_u8()?;
            tree.push_uint("Preferred assignment units", unit_count as u64);
            for _ in 0..unit_count {
                let mut children = Vec::new();
                let name = cursor.read_uint(8, LE)?;
                children.push(FieldNode {
                    label: "Input unit NAME".to_string(),
                    value: FieldValue::Text(format!("0x{:016X}", name)),
                    children: Vec::new(),
                });
                let model = cursor.read_u16(LE)?;
                children.push(FieldNode {
                    label: "Model identification code".to_string(),
                    value: FieldValue::Unsigned(model as u64),
                    children: Vec::new(),
                });
                let function_count = cursor.read_u8()?;
                for _ in 0..function_count {
                    let function_attr = cursor.read_u8()?;
                    let object = cursor.read_u16(LE)?;
                    children.push(FieldNode {
                        label: format!("Function 0x{:02X}", function_attr),
                        value: FieldValue::Text(session.object_names.render(object)),
                        children: Vec::new(),
                    });
                }
                tree.push_group("Assignment unit", children);
            }
            tree.set_summary(format!(
                "Auxiliary Assignment Type 2: {} preferred assignment units",
                unit_count
            ));
        }
        Direction::ToClient => {
            push_error_flags(cursor, tree, &VT_GENERIC_ERROR_CLAUSES)?;
            tree.set_summary("Auxiliary Assignment Type 2 response");
        }
    }
    Ok(())
}

/// 0xA0 Hide/Show Object.
pub fn hide_show_object(
    session: &Session,
    direction: Direction,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    let object = read_object_id(session, cursor, tree, "Object ID")?;
    let show = cursor.read_u8()?;
    tree.push_text("Action", if show == 1 { "show" } else { "hide" });
    if direction == Direction::ToClient {
        push_error_flags(cursor, tree, &VT_HIDE_SHOW_ERROR_CLAUSES)?;
    }
    tree.set_summary(format!(
        "Hide/Show Object{}: {} {}",
        response_suffix(direction),
        if show == 1 { "show" } else { "hide" },
        session.object_names.render(object)
    ));
    Ok(())
}

/// 0xA2 Change Child Location. Position deltas are offset by 127.
pub fn change_child_location(
    session: &Session,
    direction: Direction,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    match direction {
        Direction::ToServer => {
            let parent = read_object_id(session, cursor, tree, "Parent Object ID")?;
            let object = read_object_id(session, cursor, tree, "Object ID")?;
            let dx = cursor.read_u8()? as i16 - 127;
            let dy = cursor.read_u8()? as i16 - 127;
            tree.push(
                "Relative X",
                FieldValue::Signed(dx as i64),
            );
            tree.push(
                "Relative Y",
                FieldValue::Signed(dy as i64),
            );
            tree.set_summary(format!(
                "Change Child Location: {} within {} by ({}, {})",
                session.object_names.render(object),
                session.object_names.render(parent),
                dx,
                dy
            ));
        }
        Direction::ToClient => {
            push_error_flags(cursor, tree, &VT_CHANGE_CHILD_LOCATION_ERROR_CLAUSES)?;
            tree.set_summary("Change Child Location response");
        }
    }
    Ok(())
}

/// 0xA3 Change Size.
pub fn change_size(
    session: &Session,
    direction: Direction,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    let object = read_object_id(session, cursor, tree, "Object ID")?;
    match direction {
        Direction::ToServer => {
            let width = cursor.read_u16(LE)?;
            let height = cursor.read_u16(LE)?;
            tree.push_uint("New width", width as u64);
            tree.push_uint("New height", height as u64);
            tree.set_summary(format!(
                "Change Size: {} to {}x{}",
                session.object_names.render(object),
                width,
                height
            ));
        }
        Direction::ToClient => {
            push_error_flags(cursor, tree, &VT_CHANGE_SIZE_ERROR_CLAUSES)?;
            tree.set_summary(format!(
                "Change Size response: {}",
                session.object_names.render(object)
            ));
        }
    }
    Ok(())
}

/// 0xA8 Change Numeric Value (ECU commands a new value).
pub fn change_numeric_value(
    session: &Session,
    direction: Direction,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    let object = read_object_id(session, cursor, tree, "Object ID")?;
    match direction {
        Direction::ToServer => {
            cursor.skip(1)?; // reserved
            let value = cursor.read_u32(LE)?;
            tree.push_uint("New value", value as u64);
            tree.set_summary(format!(
                "Change Numeric Value: {} = {}",
                session.object_names.render(object),
                value
            ));
        }
        Direction::ToClient => {
            push_error_flags(cursor, tree, &VT_GENERIC_ERROR_CLAUSES)?;
            let value = cursor.read_u32(LE)?;
            tree.push_uint("Value", value as u64);
            tree.set_summary(format!(
                "Change Numeric Value response: {} = {}",
                session.object_names.render(object),
                value
            ));
        }
    }
    Ok(())
}

/// 0xBE Execute Macro. Macro object IDs widened to 2 bytes in version 5.
pub fn execute_macro(
    session: &Session,
    direction: Direction,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    let id = if session.vt_version.wide_macro_ids() {
        cursor.read_u16(LE)?
    } else {
        cursor.read_u8()? as u16
    };
    tree.push_text("Macro", session.object_names.render(id));
    if direction == Direction::ToClient {
        push_error_flags(cursor, tree, &VT_GENERIC_ERROR_CLAUSES)?;
    }
    tree.set_summary(format!(
        "Execute Macro{}: {}",
        response_suffix(direction),
        session.object_names.render(id)
    ));
    Ok(())
}

/// 0xC0 Get Memory. The response announces the VT version, which updates
/// the session.
pub fn get_memory(
    session: &mut Session,
    direction: Direction,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    match direction {
        Direction::ToServer => {
            cursor.skip(1)?; // reserved
            let required = cursor.read_u32(LE)?;
            tree.push_uint("Memory required (bytes)", required as u64);
            tree.set_summary(format!("Get Memory: {} bytes required", required));
        }
        Direction::ToClient => {
            let raw_version = cursor.read_u8()?;
            session.announce_vt_version(raw_version);
            tree.push_uint("VT version", session.vt_version.0 as u64);
            let status = cursor.read_u8()?;
            tree.push_text(
                "Status",
                if status == 0 {
                    "enough memory"
                } else {
                    "not enough memory"
                },
            );
            tree.set_summary(format!(
                "Get Memory response: VT version {}, {}",
                session.vt_version.0,
                if status == 0 { "enough memory" } else { "not enough memory" }
            ));
        }
    }
    Ok(())
}

/// 0xC2 Get Number Of Soft Keys (response only carries data).
pub fn get_number_of_soft_keys(
    direction: Direction,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    if direction == Direction::ToClient {
        let x_dots = cursor.read_u8()?;
        let y_dots = cursor.read_u8()?;
        cursor.skip(2)?; // reserved
        let virtual_keys = cursor.read_u8()?;
        let physical_keys = cursor.read_u8()?;
        tree.push_uint("Key cell X dots", x_dots as u64);
        tree.push_uint("Key cell Y dots", y_dots as u64);
        tree.push_uint("Virtual soft keys", virtual_keys as u64);
        tree.push_uint("Physical soft keys", physical_keys as u64);
        tree.set_summary(format!(
            "Get Number Of Soft Keys response: {} physical, {} virtual, {}x{} cells",
            physical_keys, virtual_keys, x_dots, y_dots
        ));
    } else {
        tree.set_summary("Get Number Of Soft Keys");
    }
    Ok(())
}

const HARDWARE_CLAUSES: [(u8, &str); 4] = [
    (0, "Touch screen"),
    (1, "Pointing device"),
    (2, "Multiple frequency audio"),
    (3, "Adjustable audio volume"),
];

/// 0xC5 Get Hardware (response only carries data).
pub fn get_hardware(
    direction: Direction,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    if direction == Direction::ToClient {
        let boot_time = cursor.read_u8()?;
        tree.push_text(
            "Boot time",
            if boot_time == 0xFF {
                "not known".to_string()
            } else {
                format!("{} s", boot_time)
            },
        );
        let graphic = cursor.read_u8()?;
        tree.push_text(
            "Graphic type",
            match graphic {
                0 => "monochrome",
                1 => "16 colour",
                2 => "256 colour",
                _ => "reserved",
            },
        );
        let hardware = cursor.read_u8()?;
        tree.push("Hardware", expand_bit_flags(hardware, &HARDWARE_CLAUSES));
        let x_pixels = cursor.read_u16(LE)?;
        let y_pixels = cursor.read_u16(LE)?;
        tree.push_uint("Data mask X pixels", x_pixels as u64);
        tree.push_uint("Data mask Y pixels", y_pixels as u64);
        tree.set_summary(format!(
            "Get Hardware response: {}x{} pixels",
            x_pixels, y_pixels
        ));
    } else {
        tree.set_summary("Get Hardware");
    }
    Ok(())
}

/// 0xD0/0xD1/0xD2 Store/Load/Delete Version. The command carries a 7-byte
/// version label; the response carries only the error byte (after padding).
pub fn version_command(
    direction: Direction,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
    function_name: &str,
) -> Result<(), DecodeError> {
    match direction {
        Direction::ToServer => {
            let label_bytes = cursor.read_bytes(7)?;
            let label = decode_string(label_bytes);
            tree.push_text("Version label", label.clone());
            tree.set_summary(format!("{}: \"{}\"", function_name, label.trim_end()));
        }
        Direction::ToClient => {
            cursor.skip(5)?; // reserved
            push_error_flags(cursor, tree, &VT_VERSION_ERROR_CLAUSES)?;
            tree.set_summary(format!("{} response", function_name));
        }
    }
    Ok(())
}

/// 0xFF Working Set Maintenance.
///
/// The announced version byte is read first and 0xFF normalizes to
/// version 2 before the `version > 3` gate decides whether the initiating
/// bit of the bitmask is meaningful. Both rules are kept as-is.
pub fn working_set_maintenance(
    session: &mut Session,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    let bitmask = cursor.read_u8()?;
    let raw_version = cursor.read_u8()?;
    session.announce_vt_version(raw_version);
    tree.push_uint("VT version", session.vt_version.0 as u64);

    let mut initiating = "";
    if session.vt_version.has_initiating_bit() {
        if bitmask & 0x80 != 0 {
            tree.push_text("Bitmask", "initiating working set maintenance");
            initiating = " (initiating)";
        } else {
            tree.push_text("Bitmask", "maintaining");
        }
    } else {
        tree.push_uint("Bitmask", bitmask as u64);
    }
    tree.set_summary(format!(
        "Working Set Maintenance: version {}{}",
        session.vt_version.0, initiating
    ));
    Ok(())
}

fn response_suffix(direction: Direction) -> &'static str {
    match direction {
        Direction::ToServer => "",
        Direction::ToClient => " response",
    }
}
