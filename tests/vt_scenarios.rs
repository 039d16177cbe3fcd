//! ISOBUS-VT dissection scenarios against the public API.

use busdissect::{dissect_vt, Diagnostic, Direction, FieldValue, ObjectNameTable, Session};
use std::io::Write;

#[test]
fn soft_key_activation_end_to_end() {
    let mut session = Session::new();
    let tree = dissect_vt(
        &mut session,
        Direction::ToClient,
        &[0x00, 0x01, 0x34, 0x12, 0x78, 0x56, 0x03],
    );

    assert_eq!(
        tree.find("Function"),
        Some(&FieldValue::Text("Soft Key Activation (0x00)".into()))
    );
    assert_eq!(
        tree.find("Activation"),
        Some(&FieldValue::Text("pressed (1)".into()))
    );
    assert_eq!(
        tree.find("Object ID"),
        Some(&FieldValue::Text("Object ID 0x1234".into()))
    );
    assert_eq!(
        tree.find("Parent Object ID"),
        Some(&FieldValue::Text("Object ID 0x5678".into()))
    );
    assert_eq!(tree.find("Key number"), Some(&FieldValue::Unsigned(3)));
    assert_eq!(
        tree.summary,
        "Soft Key Activation: Object ID 0x1234 pressed, key 3"
    );
}

#[test]
fn unknown_function_produces_opaque_record_not_error() {
    let mut session = Session::new();
    let tree = dissect_vt(
        &mut session,
        Direction::ToServer,
        &[0xFE, 0xDE, 0xAD, 0xBE, 0xEF],
    );
    assert_eq!(
        tree.diagnostics,
        vec![Diagnostic::UnknownVariant { discriminant: 0xFE }]
    );
    assert_eq!(tree.summary, "Unknown VT function 0xFE (4 bytes)");
}

#[test]
fn object_name_file_changes_rendering() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "42,MainScreen").unwrap();

    // Without the table: hex fallback.
    let mut session = Session::new();
    let payload = [0xA0, 0x2A, 0x00, 0x01];
    let tree = dissect_vt(&mut session, Direction::ToServer, &payload);
    assert_eq!(
        tree.find("Object ID"),
        Some(&FieldValue::Text("Object ID 0x002A".into()))
    );

    // With it: the loaded name.
    let mut session = Session::new();
    session.object_names = ObjectNameTable::load_from_file(file.path()).unwrap();
    let tree = dissect_vt(&mut session, Direction::ToServer, &payload);
    assert_eq!(
        tree.find("Object ID"),
        Some(&FieldValue::Text("MainScreen".into()))
    );
}

#[test]
fn version_announcement_rewires_later_layouts() {
    let mut session = Session::new();

    // Pointing event before any announcement: version 2 layout, no touch
    // state byte.
    let pointing = [0x04, 0x64, 0x00, 0xC8, 0x00, 0x01];
    let tree = dissect_vt(&mut session, Direction::ToClient, &pointing);
    assert!(tree.find("Touch state").is_none());

    // The VT announces version 5 via Working Set Maintenance.
    dissect_vt(&mut session, Direction::ToClient, &[0xFF, 0x00, 0x05]);

    let tree = dissect_vt(&mut session, Direction::ToClient, &pointing);
    assert_eq!(
        tree.find("Touch state"),
        Some(&FieldValue::Text("pressed (1)".into()))
    );
}

#[test]
fn error_bit_flags_expand_every_set_bit() {
    let mut session = Session::new();
    // Change Numeric Value response, error byte 0x05.
    let tree = dissect_vt(
        &mut session,
        Direction::ToClient,
        &[0xA8, 0x34, 0x12, 0x05, 0x00, 0x00, 0x00, 0x00],
    );
    let Some(FieldValue::Flags { raw, clauses }) = tree.find("Error codes") else {
        panic!("error flags missing");
    };
    assert_eq!(*raw, 0x05);
    assert_eq!(clauses, &["Invalid Object ID", "Value in use"]);
}

#[test]
fn all_prefixes_of_all_known_functions_are_total() {
    let messages: [&[u8]; 6] = [
        &[0x00, 0x01, 0x34, 0x12, 0x78, 0x56, 0x03],
        &[0x04, 0x10, 0x00, 0x20, 0x00, 0x01],
        &[0xA0, 0x2A, 0x00, 0x01],
        &[0xA8, 0x34, 0x12, 0x00, 0x2A, 0x00, 0x00, 0x00],
        &[0xD0, b'v', b'1', b'.', b'0', b' ', b' ', b' '],
        &[0xFF, 0x80, 0x04],
    ];
    for message in messages {
        for len in 0..=message.len() {
            for direction in [Direction::ToServer, Direction::ToClient] {
                let mut session = Session::new();
                let tree = dissect_vt(&mut session, direction, &message[..len]);
                assert!(
                    !tree.summary.is_empty(),
                    "no summary for prefix {} of {:02X?}",
                    len,
                    message
                );
            }
        }
    }
}
