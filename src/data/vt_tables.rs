use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref VT_FUNCTION_MAP: HashMap<u8, &'static str> = {
        let mut m = HashMap::new();

        // Activation / input events
        m.insert(0x00, "Soft Key Activation");
        m.insert(0x01, "Button Activation");
        m.insert(0x04, "Pointing Event");
        m.insert(0x05, "VT Select Input Object");
        m.insert(0x08, "VT Change Numeric Value");

        // Auxiliary control (type 2)
        m.insert(0x24, "Auxiliary Input Type 2 Maintenance");
        m.insert(0x26, "Auxiliary Assignment Type 2");

        // Commands
        m.insert(0xA0, "Hide/Show Object");
        m.insert(0xA2, "Change Child Location");
        m.insert(0xA3, "Change Size");
        m.insert(0xA8, "Change Numeric Value");
        m.insert(0xBE, "Execute Macro");

        // Technical data
        m.insert(0xC0, "Get Memory");
        m.insert(0xC2, "Get Number Of Soft Keys");
        m.insert(0xC5, "Get Hardware");

        // Non-volatile memory
        m.insert(0xD0, "Store Version");
        m.insert(0xD1, "Load Version");
        m.insert(0xD2, "Delete Version");

        m.insert(0xFF, "Working Set Maintenance");

        m
    };
}

pub fn vt_function_name(function: u8) -> Option<&'static str> {
    VT_FUNCTION_MAP.get(&function).copied()
}

/// Error-code clauses for command responses. Bit positions are shared
/// across most commands; command-specific tables below override where the
/// standard assigns different meanings.
pub const VT_GENERIC_ERROR_CLAUSES: [(u8, &str); 5] = [
    (0, "Invalid Object ID"),
    (1, "Invalid value"),
    (2, "Value in use"),
    (3, "Undefined"),
    (4, "Any other error"),
];

pub const VT_HIDE_SHOW_ERROR_CLAUSES: [(u8, &str); 4] = [
    (0, "Invalid Object ID"),
    (1, "Invalid Hide/Show value"),
    (2, "Undefined"),
    (4, "Any other error"),
];

pub const VT_CHANGE_CHILD_LOCATION_ERROR_CLAUSES: [(u8, &str); 3] = [
    (0, "Invalid Parent Object ID"),
    (1, "Invalid Object ID"),
    (4, "Any other error"),
];

pub const VT_CHANGE_SIZE_ERROR_CLAUSES: [(u8, &str); 3] = [
    (0, "Invalid Object ID"),
    (1, "Invalid size"),
    (4, "Any other error"),
];

pub const VT_VERSION_ERROR_CLAUSES: [(u8, &str); 4] = [
    (0, "Version label not correct"),
    (1, "Version label unknown"),
    (2, "Insufficient memory available"),
    (3, "Any other error"),
];

pub const KEY_ACTIVATION_CODES: [(u8, &str); 4] = [
    (0, "released"),
    (1, "pressed"),
    (2, "still held"),
    (3, "aborted"),
];

pub fn key_activation_name(code: u8) -> Option<&'static str> {
    KEY_ACTIVATION_CODES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

pub const TOUCH_STATES: [(u8, &str); 3] = [
    (0, "released"),
    (1, "pressed"),
    (2, "held"),
];

pub fn touch_state_name(code: u8) -> Option<&'static str> {
    TOUCH_STATES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_function_codes_resolve() {
        assert_eq!(vt_function_name(0x00), Some("Soft Key Activation"));
        assert_eq!(vt_function_name(0xFF), Some("Working Set Maintenance"));
    }

    #[test]
    fn unassigned_function_codes_resolve_to_none() {
        assert_eq!(vt_function_name(0xFE), None);
    }

    #[test]
    fn key_activation_codes() {
        assert_eq!(key_activation_name(1), Some("pressed"));
        assert_eq!(key_activation_name(9), None);
    }
}
