use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref IU_NAME_MAP: HashMap<u8, &'static str> = {
        let mut m = HashMap::new();
        m.insert(0x01, "Command IU");
        m.insert(0x03, "Sense IU");
        m.insert(0x04, "Response IU");
        m.insert(0x05, "Task Management IU");
        m.insert(0x06, "Read Ready IU");
        m.insert(0x07, "Write Ready IU");
        m
    };

    static ref TMF_NAME_MAP: HashMap<u8, &'static str> = {
        let mut m = HashMap::new();
        m.insert(0x01, "Abort Task");
        m.insert(0x02, "Abort Task Set");
        m.insert(0x04, "Clear Task Set");
        m.insert(0x08, "Logical Unit Reset");
        m.insert(0x10, "I_T Nexus Reset");
        m.insert(0x40, "Clear ACA");
        m.insert(0x80, "Query Task");
        m.insert(0x81, "Query Task Set");
        m.insert(0x82, "Query Asynchronous Event");
        m
    };

    static ref RESPONSE_CODE_MAP: HashMap<u8, &'static str> = {
        let mut m = HashMap::new();
        m.insert(0x00, "Task Management Function Complete");
        m.insert(0x02, "Invalid Information Unit");
        m.insert(0x04, "Task Management Function Not Supported");
        m.insert(0x05, "Task Management Function Failed");
        m.insert(0x08, "Task Management Function Succeeded");
        m.insert(0x09, "Incorrect Logical Unit Number");
        m.insert(0x0A, "Overlapped Tag Attempted");
        m
    };

    static ref SCSI_STATUS_MAP: HashMap<u8, &'static str> = {
        let mut m = HashMap::new();
        m.insert(0x00, "Good");
        m.insert(0x02, "Check Condition");
        m.insert(0x04, "Condition Met");
        m.insert(0x08, "Busy");
        m.insert(0x18, "Reservation Conflict");
        m.insert(0x28, "Task Set Full");
        m.insert(0x30, "ACA Active");
        m.insert(0x40, "Task Aborted");
        m
    };
}

pub fn iu_name(iu_id: u8) -> Option<&'static str> {
    IU_NAME_MAP.get(&iu_id).copied()
}

pub fn task_management_function_name(function: u8) -> Option<&'static str> {
    TMF_NAME_MAP.get(&function).copied()
}

pub fn response_code_name(code: u8) -> Option<&'static str> {
    RESPONSE_CODE_MAP.get(&code).copied()
}

pub fn scsi_status_name(status: u8) -> Option<&'static str> {
    SCSI_STATUS_MAP.get(&status).copied()
}

/// Command IU task attributes (low 3 bits of the attribute byte).
pub fn task_attribute_name(attr: u8) -> &'static str {
    match attr & 0x07 {
        0x00 => "Simple",
        0x01 => "Head of Queue",
        0x02 => "Ordered",
        0x04 => "ACA",
        _ => "Reserved",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iu_ids_resolve() {
        assert_eq!(iu_name(0x01), Some("Command IU"));
        assert_eq!(iu_name(0x07), Some("Write Ready IU"));
        assert_eq!(iu_name(0x02), None);
    }

    #[test]
    fn status_codes_resolve() {
        assert_eq!(scsi_status_name(0x02), Some("Check Condition"));
        assert_eq!(scsi_status_name(0x01), None);
    }
}
