use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// MA-USB packet subtype names, keyed by the full type+subtype byte.
    static ref MAUSB_TYPE_MAP: HashMap<u8, &'static str> = {
        let mut m = HashMap::new();

        // Management packets (type 00)
        m.insert(0x00, "CapReq");
        m.insert(0x01, "CapResp");
        m.insert(0x02, "USBDevHandleReq");
        m.insert(0x03, "USBDevHandleResp");
        m.insert(0x04, "EPHandleReq");
        m.insert(0x05, "EPHandleResp");
        m.insert(0x06, "EPActivateReq");
        m.insert(0x07, "EPActivateResp");
        m.insert(0x08, "EPInactivateReq");
        m.insert(0x09, "EPInactivateResp");
        m.insert(0x0A, "EPResetReq");
        m.insert(0x0B, "EPResetResp");
        m.insert(0x0C, "ClearTransfersReq");
        m.insert(0x0D, "ClearTransfersResp");
        m.insert(0x0E, "EPHandleDeleteReq");
        m.insert(0x0F, "EPHandleDeleteResp");
        m.insert(0x10, "DevResetReq");
        m.insert(0x11, "DevResetResp");
        m.insert(0x12, "ModifyEP0Req");
        m.insert(0x13, "ModifyEP0Resp");
        m.insert(0x14, "SetUSBDevAddrReq");
        m.insert(0x15, "SetUSBDevAddrResp");
        m.insert(0x16, "UpdateDevReq");
        m.insert(0x17, "UpdateDevResp");
        m.insert(0x18, "USBDevDisconnectReq");
        m.insert(0x19, "USBDevDisconnectResp");
        m.insert(0x1A, "USBSuspendReq");
        m.insert(0x1B, "USBSuspendResp");
        m.insert(0x1C, "USBResumeReq");
        m.insert(0x1D, "USBResumeResp");
        m.insert(0x1E, "RemoteWakeReq");
        m.insert(0x1F, "RemoteWakeResp");
        m.insert(0x20, "PingReq");
        m.insert(0x21, "PingResp");
        m.insert(0x22, "DevDisconnectReq");
        m.insert(0x23, "DevDisconnectResp");
        m.insert(0x24, "DevInitDisconnectReq");
        m.insert(0x25, "DevInitDisconnectResp");
        m.insert(0x26, "SynchReq");
        m.insert(0x27, "SynchResp");
        m.insert(0x28, "CancelTransferReq");
        m.insert(0x29, "CancelTransferResp");
        m.insert(0x2A, "EPOpenStreamReq");
        m.insert(0x2B, "EPOpenStreamResp");
        m.insert(0x2C, "EPCloseStreamReq");
        m.insert(0x2D, "EPCloseStreamResp");
        m.insert(0x2E, "USBDevResetReq");
        m.insert(0x2F, "USBDevResetResp");
        m.insert(0x30, "DevNotificationReq");
        m.insert(0x31, "DevNotificationResp");
        m.insert(0x32, "EPSetKeepAliveReq");
        m.insert(0x33, "EPSetKeepAliveResp");
        m.insert(0x34, "GetPortBWReq");
        m.insert(0x35, "GetPortBWResp");
        m.insert(0x36, "SleepReq");
        m.insert(0x37, "SleepResp");
        m.insert(0x38, "WakeReq");
        m.insert(0x39, "WakeResp");

        // Data packets (type 10)
        m.insert(0x80, "TransferReq");
        m.insert(0x81, "TransferResp");
        m.insert(0x82, "TransferAck");
        m.insert(0x83, "IsochTransferReq");
        m.insert(0x84, "IsochTransferResp");

        m
    };

    static ref MAUSB_STATUS_MAP: HashMap<u8, &'static str> = {
        let mut m = HashMap::new();
        m.insert(0x00, "SUCCESS (NO_ERROR)");
        m.insert(0x80, "UNSUCCESSFUL");
        m.insert(0x81, "INVALID_MA_USB_SESSION_STATE");
        m.insert(0x82, "INVALID_DEVICE_HANDLE");
        m.insert(0x83, "INVALID_EP_HANDLE");
        m.insert(0x84, "INVALID_EP_HANDLE_STATE");
        m.insert(0x85, "INVALID_REQUEST");
        m.insert(0x86, "MISSING_SEQUENCE_NUMBER");
        m.insert(0x87, "TRANSFER_PENDING");
        m.insert(0x88, "TRANSFER_EP_STALL");
        m.insert(0x89, "TRANSFER_SIZE_ERROR");
        m.insert(0x8A, "TRANSFER_DATA_BUFFER_ERROR");
        m.insert(0x8B, "TRANSFER_BABBLE_DETECTED");
        m.insert(0x8C, "TRANSFER_TRANSACTION_ERROR");
        m.insert(0x8D, "TRANSFER_SHORT_TRANSFER");
        m.insert(0x8E, "TRANSFER_CANCELLED");
        m.insert(0x8F, "INSUFFICIENT_RESOURCES");
        m.insert(0x90, "NOT_SUFFICIENT_BANDWIDTH");
        m.insert(0x91, "INTERNAL_ERROR");
        m.insert(0x92, "DATA_OVERRUN");
        m.insert(0x93, "DEVICE_NOT_ACCESSED");
        m.insert(0x94, "BUFFER_OVERRUN");
        m.insert(0x95, "BUSY");
        m.insert(0x96, "DROPPED_PACKET");
        m.insert(0x97, "ISOCH_TIME_EXPIRED");
        m.insert(0x98, "ISOCH_TIME_INVALID");
        m.insert(0x99, "NO_USB_PING_RESPONSE");
        m.insert(0x9A, "NOT_SUPPORTED");
        m.insert(0x9B, "REQUEST_DENIED");
        m
    };
}

pub fn mausb_type_name(type_byte: u8) -> Option<&'static str> {
    MAUSB_TYPE_MAP.get(&type_byte).copied()
}

pub fn mausb_status_name(status: u8) -> Option<&'static str> {
    MAUSB_STATUS_MAP.get(&status).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_resolve() {
        assert_eq!(mausb_type_name(0x00), Some("CapReq"));
        assert_eq!(mausb_type_name(0x80), Some("TransferReq"));
        assert_eq!(mausb_type_name(0x7F), None);
    }

    #[test]
    fn status_names_resolve() {
        assert_eq!(mausb_status_name(0x00), Some("SUCCESS (NO_ERROR)"));
        assert_eq!(mausb_status_name(0x88), Some("TRANSFER_EP_STALL"));
        assert_eq!(mausb_status_name(0x60), None);
    }
}
