//! USB Attached SCSI (UASP) dissection.
//!
//! Traffic arrives on four bulk pipes whose roles (Command, Status,
//! Data-In, Data-Out) are learned from Pipe Usage descriptors. Command and
//! Status pipes carry IU-framed messages; the data pipes carry raw SCSI
//! payload with no tag of their own, so the owning command is inferred
//! from the most recent Read/Write Ready IU.

pub mod scsi;

use crate::correlation::{DataDirection, ItlqNexusId, ReadyKind};
use crate::cursor::{ByteCursor, DecodeError, Endianness};
use crate::data::uas_tables::*;
use crate::pipes::PipeRole;
use crate::session::Session;
use crate::tree::{Diagnostic, FieldTree};
use log::{debug, trace};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive as _;
use scsi::ScsiSink;

const BE: Endianness = Endianness::Big;

/// Information Unit discriminants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum IuId {
    Command = 0x01,
    Sense = 0x03,
    Response = 0x04,
    TaskManagement = 0x05,
    ReadReady = 0x06,
    WriteReady = 0x07,
}

/// UAS pipe usage descriptor (class-specific, bDescriptorType 0x24).
/// Learning one maps the endpoint to its logical role for the rest of the
/// session.
pub fn dissect_pipe_usage(session: &mut Session, endpoint: u8, payload: &[u8]) -> FieldTree {
    let mut tree = FieldTree::new();
    let mut cursor = ByteCursor::new(payload);

    let parsed = (|| -> Result<(), DecodeError> {
        let length = cursor.read_u8()?;
        tree.push_uint("bLength", length as u64);
        let descriptor_type = cursor.read_u8()?;
        tree.push_uint("bDescriptorType", descriptor_type as u64);
        let pipe_id = cursor.read_u8()?;
        match PipeRole::from_pipe_id(pipe_id) {
            Some(role) => {
                tree.push_text("bPipeID", format!("{} (0x{:02X})", role, pipe_id));
                session.pipes.learn_pipe_usage(endpoint, role);
                tree.set_summary(format!(
                    "Pipe Usage: endpoint 0x{:02X} is the {} pipe",
                    endpoint, role
                ));
            }
            None => {
                tree.push_uint("bPipeID", pipe_id as u64);
                tree.diagnose(Diagnostic::UnknownVariant {
                    discriminant: pipe_id as u32,
                });
                tree.set_summary(format!("Pipe Usage: unknown pipe ID 0x{:02X}", pipe_id));
            }
        }
        Ok(())
    })();
    if let Err(DecodeError::OutOfBounds { offset, wanted, .. }) = parsed {
        tree.diagnose(Diagnostic::OutOfBounds { offset, wanted });
        tree.set_summary("Truncated pipe usage descriptor");
    }
    tree
}

/// Dissect one bulk transfer belonging to a UAS interface.
///
/// `seq` is the host-supplied monotonically increasing frame number; all
/// correlation stamps and lookups run against it.
pub fn dissect_uas(
    session: &mut Session,
    endpoint: u8,
    seq: u64,
    payload: &[u8],
    scsi: &mut dyn ScsiSink,
) -> FieldTree {
    let Some(role) = session.pipes.resolve(endpoint) else {
        let mut tree = FieldTree::new();
        tree.push_bytes("Unclassified bulk data", payload);
        tree.diagnose(Diagnostic::UnresolvedPipeRole { endpoint });
        tree.set_summary(format!(
            "Unclassified bulk data on endpoint 0x{:02X} ({} bytes)",
            endpoint,
            payload.len()
        ));
        return tree;
    };
    trace!("UAS {} pipe, seq {}, {} bytes", role, seq, payload.len());

    match role {
        PipeRole::Command | PipeRole::Status => dissect_iu(session, seq, payload, scsi),
        PipeRole::DataIn => dissect_data(session, seq, payload, ReadyKind::Read),
        PipeRole::DataOut => dissect_data(session, seq, payload, ReadyKind::Write),
    }
}

fn dissect_iu(
    session: &mut Session,
    seq: u64,
    payload: &[u8],
    scsi: &mut dyn ScsiSink,
) -> FieldTree {
    let mut tree = FieldTree::new();
    let mut cursor = ByteCursor::new(payload);

    let header = (|| -> Result<(u8, u16), DecodeError> {
        let iu_id = cursor.read_u8()?;
        cursor.skip(1)?; // reserved
        let tag = cursor.read_u16(BE)?;
        Ok((iu_id, tag))
    })();
    let (iu_id, tag) = match header {
        Ok(h) => h,
        Err(DecodeError::OutOfBounds { offset, wanted, .. }) => {
            tree.diagnose(Diagnostic::OutOfBounds { offset, wanted });
            tree.push_bytes("Unparsed", payload);
            tree.set_summary("Truncated IU header");
            return tree;
        }
    };

    match iu_name(iu_id) {
        Some(name) => tree.push_text("IU", format!("{} (0x{:02X})", name, iu_id)),
        None => tree.push_text("IU", format!("Unknown (0x{:02X})", iu_id)),
    }
    tree.push_text("Tag", format!("0x{:04X}", tag));

    let result = match IuId::from_u8(iu_id) {
        Some(IuId::Command) => command_iu(session, seq, tag, &mut cursor, &mut tree, scsi),
        Some(IuId::Sense) => sense_iu(session, seq, tag, &mut cursor, &mut tree, scsi),
        Some(IuId::Response) => response_iu(session, seq, tag, &mut cursor, &mut tree),
        Some(IuId::TaskManagement) => task_management_iu(session, seq, tag, &mut cursor, &mut tree),
        Some(IuId::ReadReady) => ready_iu(session, seq, tag, &mut tree, ReadyKind::Read),
        Some(IuId::WriteReady) => ready_iu(session, seq, tag, &mut tree, ReadyKind::Write),
        None => {
            let rest = cursor.read_remaining();
            if !rest.is_empty() {
                tree.push_bytes("Unparsed", rest);
            }
            tree.diagnose(Diagnostic::UnknownVariant {
                discriminant: iu_id as u32,
            });
            tree.set_summary(format!("Unknown IU 0x{:02X}, tag 0x{:04X}", iu_id, tag));
            Ok(())
        }
    };

    if let Err(DecodeError::OutOfBounds { offset, wanted, .. }) = result {
        tree.diagnose(Diagnostic::OutOfBounds { offset, wanted });
        let rest = cursor.read_remaining();
        if !rest.is_empty() {
            tree.push_bytes("Unparsed", rest);
        }
        if tree.summary.is_empty() {
            tree.set_summary(format!(
                "{} (truncated), tag 0x{:04X}",
                iu_name(iu_id).unwrap_or("IU"),
                tag
            ));
        }
    }
    tree
}

fn command_iu(
    session: &mut Session,
    seq: u64,
    tag: u16,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
    scsi: &mut dyn ScsiSink,
) -> Result<(), DecodeError> {
    let attr = cursor.read_u8()?;
    tree.push_text(
        "Task attribute",
        format!("{} (0x{:02X})", task_attribute_name(attr), attr),
    );
    cursor.skip(1)?; // reserved
    let additional_cdb_length = cursor.read_u8()? as usize;
    cursor.skip(1)?; // reserved
    let lun_bytes = cursor.read_bytes(8)?;
    let lun = u16::from_be_bytes([lun_bytes[0], lun_bytes[1]]);
    tree.push_uint("LUN", lun as u64);

    let cdb_len = 16 + additional_cdb_length;
    let cdb = if cursor.remaining() >= cdb_len {
        cursor.read_bytes(cdb_len)?
    } else {
        // Short CDB in a truncated capture: take what is there.
        let consumed = cursor.remaining();
        tree.diagnose(Diagnostic::LengthMismatch {
            declared: cdb_len,
            consumed,
        });
        cursor.read_remaining()
    };
    tree.push_bytes("CDB", cdb);

    let id = session.correlation.begin_command(lun, tag, seq);
    let description = scsi.command(lun, cdb);
    session
        .correlation
        .set_command_summary(id, description.clone());
    tree.push_text("Command", description.clone());
    tree.set_summary(format!("Command IU tag 0x{:04X}: {}", tag, description));
    Ok(())
}

fn sense_iu(
    session: &mut Session,
    seq: u64,
    tag: u16,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
    scsi: &mut dyn ScsiSink,
) -> Result<(), DecodeError> {
    let status_qualifier = cursor.read_u16(BE)?;
    tree.push_uint("Status qualifier", status_qualifier as u64);
    let status = cursor.read_u8()?;
    cursor.skip(7)?; // reserved
    let sense_length = cursor.read_u16(BE)? as usize;
    if sense_length > 0 {
        let available = cursor.remaining().min(sense_length);
        let sense = cursor.read_bytes(available)?;
        tree.push_bytes("Sense data", sense);
        if available < sense_length {
            tree.diagnose(Diagnostic::LengthMismatch {
                declared: sense_length,
                consumed: available,
            });
        }
    }

    let id = session.correlation.mark_completed(tag, seq);
    let lun = linked_lun(session, id);
    let status_text = scsi.status(lun, status);
    tree.push_text("Status", status_text.clone());
    push_command_link(session, tree, id, tag);
    tree.set_summary(format!("Sense IU tag 0x{:04X}: {}", tag, status_text));
    Ok(())
}

fn response_iu(
    session: &mut Session,
    seq: u64,
    tag: u16,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    let info = cursor.read_u24(BE)?;
    tree.push_uint("Additional response information", info as u64);
    let code = cursor.read_u8()?;
    let name = response_code_name(code).unwrap_or("Reserved");
    tree.push_text("Response code", format!("{} (0x{:02X})", name, code));

    let id = session.correlation.mark_completed(tag, seq);
    push_command_link(session, tree, id, tag);
    tree.set_summary(format!("Response IU tag 0x{:04X}: {}", tag, name));
    Ok(())
}

fn task_management_iu(
    session: &mut Session,
    seq: u64,
    tag: u16,
    cursor: &mut ByteCursor,
    tree: &mut FieldTree,
) -> Result<(), DecodeError> {
    let function = cursor.read_u8()?;
    let name = task_management_function_name(function).unwrap_or("Reserved");
    tree.push_text(
        "Task management function",
        format!("{} (0x{:02X})", name, function),
    );
    cursor.skip(1)?; // reserved
    let managed_tag = cursor.read_u16(BE)?;
    tree.push_text("Tag of managed task", format!("0x{:04X}", managed_tag));
    let lun_bytes = cursor.read_bytes(8)?;
    let lun = u16::from_be_bytes([lun_bytes[0], lun_bytes[1]]);
    tree.push_uint("LUN", lun as u64);

    // The managed command is the one being aborted/queried, not this IU.
    match session.correlation.find_nexus(managed_tag, seq) {
        Some(id) => push_command_link(session, tree, Some(id), managed_tag),
        None => tree.diagnose(Diagnostic::UnresolvedTag { tag: managed_tag }),
    }
    tree.set_summary(format!(
        "Task Management IU tag 0x{:04X}: {} of tag 0x{:04X}",
        tag, name, managed_tag
    ));
    Ok(())
}

fn ready_iu(
    session: &mut Session,
    seq: u64,
    tag: u16,
    tree: &mut FieldTree,
    kind: ReadyKind,
) -> Result<(), DecodeError> {
    let id = session.correlation.mark_ready(kind, tag, seq);
    push_command_link(session, tree, id, tag);
    let name = match kind {
        ReadyKind::Read => "Read Ready",
        ReadyKind::Write => "Write Ready",
    };
    tree.set_summary(format!("{} IU tag 0x{:04X}", name, tag));
    Ok(())
}

/// Raw payload on a data pipe: no IU framing, no tag. The tag comes from
/// the most recent Ready IU of the matching direction.
fn dissect_data(
    session: &mut Session,
    seq: u64,
    payload: &[u8],
    kind: ReadyKind,
) -> FieldTree {
    let mut tree = FieldTree::new();
    let (direction, label) = match kind {
        ReadyKind::Read => (DataDirection::Received, "Data-In"),
        ReadyKind::Write => (DataDirection::Sent, "Data-Out"),
    };
    tree.push_bytes("SCSI payload", payload);

    match session.correlation.latest_ready_tag(kind, seq) {
        Some(tag) => {
            tree.push_text("Inferred tag", format!("0x{:04X}", tag));
            let id = session.correlation.mark_data(direction, tag, seq);
            if id.is_none() {
                debug!("data frame {} has tag 0x{:04X} but no nexus", seq, tag);
                tree.diagnose(Diagnostic::UnresolvedTag { tag });
            }
            push_command_link(session, &mut tree, id, tag);
            tree.set_summary(format!(
                "{} ({} bytes), tag 0x{:04X}",
                label,
                payload.len(),
                tag
            ));
        }
        None => {
            // Capture started mid-transaction: render unlinked.
            tree.set_summary(format!("{} ({} bytes), no preceding Ready IU", label, payload.len()));
        }
    }
    tree
}

fn linked_lun(session: &Session, id: Option<ItlqNexusId>) -> u16 {
    id.and_then(|id| session.correlation.nexus(id))
        .map(|nexus| nexus.lun)
        .unwrap_or(0)
}

/// Render cross-links to the originating command, or an UnresolvedTag
/// diagnostic when the lookup found nothing.
fn push_command_link(
    session: &Session,
    tree: &mut FieldTree,
    id: Option<ItlqNexusId>,
    tag: u16,
) {
    match id.and_then(|id| session.correlation.nexus(id)) {
        Some(nexus) => {
            tree.push_uint("Command in frame", nexus.started_frame);
            if let Some(summary) = &nexus.command_summary {
                tree.push_text("Command", summary.clone());
            }
            if let Some(frame) = nexus.completed_frame {
                tree.push_uint("Completed in frame", frame);
            }
        }
        None => {
            tree.diagnose(Diagnostic::UnresolvedTag { tag });
        }
    }
}
