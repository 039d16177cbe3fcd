//! End-to-end UASP correlation scenarios, driving the public API the way
//! a capture host would: pipe usage descriptors first, then bulk traffic
//! in capture order.

use busdissect::{
    dissect_pipe_usage, dissect_uas, Diagnostic, FieldValue, OpcodeNamer, PipeRole, ReadyKind,
    Session,
};

fn pipe_usage(pipe_id: u8) -> [u8; 4] {
    [0x04, 0x24, pipe_id, 0x00]
}

fn setup_session() -> Session {
    let mut session = Session::new();
    dissect_pipe_usage(&mut session, 0x02, &pipe_usage(0x01)); // command
    dissect_pipe_usage(&mut session, 0x81, &pipe_usage(0x02)); // status
    dissect_pipe_usage(&mut session, 0x83, &pipe_usage(0x03)); // data-in
    dissect_pipe_usage(&mut session, 0x04, &pipe_usage(0x04)); // data-out
    session
}

fn command_iu(tag: u16, lun: u16, opcode: u8) -> Vec<u8> {
    let mut p = vec![0x01, 0x00];
    p.extend_from_slice(&tag.to_be_bytes());
    p.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
    p.extend_from_slice(&lun.to_be_bytes());
    p.extend_from_slice(&[0u8; 6]);
    let mut cdb = [0u8; 16];
    cdb[0] = opcode;
    p.extend_from_slice(&cdb);
    p
}

fn sense_iu(tag: u16, status: u8) -> Vec<u8> {
    let mut p = vec![0x03, 0x00];
    p.extend_from_slice(&tag.to_be_bytes());
    p.extend_from_slice(&[0x00, 0x00, status]);
    p.extend_from_slice(&[0u8; 7]);
    p.extend_from_slice(&[0x00, 0x00]);
    p
}

fn ready_iu(id: u8, tag: u16) -> Vec<u8> {
    let mut p = vec![id, 0x00];
    p.extend_from_slice(&tag.to_be_bytes());
    p
}

#[test]
fn pipe_roles_are_learned_from_descriptors() {
    let session = setup_session();
    assert_eq!(session.pipes.resolve(0x02), Some(PipeRole::Command));
    assert_eq!(session.pipes.resolve(0x81), Some(PipeRole::Status));
    assert_eq!(session.pipes.resolve(0x83), Some(PipeRole::DataIn));
    assert_eq!(session.pipes.resolve(0x04), Some(PipeRole::DataOut));
}

#[test]
fn write_command_scenario() {
    // Command at frame 10, Write Ready at 12, data out at 13, Sense at 15.
    let mut session = setup_session();
    let mut scsi = OpcodeNamer::new();

    dissect_uas(&mut session, 0x02, 10, &command_iu(0x0007, 0, 0x2A), &mut scsi);
    dissect_uas(&mut session, 0x81, 12, &ready_iu(0x07, 0x0007), &mut scsi);
    dissect_uas(&mut session, 0x04, 13, &[0x11; 512], &mut scsi);
    dissect_uas(&mut session, 0x81, 15, &sense_iu(0x0007, 0x00), &mut scsi);

    let id = session.correlation.find_nexus(0x0007, 20).expect("nexus");
    let nexus = session.correlation.nexus(id).unwrap();
    assert_eq!(nexus.started_frame, 10);
    assert_eq!(nexus.write_ready_frame, Some(12));
    assert_eq!(nexus.data_sent_frame, Some(13));
    assert_eq!(nexus.completed_frame, Some(15));
    assert_eq!(nexus.read_ready_frame, None);
    assert_eq!(nexus.data_received_frame, None);
}

#[test]
fn interleaved_reads_keep_their_own_nexuses() {
    let mut session = setup_session();
    let mut scsi = OpcodeNamer::new();

    dissect_uas(&mut session, 0x02, 1, &command_iu(0x0001, 0, 0x28), &mut scsi);
    dissect_uas(&mut session, 0x02, 2, &command_iu(0x0002, 0, 0x28), &mut scsi);
    dissect_uas(&mut session, 0x81, 3, &ready_iu(0x06, 0x0002), &mut scsi);
    dissect_uas(&mut session, 0x83, 4, &[0xAA; 64], &mut scsi);
    dissect_uas(&mut session, 0x81, 5, &ready_iu(0x06, 0x0001), &mut scsi);
    dissect_uas(&mut session, 0x83, 6, &[0xBB; 64], &mut scsi);
    dissect_uas(&mut session, 0x81, 7, &sense_iu(0x0002, 0x00), &mut scsi);
    dissect_uas(&mut session, 0x81, 8, &sense_iu(0x0001, 0x00), &mut scsi);

    let one = session
        .correlation
        .nexus(session.correlation.find_nexus(0x0001, 9).unwrap())
        .unwrap();
    let two = session
        .correlation
        .nexus(session.correlation.find_nexus(0x0002, 9).unwrap())
        .unwrap();

    // Frame 4's data followed tag 2's Ready; frame 6's followed tag 1's.
    assert_eq!(two.data_received_frame, Some(4));
    assert_eq!(one.data_received_frame, Some(6));
    assert_eq!(two.completed_frame, Some(7));
    assert_eq!(one.completed_frame, Some(8));
}

#[test]
fn tag_reuse_across_the_capture() {
    let mut session = setup_session();
    let mut scsi = OpcodeNamer::new();

    dissect_uas(&mut session, 0x02, 10, &command_iu(0x0001, 0, 0x12), &mut scsi);
    dissect_uas(&mut session, 0x81, 11, &sense_iu(0x0001, 0x00), &mut scsi);
    dissect_uas(&mut session, 0x02, 20, &command_iu(0x0001, 0, 0x25), &mut scsi);
    dissect_uas(&mut session, 0x81, 21, &sense_iu(0x0001, 0x00), &mut scsi);

    let first = session
        .correlation
        .nexus(session.correlation.find_nexus(0x0001, 15).unwrap())
        .unwrap();
    let second = session
        .correlation
        .nexus(session.correlation.find_nexus(0x0001, 25).unwrap())
        .unwrap();
    assert_eq!(first.started_frame, 10);
    assert_eq!(first.completed_frame, Some(11));
    assert_eq!(second.started_frame, 20);
    assert_eq!(second.completed_frame, Some(21));
    assert_eq!(
        first.command_summary.as_deref(),
        Some("INQUIRY (LUN 0)")
    );
    assert_eq!(
        second.command_summary.as_deref(),
        Some("READ CAPACITY(10) (LUN 0)")
    );
}

#[test]
fn capture_started_mid_transaction_degrades_gracefully() {
    let mut session = setup_session();
    let mut scsi = OpcodeNamer::new();

    // Status for a command the capture never saw.
    let tree = dissect_uas(&mut session, 0x81, 1, &sense_iu(0x0042, 0x02), &mut scsi);
    assert_eq!(
        tree.diagnostics,
        vec![Diagnostic::UnresolvedTag { tag: 0x0042 }]
    );

    // Data with no preceding Ready IU.
    let tree = dissect_uas(&mut session, 0x83, 2, &[0x00; 16], &mut scsi);
    assert!(tree.summary.contains("no preceding Ready IU"));

    // Later traffic is unaffected.
    dissect_uas(&mut session, 0x02, 3, &command_iu(0x0042, 0, 0x00), &mut scsi);
    let tree = dissect_uas(&mut session, 0x81, 4, &sense_iu(0x0042, 0x00), &mut scsi);
    assert!(tree.diagnostics.is_empty());
    assert_eq!(tree.find("Command in frame"), Some(&FieldValue::Unsigned(3)));
}

#[test]
fn sessions_do_not_share_correlation_state() {
    let mut a = setup_session();
    let mut b = setup_session();
    let mut scsi = OpcodeNamer::new();

    dissect_uas(&mut a, 0x02, 1, &command_iu(0x0001, 0, 0x12), &mut scsi);
    assert!(a.correlation.find_nexus(0x0001, 2).is_some());
    assert!(b.correlation.find_nexus(0x0001, 2).is_none());
}

#[test]
fn every_truncation_of_a_command_iu_is_total() {
    let full = command_iu(0x0005, 1, 0x2A);
    for len in 0..full.len() {
        let mut session = setup_session();
        let mut scsi = OpcodeNamer::new();
        let tree = dissect_uas(&mut session, 0x02, 1, &full[..len], &mut scsi);
        assert!(!tree.summary.is_empty(), "no summary at prefix {}", len);
        assert!(
            !tree.diagnostics.is_empty(),
            "no diagnostic at prefix {}",
            len
        );
    }
}

#[test]
fn short_cdb_carries_a_length_mismatch() {
    let full = command_iu(0x0005, 0, 0x2A);
    let mut session = setup_session();
    let mut scsi = OpcodeNamer::new();

    // Full fixed header, but only 4 of the 16 declared CDB bytes.
    let tree = dissect_uas(&mut session, 0x02, 1, &full[..20], &mut scsi);
    assert_eq!(
        tree.diagnostics,
        vec![Diagnostic::LengthMismatch {
            declared: 16,
            consumed: 4
        }]
    );
    // The truncated CDB still renders and the command is still registered.
    assert!(session.correlation.find_nexus(0x0005, 2).is_some());
}

#[test]
fn ready_side_table_uses_matching_direction_only() {
    let mut session = setup_session();
    let mut scsi = OpcodeNamer::new();

    dissect_uas(&mut session, 0x02, 1, &command_iu(0x0008, 0, 0x28), &mut scsi);
    dissect_uas(&mut session, 0x81, 2, &ready_iu(0x06, 0x0008), &mut scsi);

    // A write-direction lookup must not see the read Ready.
    assert_eq!(session.correlation.latest_ready_tag(ReadyKind::Write, 3), None);
    assert_eq!(
        session.correlation.latest_ready_tag(ReadyKind::Read, 3),
        Some(0x0008)
    );
}
