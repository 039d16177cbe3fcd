use log::{debug, trace};
use std::collections::BTreeMap;

/// Which Ready IU (and data transfer) direction a record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyKind {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirection {
    Sent,
    Received,
}

/// Handle to one ITLQ nexus: the tag plus the sequence number the command
/// was observed at. Stable for the lifetime of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItlqNexusId {
    pub tag: u16,
    pub started_seq: u64,
}

/// One in-flight command instance (Initiator-Target-LUN-Queue nexus).
///
/// `started_frame` is set at creation and every later stamp is >= it.
/// Completion does not retire the nexus; late data frames in a misordered
/// capture must still be able to find it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItlqNexus {
    pub tag: u16,
    pub lun: u16,
    pub started_frame: u64,
    pub completed_frame: Option<u64>,
    pub read_ready_frame: Option<u64>,
    pub write_ready_frame: Option<u64>,
    pub data_sent_frame: Option<u64>,
    pub data_received_frame: Option<u64>,
    /// One-line command description from the SCSI collaborator, carried so
    /// later IUs can repeat it in their summaries.
    pub command_summary: Option<String>,
}

/// Per-LUN state independent of any single command
/// (Initiator-Target-LUN nexus).
#[derive(Debug, Clone, PartialEq)]
pub struct ItlNexus {
    pub lun: u16,
    /// Frame the LUN was first addressed in.
    pub first_seen_frame: u64,
    pub commands_started: u64,
}

/// Tag-based request/response correlation across asynchronous pipes.
///
/// Tags come from a small rotating pool and are reused, so nexuses are
/// keyed by (tag, creation sequence) and every lookup resolves the most
/// recently created nexus at or before the lookup sequence. The inner
/// BTreeMap gives the nearest-preceding lookup in O(log n) per tag.
#[derive(Debug, Default)]
pub struct CorrelationTable {
    nexuses: BTreeMap<u16, BTreeMap<u64, ItlqNexus>>,
    itl: BTreeMap<u16, ItlNexus>,
    /// Ready IUs observed per direction, keyed by sequence number. USB 2.0
    /// Data-In/Data-Out transfers carry no tag of their own; the tag is
    /// inferred from the most recent Ready IU of the matching direction.
    ready_seen: BTreeMap<ReadyKind, BTreeMap<u64, u16>>,
}

impl CorrelationTable {
    pub fn new() -> Self {
        CorrelationTable::default()
    }

    /// Record a new command. Always creates a distinct nexus, even when the
    /// tag is currently in flight; the old nexus stays retrievable for
    /// sequences before `at_seq`.
    pub fn begin_command(&mut self, lun: u16, tag: u16, at_seq: u64) -> ItlqNexusId {
        let itl = self.itl.entry(lun).or_insert_with(|| {
            debug!("first command for LUN {}, creating ITL nexus", lun);
            ItlNexus {
                lun,
                first_seen_frame: at_seq,
                commands_started: 0,
            }
        });
        itl.commands_started += 1;

        let nexus = ItlqNexus {
            tag,
            lun,
            started_frame: at_seq,
            ..ItlqNexus::default()
        };
        trace!("begin command tag=0x{:04X} lun={} seq={}", tag, lun, at_seq);
        self.nexuses.entry(tag).or_default().insert(at_seq, nexus);
        ItlqNexusId {
            tag,
            started_seq: at_seq,
        }
    }

    /// The most recently created nexus with this tag whose creation
    /// sequence is <= `at_seq`, if any.
    pub fn find_nexus(&self, tag: u16, at_seq: u64) -> Option<ItlqNexusId> {
        let by_seq = self.nexuses.get(&tag)?;
        let (&started_seq, _) = by_seq.range(..=at_seq).next_back()?;
        Some(ItlqNexusId { tag, started_seq })
    }

    pub fn nexus(&self, id: ItlqNexusId) -> Option<&ItlqNexus> {
        self.nexuses.get(&id.tag)?.get(&id.started_seq)
    }

    pub fn itl_nexus(&self, lun: u16) -> Option<&ItlNexus> {
        self.itl.get(&lun)
    }

    fn nexus_mut(&mut self, tag: u16, at_seq: u64) -> Option<&mut ItlqNexus> {
        let by_seq = self.nexuses.get_mut(&tag)?;
        let (&started_seq, _) = by_seq.range(..=at_seq).next_back()?;
        by_seq.get_mut(&started_seq)
    }

    pub fn set_command_summary(&mut self, id: ItlqNexusId, summary: String) {
        if let Some(nexus) = self
            .nexuses
            .get_mut(&id.tag)
            .and_then(|m| m.get_mut(&id.started_seq))
        {
            nexus.command_summary = Some(summary);
        }
    }

    /// Record a Read/Write Ready IU. The side table entry is written even
    /// when no nexus matches, so following tag-less data frames can still
    /// infer the tag.
    pub fn mark_ready(&mut self, kind: ReadyKind, tag: u16, at_seq: u64) -> Option<ItlqNexusId> {
        self.ready_seen.entry(kind).or_default().insert(at_seq, tag);
        let nexus = self.nexus_mut(tag, at_seq)?;
        match kind {
            ReadyKind::Read => nexus.read_ready_frame = Some(at_seq),
            ReadyKind::Write => nexus.write_ready_frame = Some(at_seq),
        }
        Some(ItlqNexusId {
            tag,
            started_seq: nexus.started_frame,
        })
    }

    /// The tag announced by the most recent Ready IU of this direction at
    /// or before `at_seq`. Structurally the same nearest-preceding lookup
    /// as `find_nexus`.
    pub fn latest_ready_tag(&self, kind: ReadyKind, at_seq: u64) -> Option<u16> {
        let by_seq = self.ready_seen.get(&kind)?;
        by_seq.range(..=at_seq).next_back().map(|(_, &tag)| tag)
    }

    pub fn mark_data(
        &mut self,
        direction: DataDirection,
        tag: u16,
        at_seq: u64,
    ) -> Option<ItlqNexusId> {
        let nexus = self.nexus_mut(tag, at_seq)?;
        match direction {
            DataDirection::Sent => nexus.data_sent_frame = Some(at_seq),
            DataDirection::Received => nexus.data_received_frame = Some(at_seq),
        }
        Some(ItlqNexusId {
            tag,
            started_seq: nexus.started_frame,
        })
    }

    pub fn mark_completed(&mut self, tag: u16, at_seq: u64) -> Option<ItlqNexusId> {
        let nexus = self.nexus_mut(tag, at_seq)?;
        nexus.completed_frame = Some(at_seq);
        Some(ItlqNexusId {
            tag,
            started_seq: nexus.started_frame,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_write_command_lifecycle() {
        let mut table = CorrelationTable::new();
        table.begin_command(0, 0x0007, 10);
        table.mark_ready(ReadyKind::Write, 0x0007, 12);
        table.mark_data(DataDirection::Sent, 0x0007, 13);
        table.mark_completed(0x0007, 15);

        let id = table.find_nexus(0x0007, 20).expect("nexus resolvable");
        let nexus = table.nexus(id).unwrap();
        assert_eq!(nexus.started_frame, 10);
        assert_eq!(nexus.write_ready_frame, Some(12));
        assert_eq!(nexus.data_sent_frame, Some(13));
        assert_eq!(nexus.completed_frame, Some(15));
        assert_eq!(nexus.read_ready_frame, None);
    }

    #[test]
    fn tag_reuse_resolves_by_nearest_preceding_sequence() {
        let mut table = CorrelationTable::new();
        table.begin_command(0, 0x0002, 100);
        table.begin_command(0, 0x0002, 200);

        assert_eq!(table.find_nexus(0x0002, 100).unwrap().started_seq, 100);
        assert_eq!(table.find_nexus(0x0002, 199).unwrap().started_seq, 100);
        assert_eq!(table.find_nexus(0x0002, 200).unwrap().started_seq, 200);
        assert_eq!(table.find_nexus(0x0002, 9999).unwrap().started_seq, 200);
        assert!(table.find_nexus(0x0002, 99).is_none());
    }

    #[test]
    fn begin_command_never_mutates_an_older_nexus() {
        let mut table = CorrelationTable::new();
        table.begin_command(0, 0x0001, 10);
        table.mark_completed(0x0001, 11);
        table.begin_command(0, 0x0001, 20);

        let old = table.nexus(table.find_nexus(0x0001, 15).unwrap()).unwrap();
        assert_eq!(old.completed_frame, Some(11));
        let new = table.nexus(table.find_nexus(0x0001, 25).unwrap()).unwrap();
        assert_eq!(new.started_frame, 20);
        assert_eq!(new.completed_frame, None);
    }

    #[test]
    fn stamps_are_monotonically_after_start() {
        let mut table = CorrelationTable::new();
        table.begin_command(3, 0x0010, 50);
        table.mark_ready(ReadyKind::Read, 0x0010, 51);
        table.mark_data(DataDirection::Received, 0x0010, 52);
        table.mark_completed(0x0010, 53);

        let nexus = table.nexus(table.find_nexus(0x0010, 60).unwrap()).unwrap();
        for stamp in [
            nexus.completed_frame,
            nexus.read_ready_frame,
            nexus.data_received_frame,
        ] {
            assert!(stamp.unwrap() >= nexus.started_frame);
        }
    }

    #[test]
    fn marks_with_no_matching_nexus_are_tolerated() {
        let mut table = CorrelationTable::new();
        assert!(table.mark_completed(0x0042, 5).is_none());
        assert!(table.mark_data(DataDirection::Sent, 0x0042, 6).is_none());
        // Ready still lands in the side table for later data frames.
        assert!(table.mark_ready(ReadyKind::Write, 0x0042, 7).is_none());
        assert_eq!(table.latest_ready_tag(ReadyKind::Write, 8), Some(0x0042));
    }

    #[test]
    fn ready_side_table_resolves_nearest_preceding() {
        let mut table = CorrelationTable::new();
        table.begin_command(0, 0x0001, 1);
        table.begin_command(0, 0x0002, 2);
        table.mark_ready(ReadyKind::Read, 0x0001, 3);
        table.mark_ready(ReadyKind::Read, 0x0002, 5);

        assert_eq!(table.latest_ready_tag(ReadyKind::Read, 2), None);
        assert_eq!(table.latest_ready_tag(ReadyKind::Read, 3), Some(0x0001));
        assert_eq!(table.latest_ready_tag(ReadyKind::Read, 4), Some(0x0001));
        assert_eq!(table.latest_ready_tag(ReadyKind::Read, 6), Some(0x0002));
        assert_eq!(table.latest_ready_tag(ReadyKind::Write, 6), None);
    }

    #[test]
    fn itl_nexus_created_lazily_per_lun() {
        let mut table = CorrelationTable::new();
        assert!(table.itl_nexus(1).is_none());
        table.begin_command(1, 0x0001, 10);
        table.begin_command(1, 0x0002, 11);
        table.begin_command(2, 0x0003, 12);

        let lun1 = table.itl_nexus(1).unwrap();
        assert_eq!(lun1.first_seen_frame, 10);
        assert_eq!(lun1.commands_started, 2);
        assert_eq!(table.itl_nexus(2).unwrap().commands_started, 1);
    }
}
