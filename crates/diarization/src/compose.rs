use callsift_transcript::{CallMetadata, DiarizedTranscript, LabeledSegment};

use crate::roles::RolePartition;

pub const CALLER_LABEL: &str = "caller";

/// Merge the role-partitioned segments into the final transcript.
///
/// Dispatcher segments are emitted first, then caller segments, then the
/// whole list is stable-sorted by ascending start time, so equal start
/// times keep that merge order. The dispatcher display label and the
/// provenance fields come from [`CallMetadata`].
pub fn compose_transcript(partition: RolePartition, metadata: &CallMetadata) -> DiarizedTranscript {
    let dispatcher_label = metadata.dispatcher.clone();

    let mut segments: Vec<LabeledSegment> = Vec::with_capacity(
        partition.dispatcher.len() + partition.caller.len(),
    );
    for seg in partition.dispatcher {
        segments.push(LabeledSegment {
            speaker: dispatcher_label.clone(),
            start: seg.start,
            end: seg.end,
            text: seg.text,
        });
    }
    for seg in partition.caller {
        segments.push(LabeledSegment {
            speaker: CALLER_LABEL.to_string(),
            start: seg.start,
            end: seg.end,
            text: seg.text,
        });
    }

    segments.sort_by(|a, b| a.start.total_cmp(&b.start));

    DiarizedTranscript {
        date: metadata.date,
        time: metadata.time,
        total_segments: segments.len(),
        speakers: [dispatcher_label, CALLER_LABEL.to_string()],
        segments,
    }
}
