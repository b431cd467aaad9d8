use crate::grouping::AcousticGroup;
use crate::segment::AnnotatedSegment;

/// Final human-meaningful speaker role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Dispatcher,
    Caller,
}

/// Role-partitioned segments, each list in original transcript order.
#[derive(Debug, Default)]
pub struct RolePartition {
    pub dispatcher: Vec<AnnotatedSegment>,
    pub caller: Vec<AnnotatedSegment>,
}

/// Map the two acoustic groups onto dispatcher and caller.
///
/// The group containing more `?` segments becomes the dispatcher; a tie
/// favors group A. A second pass then re-labels long-form questions (text
/// containing `?`, three or more whitespace-separated words) found on the
/// caller side as dispatcher speech. The pass runs once over the assigned
/// set; re-labeling does not feed back into the question counts.
///
/// Empty input returns empty lists without any global computation.
pub fn assign_roles(mut segments: Vec<AnnotatedSegment>) -> RolePartition {
    if segments.is_empty() {
        return RolePartition::default();
    }

    let questions_a = count_questions(&segments, AcousticGroup::A);
    let questions_b = count_questions(&segments, AcousticGroup::B);
    let dispatcher_group = if questions_a >= questions_b {
        AcousticGroup::A
    } else {
        AcousticGroup::B
    };
    tracing::debug!(questions_a, questions_b, ?dispatcher_group, "resolved dispatcher group");

    for seg in &mut segments {
        let role = if seg.acoustic_group == Some(dispatcher_group) {
            Role::Dispatcher
        } else {
            Role::Caller
        };
        seg.speaker = Some(role);
    }

    for seg in &mut segments {
        if seg.speaker == Some(Role::Caller)
            && seg.text.contains('?')
            && seg.text.split_whitespace().count() >= 3
        {
            seg.speaker = Some(Role::Dispatcher);
        }
    }

    let mut partition = RolePartition::default();
    for seg in segments {
        match seg.speaker {
            Some(Role::Dispatcher) => partition.dispatcher.push(seg),
            _ => partition.caller.push(seg),
        }
    }
    partition
}

fn count_questions(segments: &[AnnotatedSegment], group: AcousticGroup) -> usize {
    segments
        .iter()
        .filter(|seg| seg.acoustic_group == Some(group) && seg.text.contains('?'))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use callsift_features::N_COEFFS;

    fn segment_in_group(text: &str, group: AcousticGroup) -> AnnotatedSegment {
        AnnotatedSegment {
            start: 0.0,
            end: 1.0,
            duration: 1.0,
            text: text.to_string(),
            features: [0.0; N_COEFFS],
            acoustic_group: Some(group),
            speaker: None,
        }
    }

    #[test]
    fn test_group_with_more_questions_is_dispatcher() {
        let partition = assign_roles(vec![
            segment_in_group("Where are you located?", AcousticGroup::B),
            segment_in_group("Is anyone hurt?", AcousticGroup::B),
            segment_in_group("Please hurry", AcousticGroup::A),
        ]);
        assert_eq!(partition.dispatcher.len(), 2);
        assert_eq!(partition.caller.len(), 1);
        assert_eq!(partition.caller[0].text, "Please hurry");
    }

    #[test]
    fn test_question_tie_favors_group_a() {
        let partition = assign_roles(vec![
            segment_in_group("ok", AcousticGroup::A),
            segment_in_group("yes", AcousticGroup::B),
        ]);
        // No questions on either side: q_A == q_B == 0, A wins.
        assert_eq!(partition.dispatcher.len(), 1);
        assert_eq!(partition.dispatcher[0].text, "ok");
        assert_eq!(partition.caller[0].text, "yes");
    }

    #[test]
    fn test_long_question_on_caller_side_moves_to_dispatcher() {
        let partition = assign_roles(vec![
            segment_in_group("What is your emergency?", AcousticGroup::A),
            segment_in_group("Can you send someone quickly?", AcousticGroup::B),
        ]);
        // Group A is dispatcher (1 question vs 1, tie favors A), but the
        // caller-side long question gets re-labeled too.
        assert_eq!(partition.dispatcher.len(), 2);
        assert!(partition.caller.is_empty());
    }

    #[test]
    fn test_short_question_stays_with_caller() {
        let partition = assign_roles(vec![
            segment_in_group("What happened there?", AcousticGroup::A),
            segment_in_group("Why?", AcousticGroup::B),
        ]);
        assert_eq!(partition.caller.len(), 1);
        assert_eq!(partition.caller[0].text, "Why?");
    }

    #[test]
    fn test_caller_question_without_mark_stays() {
        let partition = assign_roles(vec![
            segment_in_group("Where is the fire?", AcousticGroup::A),
            segment_in_group("It is spreading fast", AcousticGroup::B),
        ]);
        assert_eq!(partition.caller.len(), 1);
    }

    #[test]
    fn test_roles_recorded_on_segments() {
        let partition = assign_roles(vec![
            segment_in_group("Address?", AcousticGroup::A),
            segment_in_group("Main street", AcousticGroup::B),
        ]);
        assert_eq!(partition.dispatcher[0].speaker, Some(Role::Dispatcher));
        assert_eq!(partition.caller[0].speaker, Some(Role::Caller));
    }

    #[test]
    fn test_empty_input_returns_empty_partition() {
        let partition = assign_roles(Vec::new());
        assert!(partition.dispatcher.is_empty());
        assert!(partition.caller.is_empty());
    }
}
