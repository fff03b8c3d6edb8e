//! Custom assertion helpers over engine event sequences.

use rk_core::engine::EngineEvent;
use rk_protocol::StageName;

/// Stage names in the order their `StageStart` events were seen.
#[allow(dead_code)]
pub fn started_stages(events: &[EngineEvent]) -> Vec<StageName> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::StageStart(name) => Some(*name),
            _ => None,
        })
        .collect()
}

/// Count terminal events (`Complete` or `Error`).
#[allow(dead_code)]
pub fn count_terminal(events: &[EngineEvent]) -> usize {
    events.iter().filter(|e| e.is_terminal()).count()
}

/// Assert that every chunk of a stage lies between its start and end.
#[allow(dead_code)]
pub fn assert_chunks_bracketed(events: &[EngineEvent]) {
    let mut open: Option<StageName> = None;
    for event in events {
        match event {
            EngineEvent::StageStart(name) => {
                assert!(open.is_none(), "stage {} started inside {:?}", name, open);
                open = Some(*name);
            }
            EngineEvent::ContentChunk { stage, .. } => {
                assert_eq!(open, Some(*stage), "chunk for {} outside its stage", stage);
            }
            EngineEvent::StageEnd { stage, .. } => {
                assert_eq!(open, Some(*stage), "end for {} without start", stage);
                open = None;
            }
            EngineEvent::Error(_) | EngineEvent::Complete => {}
        }
    }
}

/// Concatenated chunk text of one stage.
#[allow(dead_code)]
pub fn chunk_text(events: &[EngineEvent], stage: StageName) -> String {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::ContentChunk { stage: s, text } if *s == stage => Some(text.as_str()),
            _ => None,
        })
        .collect()
}
