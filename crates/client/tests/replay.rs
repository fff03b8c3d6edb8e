//! Folding recorded gateway traffic into a projection.

use rk_client::Projection;
use rk_protocol::{ServerEvent, StageName, StageStatus};

/// A trimmed capture of one successful run as sent over the wire.
const SUCCESSFUL_RUN: &str = r##"[
  {"type":"agent:node_start","payload":{"node":"researcher"}},
  {"type":"agent:log","payload":{"node":"researcher","text":"🔍 Initiating web search for query..."}},
  {"type":"agent:thought","payload":{"text":"🔍 Initiating web search for query...\n"}},
  {"type":"agent:tool_call","payload":{"tool":"Tavily Search API","input":"\"rust\"","output":"2 sources retrieved"}},
  {"type":"agent:node_complete","payload":{"node":"researcher"}},
  {"type":"agent:checkpoint","payload":{"id":"cp-1-researcher","timestamp":1,"activeNode":"researcher","agentStates":{
    "researcher":{"node":"researcher","status":"complete","logs":[],"toolCalls":[]},
    "analyst":{"node":"analyst","status":"idle","logs":[],"toolCalls":[]},
    "writer":{"node":"writer","status":"idle","logs":[],"toolCalls":[]}}}},
  {"type":"agent:node_start","payload":{"node":"analyst"}},
  {"type":"agent:thought","payload":{"text":"clustering"}},
  {"type":"agent:node_complete","payload":{"node":"analyst"}},
  {"type":"agent:checkpoint","payload":{"id":"cp-2-analyst","timestamp":2,"activeNode":"analyst","agentStates":{
    "researcher":{"node":"researcher","status":"complete","logs":[],"toolCalls":[]},
    "analyst":{"node":"analyst","status":"complete","logs":[],"toolCalls":[]},
    "writer":{"node":"writer","status":"idle","logs":[],"toolCalls":[]}}}},
  {"type":"agent:node_start","payload":{"node":"writer"}},
  {"type":"agent:token","payload":{"text":"# Rust"}},
  {"type":"agent:token","payload":{"text":" report"}},
  {"type":"agent:node_complete","payload":{"node":"writer"}},
  {"type":"agent:report","payload":{"text":"# Rust report"}},
  {"type":"agent:complete","payload":{"text":"# Rust report"}}
]"##;

fn replay() -> Projection {
    let events: Vec<ServerEvent> = serde_json::from_str(SUCCESSFUL_RUN).unwrap();
    let mut projection = Projection::new();
    projection.begin("rust", "t1");
    for event in &events {
        projection.apply(event);
    }
    projection
}

#[test]
fn test_replay_reaches_finished_state() {
    let p = replay();

    assert!(!p.streaming);
    assert!(p.is_finished());
    assert_eq!(p.error, None);
    assert_eq!(p.final_report.as_deref(), Some("# Rust report"));
    assert_eq!(p.token_buffer, "# Rust report");
    assert_eq!(p.active, Some(StageName::Writer));
    assert!(p
        .records
        .values()
        .all(|r| r.status == StageStatus::Complete));

    let researcher = &p.records[&StageName::Researcher];
    assert_eq!(researcher.logs.len(), 1);
    assert_eq!(researcher.tool_calls[0].tool, "Tavily Search API");
    assert!(p.thoughts.contains("clustering"));
}

#[test]
fn test_rewind_shows_checkpoint_snapshot() {
    let mut p = replay();
    assert_eq!(p.checkpoints.len(), 2);

    p.set_rewind(Some(0));
    let visible = p.visible_states();
    assert_eq!(visible[&StageName::Researcher].status, StageStatus::Complete);
    assert_eq!(visible[&StageName::Analyst].status, StageStatus::Idle);

    p.set_rewind(Some(99));
    assert_eq!(p.rewind, Some(1));
    assert_eq!(
        p.visible_states()[&StageName::Analyst].status,
        StageStatus::Complete
    );

    p.set_rewind(None);
    assert_eq!(p.visible_states(), &p.records);
}

#[test]
fn test_begin_discards_previous_run() {
    let mut p = replay();
    p.set_rewind(Some(0));
    p.begin("next", "t2");

    assert!(p.streaming);
    assert!(p.checkpoints.is_empty());
    assert_eq!(p.rewind, None);
    assert_eq!(p.final_report, None);
    assert_eq!(p.thread_id.as_deref(), Some("t2"));
    assert!(p.records.values().all(|r| r.status == StageStatus::Idle));
}
