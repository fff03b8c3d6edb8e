//! Terminal rendering of run progress.

use colored::Colorize;
use rk_client::Projection;
use rk_core::engine::EngineEvent;
use rk_protocol::{ServerEvent, StageStatus};

pub fn banner(query: &str, thread: &str) {
    println!("{} {}", "Query:".bold(), query);
    println!("{} {}", "Thread:".bold(), thread.dimmed());
    println!();
}

/// Print one relayed event. Legacy text-channel events are skipped since
/// they duplicate the structured ones.
pub fn event(event: &ServerEvent) {
    match event {
        ServerEvent::NodeStart { node } => println!("{} {}", "▶".cyan(), node.to_string().bold()),
        ServerEvent::Log { text, .. } => println!("  {text}"),
        ServerEvent::ToolCall(call) => println!(
            "  {} {} {}",
            format!("[{}]", call.tool).magenta(),
            call.input.dimmed(),
            format!("→ {}", call.output).dimmed()
        ),
        ServerEvent::NodeComplete { node } => println!("{} {}", "✓".green(), node),
        ServerEvent::Checkpoint(cp) => println!("  {}", format!("checkpoint {}", cp.id).dimmed()),
        ServerEvent::Error { message } => eprintln!("{} {}", "error:".red().bold(), message),
        ServerEvent::Report { .. }
        | ServerEvent::Complete { .. }
        | ServerEvent::Thought { .. }
        | ServerEvent::Token { .. } => {}
    }
}

pub fn engine_event(event: &EngineEvent) {
    match event {
        EngineEvent::StageStart(stage) => println!("{} {}", "▶".cyan(), stage.to_string().bold()),
        EngineEvent::ContentChunk { .. } => {}
        EngineEvent::StageEnd { stage, .. } => println!("{} {}", "✓".green(), stage),
        EngineEvent::Error(message) => eprintln!("{} {}", "error:".red().bold(), message),
        EngineEvent::Complete => println!("{}", "Pipeline complete".green()),
    }
}

pub fn report(text: &str) {
    println!();
    println!("{}", "─".repeat(60).dimmed());
    println!("{text}");
}

/// Per-stage outcome followed by the report, if one arrived.
pub fn summary(projection: &Projection) {
    println!();
    for record in projection.visible_states().values() {
        let status = match record.status {
            StageStatus::Complete => "complete".green(),
            StageStatus::Failed => "failed".red(),
            StageStatus::Running => "running".yellow(),
            StageStatus::Idle => "skipped".dimmed(),
        };
        println!(
            "{:<10} {:<8} {} logs, {} tool calls",
            record.node.to_string(),
            status,
            record.logs.len(),
            record.tool_calls.len()
        );
    }
    if let Some(text) = &projection.final_report {
        report(text);
    }
}
