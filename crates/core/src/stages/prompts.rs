//! Fixed prompts and result formatting for the stages.

use crate::services::SearchHit;

/// Stored as `researchData` when the search call fails.
pub const RESEARCH_FAILED: &str = "Research failed due to an error.";

/// Marker that opens every formatted search result.
pub const SOURCE_MARKER: &str = "Source:";

/// `Source: <url>\nContent: <content>\n` per hit, separated by `---` lines.
pub fn format_results(hits: &[SearchHit]) -> String {
    hits.iter()
        .map(|hit| format!("{} {}\nContent: {}\n", SOURCE_MARKER, hit.url, hit.content))
        .collect::<Vec<_>>()
        .join("---\n")
}

/// Number of search results in a formatted research blob.
pub fn count_sources(research_data: &str) -> usize {
    research_data.matches(SOURCE_MARKER).count()
}

pub fn analyst_prompt(query: &str, research_data: &str) -> String {
    format!(
        "You are an expert analyst. Your job is to analyze the provided research data
and structure the findings to directly answer the user's query. Extract key themes,
evaluate the credibility of the information, and synthesize a comprehensive overview.

User Query: {query}

Research Data:
{research_data}

Provide a detailed analysis."
    )
}

pub fn writer_prompt(query: &str, analysis_data: &str) -> String {
    format!(
        "You are a professional technical writer and synthesizer.
Based on the provided analysis, create a final, well-structured, and easy-to-read markdown report
answering the original query.

Original Query: {query}

Analysis to base report on:
{analysis_data}

Write the final report in Markdown. Make it engaging, clear, and comprehensive."
    )
}
