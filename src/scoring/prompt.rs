use std::fmt::Write;

use crate::transcript::Chunk;

/// Renders a chunk as `[timestamp] speaker: text` lines.
pub fn render_chunk(chunk: &Chunk) -> String {
    let mut out = String::new();
    for message in chunk.messages() {
        if !out.is_empty() {
            out.push('\n');
        }
        match &message.timestamp {
            Some(ts) => {
                let _ = write!(out, "[{}] {}: {}", ts, message.speaker, message.text);
            }
            None => {
                let _ = write!(out, "{}: {}", message.speaker, message.text);
            }
        }
    }
    out
}

/// Builds the scoring prompt for one chunk.
///
/// The requested `Score:` / `Summary:` layout matches the first pattern of each
/// extractor chain.
pub fn build_prompt(chunk: &Chunk, criterion: &str) -> String {
    format!(
        "Analyze the following chat conversation and rate how well it matches the given \
filter criterion on a scale from 0 to 100.

Filter criterion: {criterion}

Conversation:
{conversation}

Scoring guide:
- 0: unrelated to the criterion
- 25: slightly related
- 50: moderately related
- 75: strongly related
- 100: fully matches the criterion

Answer in exactly this format:
Score: <number from 0 to 100>
Summary: <one sentence, at most 100 characters, describing why>",
        criterion = criterion.trim(),
        conversation = render_chunk(chunk),
    )
}
