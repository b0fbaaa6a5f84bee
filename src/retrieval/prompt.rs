//! Prompt assembly for narrative answers

use crate::vector::{QueryResult, VectorError};

const QUESTION_PREAMBLE: &str = "Answer this question about Football Financial Fair Play";
const CONTEXT_HEADER: &str = "Use this context about similar clubs:";

/// One entry per hit, in result order: `"<entity_id>: <pretty metadata>"`
pub(crate) fn context_block(results: &[QueryResult]) -> Result<String, VectorError> {
    let entries = results
        .iter()
        .map(|hit| {
            serde_json::to_string_pretty(&hit.metadata)
                .map(|metadata| format!("{}: {}", hit.entity_id, metadata))
                .map_err(|e| VectorError::Serialization {
                    reason: e.to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries.join("\n\n"))
}

/// Instruction, question and context sent as a single request
pub(crate) fn question_prompt(question: &str, context: &str) -> String {
    format!(
        "{}: \"{}\"\n\n{}\n\nData: {}",
        QUESTION_PREAMBLE, question, CONTEXT_HEADER, context
    )
}
