//! Prompt templates for the agent workflow

use crate::types::RetrievedChunk;

/// Prompt builder for workflow stages
pub struct PromptBuilder;

impl PromptBuilder {
    /// Build the generation context from retrieved chunks
    ///
    /// Each chunk is preceded by a `Source: <file> (Chunk <n>)` header.
    pub fn build_context(chunks: &[RetrievedChunk]) -> String {
        chunks
            .iter()
            .map(|chunk| format!("{}\n{}\n", chunk.citation_header(), chunk.text))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Query analysis prompt used by the analyze stage
    pub fn query_analysis(query: &str, chunk_count: usize) -> String {
        format!(
            r#"Analyze this query and determine:
1. Query type (factual, analytical, comparative, etc.)
2. Required information depth
3. Potential challenges or ambiguities
4. Recommended approach for response generation

Query: {query}

Context available: {chunk_count} document chunks

Provide a brief analysis:"#
        )
    }

    /// Grounded answer prompt: answer only from the supplied context, with citations
    pub fn grounded_answer(query: &str, context: &str) -> String {
        format!(
            r#"You are a document-grounded assistant. Provide a comprehensive, accurate response to the following query using ONLY the context below.

Query: {query}

Context from documents:
{context}

Please provide a detailed response that:
1. Directly addresses the query
2. References specific information from the provided context
3. Does not add facts that are not stated in the context
4. Cites sources inline as [Source: filename, Chunk N]

If the context does not contain the answer, say: "This information is not available in the provided documents."

Response:"#
        )
    }

    /// Quality evaluation prompt used by the evaluate stage
    pub fn quality_evaluation(query: &str, response: &str, context: &str) -> String {
        format!(
            r#"Evaluate the quality of this response:

Query: {query}

Response: {response}

Context used: {context}

Rate the response on:
1. Relevance to the query (0-10)
2. Accuracy with respect to the context (0-10)
3. Use of provided context (0-10)
4. Overall helpfulness (0-10)

Provide a brief assessment, then end with a final line of the form "Overall score: N/10":"#
        )
    }

    /// Improvement prompt used by the improve stage
    pub fn improvement(query: &str, previous: &str, feedback: Option<&str>, context: &str) -> String {
        let feedback = feedback.unwrap_or("No specific feedback available");
        format!(
            r#"The previous response to this query received a low confidence score.
Please improve the response by addressing any identified issues.

Original Query: {query}

Previous Response: {previous}

Evaluation Feedback: {feedback}

Context: {context}

Please provide an improved, more accurate, and comprehensive response:"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieved(source: &str, position: usize, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            text: text.to_string(),
            source_id: source.to_string(),
            position_in_source: position,
            score: Some(0.5),
        }
    }

    #[test]
    fn test_build_context_headers() {
        let context = PromptBuilder::build_context(&[
            retrieved("a.pdf", 0, "First."),
            retrieved("b.pdf", 2, "Second."),
        ]);
        assert_eq!(
            context,
            "Source: a.pdf (Chunk 0)\nFirst.\n\nSource: b.pdf (Chunk 2)\nSecond.\n"
        );
    }

    #[test]
    fn test_build_context_empty() {
        assert!(PromptBuilder::build_context(&[]).is_empty());
    }

    #[test]
    fn test_improvement_without_feedback() {
        let prompt = PromptBuilder::improvement("q", "old", None, "ctx");
        assert!(prompt.contains("Evaluation Feedback: No specific feedback available"));
        assert!(prompt.contains("Previous Response: old"));
    }

    #[test]
    fn test_templates_embed_inputs() {
        let answer = PromptBuilder::grounded_answer("What is X?", "X is Y.");
        assert!(answer.contains("Query: What is X?"));
        assert!(answer.contains("X is Y."));

        let eval = PromptBuilder::quality_evaluation("q", "resp", "ctx");
        assert!(eval.contains("Response: resp"));
        assert!(eval.contains("Overall score: N/10"));

        assert!(PromptBuilder::query_analysis("q", 4).contains("4 document chunks"));
    }
}
