//! Instruction template for the generation backend.
//!
//! The composed retrieval context and the user question are the only
//! variable parts; the surrounding instruction pins the model to the
//! provided context and the contact-information fallback.

/// Render the full instruction given a composed context and question.
pub fn render(context: &str, question: &str) -> String {
    format!(
        "You are a helpful assistant for a tourism service. Use ONLY the context \
provided below to answer the user's question.\n\n\
If the answer to the question is not present in the context, provide the contact \
information found in the context instead.\n\n\
---\n\
Context:\n\
{context}\n\
---\n\n\
Question:\n\
{question}\n\n\
Answer:\n\
Format your response clearly and professionally, using only the information from \
the context."
    )
}
