//! Context composer: retrieval results plus conversation memory become
//! one prompt context string.
//!
//! The structure is fixed: the human messages so far (ending with the
//! current question), then one labeled block per retrieved passage. The
//! composer only concatenates what it is given; nothing is invented here.

use concierge_core::types::RetrievedPassage;

/// Context text used when retrieval produced nothing. Keeps the prompt
/// well-formed and pins the model to the contact-information fallback.
pub const NO_CONTEXT_FALLBACK: &str =
    "No relevant information was found for this question. \
     Answer using the general contact information only.";

/// Compose the prompt context from conversation memory and passages.
///
/// `human_texts` is every human message in order, the current question
/// last. The output is never empty, even with no memory and no passages.
pub fn compose(human_texts: &[&str], retrieved: &[RetrievedPassage]) -> String {
    let memory = human_texts.join("\n");

    let search_text = if retrieved.is_empty() {
        NO_CONTEXT_FALLBACK.to_string()
    } else {
        let mut text = String::from("The search resulted with following text:");
        for passage in retrieved {
            text.push_str(&format!(
                "\n\n### {} INFORMATION:\n{}",
                passage.document.to_uppercase(),
                passage.content
            ));
        }
        text
    };

    if memory.is_empty() {
        search_text
    } else {
        format!("{}\n{}", memory, search_text)
    }
}
