//! Prompt templates for the generation backends.
//!
//! All templates are context-grounded ("based ONLY on the context") so the
//! models answer from retrieved text rather than free recall. Online prompts
//! ask for Tamil output against the original Tamil question; offline prompts
//! stay in the question's language and keep instructions short for the
//! smaller local model.

/// Online text answer: grounded in the assembled context, answered in Tamil
/// against the farmer's original (untranslated) question.
pub fn build_online_prompt(tamil_query: &str, context: &str) -> String {
    format!(
        "You are \"Namma Uzhavan Nanban,\" an AI expert for farmers. A farmer asked in Tamil: '{tamil_query}'.\n\
         Based ONLY on the combined context below, answer in Tamil. Prioritize LIVE WEATHER DATA or LATEST MARKET PRICES if relevant.\n\
         ---\n\
         COMBINED CONTEXT:\n{context}\n\
         ---\n\
         YOUR DETAILED TAMIL ANSWER:"
    )
}

/// Offline text answer: minimal instruction set for the local model.
pub fn build_offline_prompt(question: &str, context: &str) -> String {
    format!(
        "Based ONLY on the context, answer the user's question.\n\
         CONTEXT:\n{context}\n\
         QUESTION:\n\"{question}\"\n\
         ANSWER:"
    )
}

/// Online diagnosis follow-up: the classifier's label and confidence framed
/// for a Tamil treatment plan over English remedy context.
pub fn build_online_diagnosis_prompt(label: &str, confidence_pct: f32, context: &str) -> String {
    format!(
        "A farmer's crop is '{label}' ({confidence_pct:.2}% confidence). Based on the context, provide a detailed treatment plan in Tamil.\n\
         ENGLISH CONTEXT:\n{context}\n\
         DETAILED TAMIL TREATMENT PLAN:"
    )
}

/// Offline diagnosis follow-up: plain-language markdown remedy plan.
pub fn build_offline_diagnosis_prompt(label: &str, context: &str) -> String {
    format!(
        "You are an agricultural expert. Based ONLY on the context, create a clear, step-by-step remedy plan for '{label}'. Use simple language and markdown.\n\
         CONTEXT:\n{context}\n\
         TREATMENT PLAN:"
    )
}
