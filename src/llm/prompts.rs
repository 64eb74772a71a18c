//! Fixed prompt templates.

/// Separator placed between retrieved passages.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Render the answer prompt by stuffing every passage into a single context block.
pub fn render_answer_prompt<S: AsRef<str>>(passages: &[S], question: &str) -> String {
    let context = passages
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);
    format!(
        "Use the following pieces of context to answer the question at the end.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
Respond in a direct, conversational tone. Do not use markdown headers, bold text, or raw list formatting unless necessary for clarity. Keep the response concise and to the point.

{context}

Question: {question}
Helpful Answer:"
    )
}

/// Render the quiz prompt asking for `num_questions` multiple-choice questions.
pub fn render_quiz_prompt(text: &str, num_questions: usize) -> String {
    format!(
        "Based on the following exact context, generate a fast, precise quiz with {num_questions} multiple-choice questions.
Return ONLY a raw JSON array of objects. DO NOT include any markdown formatting, no code blocks, no backticks, and no conversational text.
Each object must strictly have these exact keys: 'question' (string), 'options' (array of exactly 4 strings), 'correct' (integer index 0-3 of the correct option).

Context:
\"{text}\""
    )
}
