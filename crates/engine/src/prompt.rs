//! Prompt rendering — a pure function of (context, question).
//!
//! No hidden state and no global templating: the same context and question
//! always render the same prompt, which is what makes the engine testable
//! against a scripted model.

use crate::validator::Violation;
use verbatim_core::{Context, Question};

/// The fixed sentinel sentence reserved for "not found". The instruction
/// block tells the model to emit it verbatim, and the validator accepts it
/// as-is.
pub const SENTINEL: &str = "The information is not available in the current message context.";

/// A fully rendered prompt, ready for one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
}

/// Renders the instruction block, the serialized context, and the question.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Render the standard prompt for a question.
    pub fn build(&self, context: &Context, question: &Question) -> Prompt {
        let mut text = String::new();
        self.push_instructions(&mut text);
        self.push_context(&mut text, context);
        self.push_question(&mut text, question);
        Prompt { text }
    }

    /// Render a stricter corrective prompt after a rejected response.
    ///
    /// Same instruction block and context, plus the specific violation the
    /// previous attempt committed.
    pub fn repair(&self, context: &Context, question: &Question, violation: &Violation) -> Prompt {
        let mut text = String::new();
        self.push_instructions(&mut text);
        self.push_context(&mut text, context);
        text.push_str(&format!(
            "Your previous reply was rejected: {violation}.\n\
             Follow every rule above exactly this time. Do not apologize or \
             explain; reply with the one corrected sentence only.\n\n"
        ));
        self.push_question(&mut text, question);
        Prompt { text }
    }

    fn push_instructions(&self, out: &mut String) {
        out.push_str(
            "You are a careful analyst of a team chat transcript. Answer the \
             question from the messages below.\n\n\
             Non-negotiable rules:\n\
             1. Answer using only information present in the supplied messages.\n\
             2. Respond with exactly one sentence.\n\
             3. Use the literal words and names found in the messages — no \
             synonyms, no invented names.\n",
        );
        out.push_str(&format!(
            "4. If no message answers the question, respond with exactly: \
             \"{SENTINEL}\"\n\n"
        ));
    }

    fn push_context(&self, out: &mut String, context: &Context) {
        out.push_str("Messages:\n");
        for m in &context.messages {
            out.push_str(&format!(
                "{}, {}, {}\n",
                m.author,
                m.timestamp.to_rfc3339(),
                m.text
            ));
        }
        out.push('\n');
    }

    fn push_question(&self, out: &mut String, question: &Question) {
        out.push_str(&format!("Question: {}\n", question.text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use verbatim_core::{MessageId, TranscriptMessage};

    fn context() -> Context {
        Context {
            messages: vec![TranscriptMessage {
                id: MessageId::new("m1"),
                author: "Vikram".into(),
                timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
                text: "I have 3 cars, a sedan, an SUV, and a hatchback.".into(),
            }],
            token_count: 20,
        }
    }

    #[test]
    fn prompt_contains_context_question_and_sentinel() {
        let prompt = PromptBuilder::new().build(&context(), &Question::new("How many cars?"));
        assert!(prompt.text.contains("Vikram, 2025-03-01T09:00:00+00:00, I have 3 cars"));
        assert!(prompt.text.contains("Question: How many cars?"));
        assert!(prompt.text.contains(SENTINEL));
        assert!(prompt.text.contains("exactly one sentence"));
    }

    #[test]
    fn prompt_is_a_pure_function() {
        let builder = PromptBuilder::new();
        let q = Question::new("How many cars?");
        let a = builder.build(&context(), &q);
        let b = builder.build(&context(), &q);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_context_still_renders() {
        let prompt = PromptBuilder::new().build(&Context::empty(), &Question::new("Anything?"));
        assert!(prompt.text.contains("Messages:\n\n"));
        assert!(prompt.text.contains("Question: Anything?"));
    }

    #[test]
    fn repair_prompt_names_the_violation() {
        let builder = PromptBuilder::new();
        let violation = Violation::NotOneSentence { boundaries: 3 };
        let prompt = builder.repair(&context(), &Question::new("How many cars?"), &violation);
        assert!(prompt.text.contains("previous reply was rejected"));
        assert!(prompt.text.contains("3 sentence boundaries"));
        // The base contract is restated in full.
        assert!(prompt.text.contains(SENTINEL));
        assert!(prompt.text.contains("Question: How many cars?"));
    }
}
