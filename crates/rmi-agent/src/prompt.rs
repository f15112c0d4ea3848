//! Deterministic prompt assembly.

use rmi_metrics::ContextObject;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Fixed system message sent with every question.
pub const SYSTEM_INSTRUCTIONS: &str = "\
You are an analyst for a restaurant owner. Answer the owner's question using \
only the metrics in the JSON context. Quote concrete numbers from the context \
when you use them. A field whose status is \"no_data\" means the dataset has \
no values for it; say so instead of guessing. If the context cannot answer \
the question, say what is missing. Keep the answer under 200 words.";

/// Line that introduces the JSON context in the user message.
const CONTEXT_HEADER: &str = "Context (JSON):\n";

/// The two messages sent to the reasoning service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Builds the prompt grounded on `context`.
    ///
    /// The question line is taken from the context, so it carries any
    /// truncation applied to fit the budget. The context is embedded as the
    /// same compact JSON the budget is measured on. Identical contexts always
    /// produce byte-identical prompts.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] if the context cannot be encoded.
    pub fn build(context: &ContextObject) -> Result<Self, serde_json::Error> {
        let metrics = serde_json::to_string(context)?;
        let focus = if context.focus.is_empty() {
            "general".to_string()
        } else {
            context
                .focus
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let user = format!(
            "Restaurant: {restaurant}\nQuestion: {question}\nFocus: {focus}\n\n{CONTEXT_HEADER}{metrics}",
            restaurant = context.restaurant,
            question = context.question,
        );

        Ok(Self {
            system: SYSTEM_INSTRUCTIONS.to_string(),
            user,
        })
    }

    /// Hex SHA-256 over both messages.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.system.as_bytes());
        hasher.update([0x1f]);
        hasher.update(self.user.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use rmi_metrics::{load_bytes, ContextBudget, ContextBuilder, MetricsBundle, MetricsEngine};

    use super::*;

    fn bundle() -> MetricsBundle {
        let csv = "name,city,cuisine,rating,review_text,delivery_time,price,menu_items\n\
                   Bistro A,Austin,Thai,5,Amazing curry,25,18,Green Curry\n\
                   Bistro A,Austin,Thai,4,Good but slow,50,22,Pad Thai\n\
                   Cafe B,Austin,Thai,3,Okay,,12,Pad Thai\n";
        MetricsEngine::default().compute(&load_bytes(csv.as_bytes()).unwrap())
    }

    fn context(question: &str) -> ContextObject {
        ContextBuilder::default()
            .build("Bistro A", question, &bundle())
            .unwrap()
    }

    fn embedded_context(prompt: &Prompt) -> &str {
        let start = prompt.user.find(CONTEXT_HEADER).unwrap() + CONTEXT_HEADER.len();
        &prompt.user[start..]
    }

    #[test]
    fn identical_contexts_give_identical_prompts() {
        let question = "How is our delivery time?";
        let first = Prompt::build(&context(question)).unwrap();
        let second = Prompt::build(&context(question)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.fingerprint().len(), 64);
    }

    #[test]
    fn different_questions_change_fingerprint() {
        let a = Prompt::build(&context("How is delivery?")).unwrap();
        let b = Prompt::build(&context("How is pricing?")).unwrap();
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn user_message_carries_question_focus_and_metrics() {
        let prompt = Prompt::build(&context("  Is our delivery slow?  ")).unwrap();
        assert!(prompt
            .user
            .starts_with("Restaurant: Bistro A\nQuestion: Is our delivery slow?\n"));
        assert!(prompt.user.contains("Focus: delivery"));
        assert!(prompt.user.contains("\"review_count\":2"));
        assert_eq!(prompt.system, SYSTEM_INSTRUCTIONS);
    }

    #[test]
    fn unfocused_question_is_general() {
        let prompt = Prompt::build(&context("Hello")).unwrap();
        assert!(prompt.user.contains("Focus: general"));
    }

    #[test]
    fn embedded_context_stays_within_budget() {
        let long_question = "Tell me everything about how we are doing ".repeat(200);
        let max_bytes = 1500;
        let ctx = ContextBuilder::new(ContextBudget {
            max_bytes,
            ..ContextBudget::default()
        })
        .build("Bistro A", &long_question, &bundle())
        .unwrap();
        assert!(ctx.truncated);

        let prompt = Prompt::build(&ctx).unwrap();
        let embedded = embedded_context(&prompt);
        assert_eq!(embedded.len(), ctx.serialized_len());
        assert!(embedded.len() <= max_bytes, "{} > {max_bytes}", embedded.len());

        let question_line = prompt.user.lines().nth(1).unwrap();
        assert_eq!(question_line, format!("Question: {}", ctx.question));
    }
}
