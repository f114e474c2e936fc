//! Prompt strategies.
//!
//! A strategy is one fixed way of framing a translation request as a prompt
//! plus sampling parameters. The cascade walks an ordered list of
//! descriptors, fixed at construction, until one produces an acceptable
//! result. Modeling the ladder as data keeps the escalation testable: tests
//! substitute a short list instead of stubbing branches.

use sdk::envelope::{Action, GenerationOptions};

/// Default sampling for the first attempts.
pub const DEFAULT_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.7,
    top_p: 0.9,
    max_tokens: 512,
};

/// Lower randomness for the reset-and-retry rung.
pub const STRICT_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.3,
    top_p: 0.8,
    max_tokens: 512,
};

/// Strictest sampling for the last-resort rungs.
pub const STRICTEST_OPTIONS: GenerationOptions = GenerationOptions {
    temperature: 0.1,
    top_p: 0.5,
    max_tokens: 256,
};

/// How a strategy turns a request into a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    /// Multi-turn exchange through the conversation state machine; the
    /// instructions travel once as the system prompt.
    Conversational,
    /// Direct prompt built from instructions + context + text.
    Instructed,
    /// Smallest possible prompt; context dropped.
    Minimal,
    /// Alternate framing for backends that refuse the direct ask. The
    /// template sees `{instructions}` and `{text}`; context is dropped.
    Framed(&'static str),
}

/// One rung of the cascade ladder.
#[derive(Debug, Clone, Copy)]
pub struct StrategyDescriptor {
    /// Stable name, used in logs and tests
    pub name: &'static str,
    pub prompt: PromptStyle,
    pub options: GenerationOptions,
    /// Reset conversation state before attempting this rung
    pub resets_conversation: bool,
}

/// Alternate framings tried only under the aggressive-bypass flag, in this
/// exact order.
const AGGRESSIVE_TAIL: &[(&str, &str)] = &[
    (
        "expert-framing",
        "You are a professional translator. Output only the translation, \
         with no commentary. {instructions}\n\nText:\n{text}",
    ),
    (
        "completion-framing",
        "{instructions}\nThe translated version of the following text \
         reads:\n\n{text}\n\nTranslated version:",
    ),
    (
        "subtitle-framing",
        "These are subtitles from a film. Produce the translated subtitle \
         line. {instructions}\n\n{text}",
    ),
    (
        "gloss-framing",
        "Provide a natural-language gloss of this text. {instructions}\n\n{text}",
    ),
];

impl StrategyDescriptor {
    /// Build the prompt for this strategy.
    pub fn build_prompt(&self, instructions: &str, text: &str, context: &str) -> String {
        match self.prompt {
            // Conversational turns carry the text (plus any context);
            // instructions travel once in the system prompt (see the
            // cascade).
            PromptStyle::Conversational => {
                if context.is_empty() {
                    text.to_string()
                } else {
                    format!("Context:\n{}\n\n{}", context, text)
                }
            }
            PromptStyle::Instructed => {
                let mut prompt = String::new();
                if !instructions.is_empty() {
                    prompt.push_str(instructions);
                    prompt.push_str("\n\n");
                }
                if !context.is_empty() {
                    prompt.push_str("Context:\n");
                    prompt.push_str(context);
                    prompt.push_str("\n\n");
                }
                prompt.push_str("Translate the following text:\n");
                prompt.push_str(text);
                prompt
            }
            PromptStyle::Minimal => {
                if instructions.is_empty() {
                    format!("Translate: {}", text)
                } else {
                    format!("{}\nTranslate: {}", instructions, text)
                }
            }
            PromptStyle::Framed(template) => template
                .replace("{instructions}", instructions)
                .replace("{text}", text),
        }
    }

    /// Whether this strategy embeds caller-supplied context.
    pub fn uses_context(&self) -> bool {
        matches!(
            self.prompt,
            PromptStyle::Conversational | PromptStyle::Instructed
        )
    }

    /// Wire action for this strategy given the request's context.
    pub fn action(&self, context: &str) -> Action {
        if self.uses_context() && !context.is_empty() {
            Action::TranslateWithContext
        } else {
            Action::Translate
        }
    }

    /// True for the rung that goes through the conversation state machine.
    pub fn is_conversational(&self) -> bool {
        self.prompt == PromptStyle::Conversational
    }
}

/// The fixed ladder: conversational, simple instructed, reset-and-retry,
/// minimal fallback, then (aggressive only) the alternate-framing tail.
pub fn default_ladder(aggressive: bool) -> Vec<StrategyDescriptor> {
    let mut ladder = vec![
        StrategyDescriptor {
            name: "conversational",
            prompt: PromptStyle::Conversational,
            options: DEFAULT_OPTIONS,
            resets_conversation: false,
        },
        StrategyDescriptor {
            name: "simple",
            prompt: PromptStyle::Instructed,
            options: DEFAULT_OPTIONS,
            resets_conversation: false,
        },
        StrategyDescriptor {
            name: "reset-retry",
            prompt: PromptStyle::Instructed,
            options: STRICT_OPTIONS,
            resets_conversation: true,
        },
        StrategyDescriptor {
            name: "minimal",
            prompt: PromptStyle::Minimal,
            options: STRICTEST_OPTIONS,
            resets_conversation: false,
        },
    ];

    if aggressive {
        for (name, template) in AGGRESSIVE_TAIL {
            ladder.push(StrategyDescriptor {
                name,
                prompt: PromptStyle::Framed(template),
                options: STRICTEST_OPTIONS,
                resets_conversation: false,
            });
        }
    }

    ladder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_order_is_fixed() {
        let names: Vec<&str> = default_ladder(false).iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["conversational", "simple", "reset-retry", "minimal"]);
    }

    #[test]
    fn test_aggressive_flag_appends_tail() {
        let ladder = default_ladder(true);
        let names: Vec<&str> = ladder.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "conversational",
                "simple",
                "reset-retry",
                "minimal",
                "expert-framing",
                "completion-framing",
                "subtitle-framing",
                "gloss-framing",
            ]
        );
        assert!(ladder[4..].iter().all(|s| !s.resets_conversation));
    }

    #[test]
    fn test_instructed_prompt_embeds_all_fields() {
        let ladder = default_ladder(false);
        let simple = &ladder[1];
        let prompt = simple.build_prompt("Translate to English.", "こんにちは", "a greeting");

        assert!(prompt.starts_with("Translate to English."));
        assert!(prompt.contains("Context:\na greeting"));
        assert!(prompt.ends_with("Translate the following text:\nこんにちは"));
    }

    #[test]
    fn test_minimal_prompt_drops_context() {
        let ladder = default_ladder(false);
        let minimal = &ladder[3];
        let prompt = minimal.build_prompt("", "hola", "ignored context");

        assert_eq!(prompt, "Translate: hola");
        assert_eq!(minimal.action("ignored context"), Action::Translate);
    }

    #[test]
    fn test_framed_prompt_substitutes_placeholders() {
        let ladder = default_ladder(true);
        let framed = ladder.iter().find(|s| s.name == "expert-framing").unwrap();
        let prompt = framed.build_prompt("Into French.", "good morning", "");

        assert!(prompt.contains("Into French."));
        assert!(prompt.contains("good morning"));
        assert!(!prompt.contains("{instructions}"));
        assert!(!prompt.contains("{text}"));
    }

    #[test]
    fn test_action_reflects_context_usage() {
        let ladder = default_ladder(false);
        assert_eq!(ladder[1].action("ctx"), Action::TranslateWithContext);
        assert_eq!(ladder[1].action(""), Action::Translate);
        assert_eq!(ladder[3].action("ctx"), Action::Translate);
    }

    #[test]
    fn test_sampling_gets_stricter_down_the_ladder() {
        let ladder = default_ladder(false);
        assert!(ladder[2].options.temperature < ladder[1].options.temperature);
        assert!(ladder[3].options.temperature < ladder[2].options.temperature);
    }
}
