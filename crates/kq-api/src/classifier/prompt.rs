//! LLM system prompt, generated from the intent schema.

use std::fmt::Write;

use kq_protocol::{COMPONENT_VOCABULARY, Intent, ParamKey};

/// Build the system prompt listing every intent with its parameters.
pub fn system_prompt() -> String {
    let mut prompt = String::from(
        "You classify questions about a Kubernetes cluster running Harbor into exactly one \
         intent with parameters.\n\nIntents:\n\n",
    );

    for (i, intent) in Intent::ALL.iter().enumerate() {
        let spec = intent.spec();
        let _ = writeln!(prompt, "{}. {} - {}", i + 1, spec.intent, spec.description);
        let _ = writeln!(
            prompt,
            "   Required: {}; optional: {}",
            key_list(spec.required),
            key_list(spec.optional)
        );
    }

    let _ = write!(
        prompt,
        "\nKnown components: {}. A component may be written with a \"harbor-\" prefix.\n\
         Use namespace \"all\" for questions about the whole cluster.\n\n\
         Respond with ONLY a JSON object (no markdown, no explanation):\n\
         {{\"intent\": \"<IntentName>\", \"parameters\": {{\"<key>\": \"<value>\"}}}}\n\n\
         Parameter keys: {}.\n\
         If the question matches no intent, respond with:\n\
         {{\"intent\": \"Unknown\", \"parameters\": {{}}}}",
        COMPONENT_VOCABULARY.join(", "),
        key_list(&ParamKey::ALL),
    );

    prompt
}

fn key_list(keys: &[ParamKey]) -> String {
    if keys.is_empty() {
        "none".to_string()
    } else {
        keys.iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_lists_every_intent() {
        let prompt = system_prompt();
        for intent in Intent::ALL {
            assert!(prompt.contains(intent.as_str()), "missing {intent}");
        }
    }

    #[test]
    fn prompt_lists_components_and_keys() {
        let prompt = system_prompt();
        for component in COMPONENT_VOCABULARY {
            assert!(prompt.contains(component));
        }
        assert!(prompt.contains("secret_name"));
        assert!(prompt.contains("Required: component"));
    }
}
