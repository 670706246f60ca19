use crate::domain::ConversationTurn;

pub const CONDENSE_QUESTION_TEMPLATE: &str = "Given the following conversation and a follow up question, \
rephrase the follow up question to be a standalone question, in its original language.

Chat History:
{chat_history}
Follow Up Input: {question}
Standalone question:";

pub const ANSWER_TEMPLATE: &str = "
You are an AI research assistant specializing in {research_field}.
Your task is to answer questions about the research papers.

Use the following context from the paper to provide an accurate response in markdown format (highly structured):
{context}

Question: {question}

Answer the question strictly based on the provided context. If the context is insufficient, state that more information is needed.
";

pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Substitutes `{name}` placeholders in a single pass, so substituted values
/// are never re-scanned. Unknown placeholders are left as written.
pub fn render_template(template: &str, variables: &[(&str, &str)]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];

        let Some(close) = after_open.find('}') else {
            rendered.push_str(&rest[open..]);
            return rendered;
        };

        let name = &after_open[..close];
        match variables.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => rendered.push_str(value),
            None => {
                rendered.push('{');
                rendered.push_str(name);
                rendered.push('}');
            }
        }
        rest = &after_open[close + 1..];
    }

    rendered.push_str(rest);
    rendered
}

pub fn format_chat_history(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("Human: {}\nAssistant: {}", turn.question, turn.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn condense_question_prompt(turns: &[ConversationTurn], question: &str) -> String {
    let chat_history = format_chat_history(turns);
    render_template(
        CONDENSE_QUESTION_TEMPLATE,
        &[("chat_history", &chat_history), ("question", question)],
    )
}

pub fn answer_prompt(research_field: &str, context: &str, question: &str) -> String {
    render_template(
        ANSWER_TEMPLATE,
        &[
            ("research_field", research_field),
            ("context", context),
            ("question", question),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_value_containing_placeholder_when_rendering_then_value_is_not_rescanned() {
        let rendered = render_template(
            "{context} | {question}",
            &[("context", "see {question}"), ("question", "why?")],
        );

        assert_eq!(rendered, "see {question} | why?");
    }

    #[test]
    fn given_unknown_placeholder_when_rendering_then_keeps_it_verbatim() {
        let rendered = render_template("a {missing} b {", &[]);

        assert_eq!(rendered, "a {missing} b {");
    }

    #[test]
    fn given_turns_when_formatting_history_then_uses_human_assistant_lines() {
        let turns = vec![
            ConversationTurn::new("What is LoRA?", "A fine-tuning method."),
            ConversationTurn::new("Who wrote it?", "Hu et al."),
        ];

        let formatted = format_chat_history(&turns);

        assert_eq!(
            formatted,
            "Human: What is LoRA?\nAssistant: A fine-tuning method.\nHuman: Who wrote it?\nAssistant: Hu et al."
        );
    }

    #[test]
    fn given_context_and_question_when_building_answer_prompt_then_both_appear() {
        let prompt = answer_prompt("computer vision", "ViT splits images into patches.", "How?");

        assert!(prompt.contains("specializing in computer vision"));
        assert!(prompt.contains("ViT splits images into patches."));
        assert!(prompt.contains("Question: How?"));
    }

    #[test]
    fn given_literal_field_name_when_building_answer_prompt_then_unfilled_wording_kept() {
        let prompt = answer_prompt("research_field", "", "What?");

        assert!(prompt.contains("You are an AI research assistant specializing in research_field."));
    }
}
