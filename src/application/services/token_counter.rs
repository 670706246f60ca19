use std::sync::LazyLock;
use tiktoken_rs::CoreBPE;

use crate::domain::ConversationTurn;

static TOKENIZER: LazyLock<CoreBPE> = LazyLock::new(|| {
    tiktoken_rs::cl100k_base().expect("Failed to initialize cl100k_base tokenizer")
});

pub fn count_tokens(text: &str) -> usize {
    TOKENIZER.encode_with_special_tokens(text).len()
}

/// Tokens a turn occupies once rendered into the condense prompt.
pub fn count_turn_tokens(turn: &ConversationTurn) -> usize {
    count_tokens(&turn.question) + count_tokens(&turn.answer) + TURN_FRAMING_TOKENS
}

const TURN_FRAMING_TOKENS: usize = 6;
