/// One question and the answer it received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

impl From<ConversationTurn> for (String, String) {
    fn from(turn: ConversationTurn) -> Self {
        (turn.question, turn.answer)
    }
}

impl From<(String, String)> for ConversationTurn {
    fn from((question, answer): (String, String)) -> Self {
        Self { question, answer }
    }
}

/// Append-only sequence of turns for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatHistory {
    turns: Vec<ConversationTurn>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Returns the most recent turns whose combined cost stays within `budget`,
    /// oldest first.
    pub fn recent_within<F>(&self, budget: usize, cost: F) -> &[ConversationTurn]
    where
        F: Fn(&ConversationTurn) -> usize,
    {
        let mut spent = 0;
        let mut start = self.turns.len();

        for turn in self.turns.iter().rev() {
            let turn_cost = cost(turn);
            if spent + turn_cost > budget {
                break;
            }
            spent += turn_cost;
            start -= 1;
        }

        &self.turns[start..]
    }
}

impl FromIterator<ConversationTurn> for ChatHistory {
    fn from_iter<I: IntoIterator<Item = ConversationTurn>>(iter: I) -> Self {
        Self {
            turns: iter.into_iter().collect(),
        }
    }
}
