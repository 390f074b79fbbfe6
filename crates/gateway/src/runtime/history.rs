//! Conversation history normalization.
//!
//! Turns the raw chat log into a sequence the provider accepts: strictly
//! alternating roles, starting with a user turn.

use wb_domain::turn::{ConversationTurn, RawMessage, TurnRole};

/// Normalize the most recent `limit` raw messages.
///
/// Messages without text (media, stickers) are skipped. Of each run of
/// consecutive same-role messages only the first is kept, and a leading
/// model turn is dropped.
pub fn normalize(raw: &[RawMessage], limit: usize) -> Vec<ConversationTurn> {
    let start = raw.len().saturating_sub(limit);
    let mut turns: Vec<ConversationTurn> = Vec::new();

    for msg in &raw[start..] {
        if msg.text.trim().is_empty() {
            continue;
        }
        let role = if msg.from_me {
            TurnRole::Model
        } else {
            TurnRole::User
        };
        if turns.last().is_some_and(|t| t.role == role) {
            continue;
        }
        turns.push(ConversationTurn {
            role,
            text: msg.text.clone(),
        });
    }

    if turns.first().is_some_and(|t| t.role == TurnRole::Model) {
        turns.remove(0);
    }
    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(turns: &[ConversationTurn]) {
        if let Some(first) = turns.first() {
            assert_eq!(first.role, TurnRole::User);
        }
        for pair in turns.windows(2) {
            assert_ne!(pair[0].role, pair[1].role);
        }
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(normalize(&[], 200).is_empty());
    }

    #[test]
    fn collapses_runs_and_drops_leading_model() {
        let raw = vec![
            RawMessage::own("hi"),
            RawMessage::own("you there?"),
            RawMessage::peer("yes"),
            RawMessage::peer("what's up"),
            RawMessage::own("nm"),
        ];
        let turns = normalize(&raw, 200);
        assert_eq!(
            turns,
            vec![ConversationTurn::user("yes"), ConversationTurn::model("nm")]
        );
    }

    #[test]
    fn keeps_first_of_each_run() {
        let raw = vec![
            RawMessage::peer("a"),
            RawMessage::peer("b"),
            RawMessage::own("c"),
            RawMessage::own("d"),
            RawMessage::peer("e"),
        ];
        let turns = normalize(&raw, 200);
        let texts: Vec<&str> = turns.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["a", "c", "e"]);
        assert_invariants(&turns);
    }

    #[test]
    fn limit_keeps_most_recent() {
        let raw = vec![
            RawMessage::peer("old"),
            RawMessage::own("older reply"),
            RawMessage::peer("recent"),
            RawMessage::own("latest"),
        ];
        let turns = normalize(&raw, 2);
        assert_eq!(
            turns,
            vec![ConversationTurn::user("recent"), ConversationTurn::model("latest")]
        );
        // A window that starts on a model message loses it.
        let turns = normalize(&raw, 3);
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].text, "recent");
    }

    #[test]
    fn blank_messages_do_not_break_runs() {
        let raw = vec![
            RawMessage::peer("photo incoming"),
            RawMessage::own(""),
            RawMessage::peer("   "),
            RawMessage::peer("did you see it?"),
            RawMessage::own("yes!"),
        ];
        let turns = normalize(&raw, 200);
        assert_eq!(
            turns,
            vec![
                ConversationTurn::user("photo incoming"),
                ConversationTurn::model("yes!"),
            ]
        );
    }

    #[test]
    fn only_model_messages_gives_empty_output() {
        let raw = vec![RawMessage::own("a"), RawMessage::own("b")];
        assert!(normalize(&raw, 200).is_empty());
    }

    #[test]
    fn invariants_hold_for_mixed_logs() {
        let patterns: [&[bool]; 4] = [
            &[true, false, true, false],
            &[false, false, false],
            &[true, true, false, true, true, false, false],
            &[false, true, true, true, false],
        ];
        for pattern in patterns {
            let raw: Vec<RawMessage> = pattern
                .iter()
                .enumerate()
                .map(|(i, &me)| RawMessage { from_me: me, text: format!("m{i}") })
                .collect();
            assert_invariants(&normalize(&raw, 200));
        }
    }
}
