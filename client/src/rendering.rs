//! Plain text rendering of the projected match

use crate::game::GameState;
use shared::{Card, Notification, Objective, PhaseView, Symbol};
use std::fmt::Write;

fn objective_label(objective: &Objective) -> String {
    format!("objective #{} (x{})", objective.id(), objective.multiplier())
}

fn back_label(back: Option<Symbol>) -> String {
    back.map_or_else(|| "-".to_string(), |symbol| symbol.to_string())
}

fn card_label(card: Option<&Card>) -> String {
    card.map_or_else(|| "-".to_string(), Card::to_string)
}

/// The whole table as seen by this client.
pub fn render_state(state: &GameState) -> String {
    let mut out = String::new();
    let phase = match state.phase {
        PhaseView::Setup => "setup",
        PhaseView::Playing => "playing",
        PhaseView::LastLap => "last round",
        PhaseView::Finished => "finished",
    };
    let _ = writeln!(out, "== {} | {} ==", state.me, phase);
    if let Some(current) = &state.current_player {
        let marker = if state.is_my_turn() { " (you)" } else { "" };
        let _ = writeln!(out, "Turn: {}{}", current, marker);
    }

    for player in &state.players {
        let visible = player
            .field
            .as_ref()
            .map(|field| {
                field
                    .pool()
                    .iter()
                    .filter(|(_, count)| *count > 0)
                    .map(|(symbol, count)| format!("{}:{}", symbol, count))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        let _ = writeln!(
            out,
            "{} [{}] {} pts, {} cards placed, hand backs {} | {}",
            player.name,
            player.color,
            player.score,
            player.field.as_ref().map_or(0, |field| field.len()),
            player
                .hand_backs
                .iter()
                .map(|back| back_label(*back))
                .collect::<Vec<_>>()
                .join("/"),
            visible
        );
    }

    for (slot, card) in state.hand.iter().enumerate() {
        let _ = writeln!(out, "Hand {}: {}", slot, card_label(card.as_ref()));
    }
    if let Some(field) = state.my_field() {
        let positions = field
            .available_positions()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(out, "Open positions: {}", positions);
    }

    let card_state = &state.card_state;
    let _ = writeln!(
        out,
        "Resource pile: {} left (top {}), gold pile: {} left (top {})",
        card_state.resource_left,
        back_label(card_state.resource_top),
        card_state.gold_left,
        back_label(card_state.gold_top)
    );
    for (index, card) in card_state.market.iter().enumerate() {
        let _ = writeln!(out, "Market {}: {}", index, card_label(card.as_ref()));
    }

    let shared: Vec<String> = state.shared_objectives.iter().map(objective_label).collect();
    let _ = writeln!(out, "Shared: {}", shared.join(", "));
    match state.chosen_objective.and_then(|index| state.objective_options.get(index)) {
        Some(objective) => {
            let _ = writeln!(out, "Personal: {}", objective_label(objective));
        }
        None => {
            for (index, objective) in state.objective_options.iter().enumerate() {
                let _ = writeln!(out, "Option {}: {}", index, objective_label(objective));
            }
        }
    }

    for standing in &state.standings {
        let _ = writeln!(
            out,
            "{}{}: {} pts, {} objectives",
            if standing.winner { "* " } else { "  " },
            standing.player,
            standing.total,
            standing.objectives_completed
        );
    }
    out
}

/// A one line summary of a notification, if it is worth telling the user.
pub fn render_notification(me: &str, notification: &Notification) -> Option<String> {
    let line = match notification {
        Notification::SetUpFinished { first_player } => {
            format!("Setup finished, {} starts", first_player)
        }
        Notification::ChosenStarter { player, face } => {
            format!("{} placed their starter {} up", player, face)
        }
        Notification::CardPlayed {
            player,
            card,
            position,
            points,
            ..
        } => format!("{} played {} at {} for {} pts", player, card, position, points),
        Notification::Drawn { player, source, .. } if player != me => {
            format!("{} drew from {:?}", player, source)
        }
        Notification::TurnAdvanced { current_player } if current_player == me => {
            "Your turn".to_string()
        }
        Notification::TurnAdvanced { current_player } => format!("{}'s turn", current_player),
        Notification::LastRound { origin } => {
            format!("Last round! It ends after {}'s next turn", origin)
        }
        Notification::MatchEnded { reason, .. } => format!("Match over: {}", reason),
        Notification::Chat(line) => match &line.to {
            Some(_) => format!("[{} whispers] {}", line.from, line.text),
            None => format!("[{}] {}", line.from, line.text),
        },
        _ => return None,
    };
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ChatLine, EndReason};

    #[test]
    fn test_quiet_notifications_are_skipped() {
        let note = Notification::ChosenObjective { index: 0 };
        assert_eq!(render_notification("ada", &note), None);
    }

    #[test]
    fn test_turn_and_chat_lines() {
        let turn = Notification::TurnAdvanced {
            current_player: "ada".to_string(),
        };
        assert_eq!(render_notification("ada", &turn).as_deref(), Some("Your turn"));
        assert_eq!(
            render_notification("bob", &turn).as_deref(),
            Some("ada's turn")
        );

        let chat = Notification::Chat(ChatLine {
            from: "bob".to_string(),
            to: Some(vec!["ada".to_string()]),
            text: "hi".to_string(),
        });
        assert_eq!(
            render_notification("ada", &chat).as_deref(),
            Some("[bob whispers] hi")
        );
    }

    #[test]
    fn test_render_finished_state() {
        let mut state = GameState::new("ada");
        state
            .apply(&Notification::MatchEnded {
                reason: EndReason::Completed,
                standings: vec![shared::Standing {
                    player: "ada".to_string(),
                    total: 21,
                    objectives_completed: 2,
                    winner: true,
                }],
            })
            .unwrap();
        let text = render_state(&state);
        assert!(text.contains("finished"));
        assert!(text.contains("* ada: 21 pts"));
    }
}
