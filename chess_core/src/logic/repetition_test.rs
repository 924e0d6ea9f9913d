use crate::engine::Rules;
use crate::logic::game::{GameError, GameState, GameStatus};
use crate::logic::rules::ChessRules;

const SHUFFLE: [&str; 4] = ["g1f3", "g8f6", "f3g1", "f6g8"];

#[test]
fn test_three_fold_repetition() {
    let mut game = GameState::new();
    assert_eq!(game.repetition_count(), 1);

    // 1. First shuffle brings back the start position (count 2)
    for mv in SHUFFLE {
        assert!(game.play_text(mv).is_ok());
    }
    assert_eq!(game.repetition_count(), 2);
    assert_eq!(game.status, GameStatus::Playing);

    // 2. Second shuffle: third occurrence
    for mv in SHUFFLE.iter().take(3) {
        assert!(game.play_text(mv).is_ok());
        assert_eq!(game.status, GameStatus::Playing);
    }
    assert!(game.play_text("f6g8").is_ok());
    assert_eq!(game.repetition_count(), 3);
    assert_eq!(game.status, GameStatus::ThreefoldRepetition);
    assert_eq!(game.status_text(), "Game over, drawn position");

    // 3. No further moves
    assert_eq!(game.play_text("e2e4"), Err(GameError::GameOver));
}

#[test]
fn test_repetition_ignores_move_counters() {
    let mut game = GameState::new();
    for mv in SHUFFLE {
        game.play_text(mv).unwrap();
    }
    // Same placement and rights, different clocks
    assert_ne!(game.position.to_fen(), crate::logic::board::START_FEN);
    assert_eq!(
        game.position.repetition_key(),
        crate::logic::board::Position::start().repetition_key()
    );
}

#[test]
fn test_lost_castling_rights_break_repetition() {
    let mut game = GameState::new();
    for mv in ["e2e4", "e7e5"] {
        game.play_text(mv).unwrap();
    }
    assert_eq!(game.repetition_count(), 1);

    // King walks out and back: the position looks the same but castling is gone.
    for mv in ["e1e2", "e8e7", "e2e1", "e7e8"] {
        game.play_text(mv).unwrap();
    }
    assert_eq!(game.repetition_count(), 1);
    for mv in ["e1e2", "e8e7", "e2e1", "e7e8"] {
        game.play_text(mv).unwrap();
    }
    assert_eq!(game.repetition_count(), 2);
    assert_eq!(game.status, GameStatus::Playing);
}

#[test]
fn test_rules_do_not_track_repetition() {
    let mut game = GameState::new();
    for _ in 0..2 {
        for mv in SHUFFLE {
            game.play_text(mv).unwrap();
        }
    }
    assert_eq!(game.status, GameStatus::ThreefoldRepetition);
    // The stateless rules only see the position itself.
    assert!(!ChessRules.is_draw(&game.position));
    assert!(!ChessRules.is_game_over(&game.position));
}
