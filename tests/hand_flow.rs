use holdem_engine::config::TableConfig;
use holdem_engine::events::HandEvent;
use holdem_engine::game::{Action, EngineError, HandEngine, HandResult, Phase, Seat};
use holdem_engine::rng::RngSource;

fn mk_engine(n: usize, stack: u64) -> HandEngine {
    let seats = (0..n).map(|i| Seat::human(i as u32, format!("P{i}"), stack)).collect();
    HandEngine::new(TableConfig::default(), seats).expect("valid table")
}

#[test]
fn everyone_folds_preflop_awards_pot_uncontested() {
    let mut e = mk_engine(4, 1000);
    e.init_hand(0, &mut RngSource::seeded(21)).unwrap();
    // sb 1, bb 2, first to act 3
    for seat in [3, 0, 1] {
        e.apply_action(seat, Action::Fold).unwrap();
    }
    assert_eq!(e.state().phase(), Phase::Showdown);
    assert!(e.state().board().is_empty(), "board is not revealed");
    assert_eq!(e.state().pot(), 0);

    let winner = &e.seats()[2];
    assert_eq!(winner.stack(), 1005);
    let result = winner.result().unwrap();
    assert_eq!(result.description, HandResult::UNCONTESTED);
    assert!(result.is_winner());
    assert!(e.seats().iter().enumerate().filter(|(i, _)| *i != 2).all(|(_, s)| s.result().is_none()));

    let settlement = e.last_settlement().unwrap();
    assert!(settlement.uncontested);
    assert_eq!(settlement.total(), 15);
}

#[test]
fn events_follow_hand_progress() {
    let mut e = mk_engine(2, 1000);
    e.init_hand(0, &mut RngSource::seeded(22)).unwrap();
    e.apply_action(0, Action::Call).unwrap();
    e.apply_action(1, Action::Call).unwrap();
    e.apply_action(1, Action::Fold).unwrap();

    let events = e.take_events();
    assert!(matches!(events[0], HandEvent::HandStarted { hand_number: 1, button: 0, .. }));
    assert!(matches!(events[1], HandEvent::ActionApplied { seat: 0, .. }));
    assert!(matches!(events[2], HandEvent::ActionApplied { seat: 1, .. }));
    match &events[3] {
        HandEvent::PhaseAdvanced { phase, board } => {
            assert_eq!(*phase, Phase::Flop);
            assert_eq!(board.len(), 3);
        }
        other => panic!("expected flop, got {other:?}"),
    }
    assert!(matches!(events[4], HandEvent::ActionApplied { seat: 1, .. }));
    assert!(matches!(events[5], HandEvent::SingleWinner { seat: 0, amount: 20 }));
    assert!(matches!(events[6], HandEvent::SettlementComplete { .. }));
    assert_eq!(events.len(), 7);
    assert!(e.take_events().is_empty(), "drained");
}

#[test]
fn run_out_emits_every_street() {
    let mut e = mk_engine(2, 100);
    e.init_hand(0, &mut RngSource::seeded(23)).unwrap();
    e.apply_action(0, Action::Raise(100)).unwrap();
    e.apply_action(1, Action::Call).unwrap();
    let phases: Vec<Phase> = e
        .take_events()
        .into_iter()
        .filter_map(|ev| match ev {
            HandEvent::PhaseAdvanced { phase, .. } => Some(phase),
            _ => None,
        })
        .collect();
    assert_eq!(phases, vec![Phase::Flop, Phase::Turn, Phase::River, Phase::Showdown]);
}

#[test]
fn button_rotates_and_busted_seat_keeps_its_slot() {
    let mut e = mk_engine(3, 1000);
    let mut rng = RngSource::seeded(24);
    e.start_next_hand(&mut rng).unwrap();
    assert_eq!(e.state().button(), 0);
    let t = e.state().turn();
    e.apply_action(t, Action::Raise(1000)).unwrap();
    while e.is_hand_live() {
        let t = e.state().turn();
        e.apply_action(t, Action::Call).unwrap();
    }
    let busted: Vec<usize> = (0..3).filter(|&i| e.seats()[i].stack() == 0).collect();

    if e.seats().iter().filter(|s| s.stack() > 0).count() >= 2 {
        e.start_next_hand(&mut rng).unwrap();
        assert_eq!(e.state().button(), 1);
        assert_eq!(e.seats().len(), 3);
        for i in busted {
            assert!(e.seats()[i].folded());
            assert!(e.seats()[i].hole().is_none());
        }
    } else {
        let err = e.start_next_hand(&mut rng).unwrap_err();
        assert!(matches!(err, EngineError::NotEnoughPlayers(1)));
    }
}

#[test]
fn late_seat_waits_for_next_hand() {
    let mut e = mk_engine(2, 1000);
    let mut rng = RngSource::seeded(25);
    e.start_next_hand(&mut rng).unwrap();
    e.queue_seat(Seat::human(7, "Late", 1000)).unwrap();
    assert_eq!(e.seats().len(), 2);
    let t = e.state().turn();
    e.apply_action(t, Action::Fold).unwrap();

    e.start_next_hand(&mut rng).unwrap();
    assert_eq!(e.seats().len(), 3);
    assert_eq!(e.seats()[2].name(), "Late");
    assert!(e.seats()[2].hole().is_some());
    assert_eq!(e.state().hand_number(), 2);
}

#[test]
fn too_many_seats_rejected() {
    let seats = (0..24).map(|i| Seat::human(i, "x", 100)).collect();
    assert!(matches!(HandEngine::new(TableConfig::default(), seats), Err(EngineError::TooManySeats(24))));
}
