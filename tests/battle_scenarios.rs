//! End-to-end battle scenarios driven through the phase controller.

use arrakeen::battle::{
    contested_arenas, BattlePlan, Battles, ObligationChoice, OutcomeOverride, PhaseError, PhaseStep, PlanError,
    SideId,
};
use arrakeen::board::{Faction, ForcePool, GameState, LeaderStatus, Territory};
use arrakeen::config::RulesConfig;
use arrakeen::notify::MemoryTopic;

const AT: SideId = SideId::Faction(Faction::Atreides);
const HK: SideId = SideId::Faction(Faction::Harkonnen);
const FR: SideId = SideId::Faction(Faction::Fremen);

fn game(factions: &[Faction]) -> GameState {
    let mut game = GameState::empty(1);
    for f in factions {
        game.add_faction(*f);
        let fs = game.faction_mut(*f).unwrap();
        fs.spice = 10;
        fs.hand = vec!["Crysknife".into(), "Shield".into(), "Lasgun".into(), "Cheap Hero".into()];
    }
    game
}

/// Atreides 5 vs Harkonnen 7 in Arrakeen.
fn duel() -> GameState {
    let mut game = game(&[Faction::Atreides, Faction::Harkonnen]);
    game.place_forces(Territory::Arrakeen, 10, Faction::Atreides, ForcePool::new(5, 0));
    game.place_forces(Territory::Arrakeen, 10, Faction::Harkonnen, ForcePool::new(7, 0));
    game
}

/// Starts the phase and activates the first battle.
fn open(game: &GameState) -> (Battles, MemoryTopic) {
    let mut phase = Battles::new(RulesConfig::default());
    let mut topic = MemoryTopic::new();
    phase.start(game, &mut topic).unwrap();
    phase.advance(game, &mut topic).unwrap();
    (phase, topic)
}

#[test]
fn leaderless_plan_rejected_while_leaders_live() {
    let mut game = duel();
    let (mut phase, mut topic) = open(&game);
    assert_eq!(phase.step(), PhaseStep::PlansPending);

    let err = phase.submit_plan(AT, BattlePlan::default(), &mut game, &mut topic).unwrap_err();
    assert!(matches!(err, PhaseError::Plan(PlanError::LeaderRequired)));
    assert!(phase.active_battle().unwrap().plan_for(AT).is_none());
}

#[test]
fn equal_leader_only_strengths_go_to_aggressor() {
    let mut game = duel();
    let (mut phase, mut topic) = open(&game);
    phase.submit_plan(AT, BattlePlan::led_by("Duncan Idaho"), &mut game, &mut topic).unwrap();
    let result = phase
        .submit_plan(HK, BattlePlan::led_by("Captain Iakin Nefud"), &mut game, &mut topic)
        .unwrap()
        .unwrap();
    assert_eq!(result.winner, Some(AT));
    assert_eq!(result.aggressor.strength.to_string(), "2");
    assert_eq!(result.opponent.strength.to_string(), "2");
    // Winner dialed nothing and keeps every unit; the loser loses all.
    assert_eq!(game.forces_at(Territory::Arrakeen, 10, Faction::Atreides), ForcePool::new(5, 0));
    assert!(game.forces_at(Territory::Arrakeen, 10, Faction::Harkonnen).is_empty());
}

#[test]
fn leader_and_dial_beat_substitute() {
    let mut game = duel();
    let (mut phase, mut topic) = open(&game);
    phase
        .submit_plan(AT, BattlePlan::led_by("Duncan Idaho").dial(3).with_spice(3), &mut game, &mut topic)
        .unwrap();
    let result = phase
        .submit_plan(HK, BattlePlan::substitute("Cheap Hero").dial(1).with_spice(1), &mut game, &mut topic)
        .unwrap()
        .unwrap();

    assert_eq!(result.winner, Some(AT));
    assert_eq!(result.aggressor.strength.to_string(), "5");
    assert_eq!(result.opponent.strength.to_string(), "1");
    assert!(topic
        .texts()
        .contains(&"Atreides wins the battle in Arrakeen: Atreides 5 vs Harkonnen 1. Atreides loses 3 forces. Harkonnen loses 7 forces."));
    assert_eq!(game.forces_at(Territory::Arrakeen, 10, Faction::Atreides), ForcePool::new(2, 0));
    let hk = game.faction(Faction::Harkonnen).unwrap();
    assert_eq!(hk.spice, 9);
    assert!(!hk.holds_card("Cheap Hero"));
    assert!(game.discard.contains(&"Cheap Hero".to_string()));
}

#[test]
fn unmatched_weapon_kills_winning_leader() {
    let mut game = duel();
    let (mut phase, mut topic) = open(&game);
    phase
        .submit_plan(AT, BattlePlan::led_by("Duncan Idaho").dial(5).with_spice(5), &mut game, &mut topic)
        .unwrap();
    let result = phase
        .submit_plan(
            HK,
            BattlePlan::led_by("Umman Kudu").dial(1).with_spice(1).with_weapon("Crysknife"),
            &mut game,
            &mut topic,
        )
        .unwrap()
        .unwrap();

    assert_eq!(result.winner, Some(AT));
    assert!(result.aggressor.leader_killed);
    assert_eq!(result.aggressor.strength.to_string(), "5");
    assert!(result.summary().contains("Duncan Idaho of Atreides is killed."));

    let at = game.faction(Faction::Atreides).unwrap();
    assert_eq!(at.leader("Duncan Idaho").unwrap().status, LeaderStatus::Tanks);
    // Paid 5, collected 2 for the fallen leader.
    assert_eq!(at.spice, 7);
}

#[test]
fn three_sides_need_an_opponent() {
    let mut game = game(&[Faction::Atreides, Faction::Harkonnen, Faction::Fremen]);
    game.place_forces(Territory::Arrakeen, 10, Faction::Atreides, ForcePool::new(4, 0));
    game.place_forces(Territory::Arrakeen, 10, Faction::Harkonnen, ForcePool::new(4, 0));
    game.place_forces(Territory::Arrakeen, 10, Faction::Fremen, ForcePool::new(3, 2));

    let (mut phase, mut topic) = open(&game);
    assert_eq!(phase.step(), PhaseStep::AwaitingOpponentSelection);
    assert_eq!(topic.last_choices().unwrap().len(), 2);
    let err = phase.submit_plan(AT, BattlePlan::led_by("Duncan Idaho"), &mut game, &mut topic);
    assert!(matches!(err, Err(PhaseError::OutOfSequence { .. })));

    phase.select_opponent(FR, &game, &mut topic).unwrap();
    assert_eq!(phase.step(), PhaseStep::PlansPending);
    assert!(matches!(
        phase.select_opponent(HK, &game, &mut topic),
        Err(PhaseError::OutOfSequence { .. })
    ));

    let err = phase.submit_plan(HK, BattlePlan::led_by("Umman Kudu"), &mut game, &mut topic);
    assert!(matches!(err, Err(PhaseError::Plan(PlanError::SideNotInBattle(_)))));

    phase.submit_plan(AT, BattlePlan::led_by("Thufir Hawat"), &mut game, &mut topic).unwrap();
    let result = phase
        .submit_plan(FR, BattlePlan::led_by("Stilgar").dial(2), &mut game, &mut topic)
        .unwrap()
        .unwrap();
    assert_eq!(result.aggressor.side, AT);
    assert_eq!(result.opponent.side, FR);
    assert_eq!(result.winner, Some(FR));
    // Harkonnen was not part of this battle.
    assert_eq!(game.forces_at(Territory::Arrakeen, 10, Faction::Harkonnen), ForcePool::new(4, 0));

    phase.advance(&game, &mut topic).unwrap();
    let battle = phase.active_battle().unwrap();
    assert_eq!(battle.combatants(), Some((HK, FR)));
}

#[test]
fn withdraw_lets_a_side_start_over() {
    let mut game = duel();
    let (mut phase, mut topic) = open(&game);
    assert!(matches!(
        phase.withdraw_plan(AT, &mut topic),
        Err(PhaseError::NoPlanToWithdraw(_))
    ));

    phase.submit_plan(AT, BattlePlan::led_by("Duncan Idaho").dial(5), &mut game, &mut topic).unwrap();
    phase.withdraw_plan(AT, &mut topic).unwrap();
    assert!(topic.texts().contains(&"Atreides starts over."));
    assert!(phase.active_battle().unwrap().plan_for(AT).is_none());

    phase.submit_plan(AT, BattlePlan::led_by("Thufir Hawat"), &mut game, &mut topic).unwrap();
    assert_eq!(
        phase.active_battle().unwrap().plan_for(AT).and_then(|p| p.leader.as_deref()),
        Some("Thufir Hawat")
    );
    // Drafting never touches the ledger.
    assert_eq!(game.faction(Faction::Atreides).unwrap().spice, 10);
}

#[test]
fn obligations_block_advance_and_end() {
    let mut game = duel();
    let (mut phase, mut topic) = open(&game);
    phase
        .submit_plan(AT, BattlePlan::led_by("Duncan Idaho").dial(1).with_spice(1).with_defense("Shield"), &mut game, &mut topic)
        .unwrap();
    phase
        .submit_plan(
            HK,
            BattlePlan::led_by("Feyd-Rautha").dial(3).with_spice(3).with_weapon("Crysknife"),
            &mut game,
            &mut topic,
        )
        .unwrap();

    assert_eq!(phase.obligations.len(), 2);
    assert!(matches!(phase.advance(&game, &mut topic), Err(PhaseError::MustResolvePendingObligation)));
    assert!(matches!(phase.end(&mut game, &mut topic), Err(PhaseError::MustResolvePendingObligation)));

    phase.resolve_obligation(&ObligationChoice::Keep, &mut game, &mut topic).unwrap();
    assert!(game.faction(Faction::Harkonnen).unwrap().holds_card("Crysknife"));

    let err = phase.resolve_obligation(&ObligationChoice::Capture("Duncan Idaho".into()), &mut game, &mut topic);
    assert!(matches!(err, Err(PhaseError::InvalidObligationChoice(_))));
    phase
        .resolve_obligation(&ObligationChoice::Capture("Thufir Hawat".into()), &mut game, &mut topic)
        .unwrap();
    let captured = game.faction(Faction::Harkonnen).unwrap().leader("Thufir Hawat").unwrap();
    assert_eq!(captured.original_owner, Some(Faction::Atreides));
    assert!(game.faction(Faction::Atreides).unwrap().leader("Thufir Hawat").is_none());

    phase.advance(&game, &mut topic).unwrap();
    assert_eq!(phase.step(), PhaseStep::PhaseComplete);
    phase.end(&mut game, &mut topic).unwrap();
    let duncan = game.faction(Faction::Atreides).unwrap().leader("Duncan Idaho").unwrap();
    assert_eq!(duncan.status, LeaderStatus::Available);
}

#[test]
fn storm_split_keeps_allies_apart() {
    let mut game = game(&[Faction::Atreides, Faction::Harkonnen, Faction::Fremen]);
    game.set_alliance(Faction::Atreides, Faction::Harkonnen);
    game.place_forces(Territory::ImperialBasin, 9, Faction::Atreides, ForcePool::new(3, 0));
    game.place_forces(Territory::ImperialBasin, 11, Faction::Harkonnen, ForcePool::new(3, 0));
    game.place_forces(Territory::ImperialBasin, 9, Faction::Fremen, ForcePool::new(2, 0));
    game.place_forces(Territory::ImperialBasin, 11, Faction::Fremen, ForcePool::new(2, 0));

    let joined = contested_arenas(&game);
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0].sides[0].label(), "Atreides & Harkonnen");
    assert_eq!(joined[0].sides[0].forces(), ForcePool::new(6, 0));

    game.storm = 10;
    let split = contested_arenas(&game);
    assert_eq!(split.len(), 2);
    for summary in &split {
        assert_eq!(summary.sides.len(), 2);
        assert!(!summary.sides.iter().any(|s| s.label().contains('&')));
    }
}

#[test]
fn lasgun_meets_shield() {
    let mut game = duel();
    let (mut phase, mut topic) = open(&game);
    phase
        .submit_plan(AT, BattlePlan::led_by("Duncan Idaho").with_weapon("Lasgun"), &mut game, &mut topic)
        .unwrap();
    let result = phase
        .submit_plan(HK, BattlePlan::led_by("Umman Kudu").with_defense("Shield"), &mut game, &mut topic)
        .unwrap()
        .unwrap();

    assert!(result.explosion);
    assert_eq!(result.winner, None);
    assert!(result.summary().starts_with("Lasgun and shield explode in Arrakeen."));
    assert!(contested_arenas(&game).is_empty());
    assert!(phase.obligations.is_empty());
    for f in [Faction::Atreides, Faction::Harkonnen] {
        assert!(game.forces_at(Territory::Arrakeen, 10, f).is_empty());
    }
}

#[test]
fn declared_winner_overrides_lasgun_and_shield() {
    let mut game = duel();
    let (mut phase, mut topic) = open(&game);
    phase
        .submit_plan(AT, BattlePlan::led_by("Duncan Idaho").dial(1).with_weapon("Lasgun"), &mut game, &mut topic)
        .unwrap();
    phase.set_override(OutcomeOverride::Winner(AT), &game, &mut topic).unwrap();
    let result = phase
        .submit_plan(HK, BattlePlan::led_by("Umman Kudu").with_defense("Shield"), &mut game, &mut topic)
        .unwrap()
        .unwrap();

    assert!(!result.explosion);
    assert_eq!(result.winner, Some(AT));
    assert_eq!(
        result.summary(),
        "Atreides wins the battle in Arrakeen: Atreides 3 vs Harkonnen 0. Umman Kudu of Harkonnen is killed. \
         Atreides loses 1 forces. Harkonnen loses 7 forces. The winner collects 1 spice for fallen leaders."
    );
    assert_eq!(game.forces_at(Territory::Arrakeen, 10, Faction::Atreides), ForcePool::new(4, 0));
    assert!(game.forces_at(Territory::Arrakeen, 10, Faction::Harkonnen).is_empty());
    // Paid 1 for the dial, collected 1 for Umman Kudu.
    assert_eq!(game.faction(Faction::Atreides).unwrap().spice, 10);
    assert_eq!(game.faction(Faction::Atreides).unwrap().leader("Duncan Idaho").unwrap().status, LeaderStatus::Fought { territory: Territory::Arrakeen });
    assert!(!game.faction(Faction::Harkonnen).unwrap().holds_card("Shield"));
}

#[test]
fn traitor_winner_loses_nothing() {
    let mut game = duel();
    let (mut phase, mut topic) = open(&game);
    phase
        .submit_plan(AT, BattlePlan::led_by("Thufir Hawat").dial(5).with_spice(5), &mut game, &mut topic)
        .unwrap();
    phase.set_override(OutcomeOverride::Traitor(HK), &game, &mut topic).unwrap();
    let result = phase
        .submit_plan(HK, BattlePlan::led_by("Umman Kudu").dial(2).with_spice(2), &mut game, &mut topic)
        .unwrap()
        .unwrap();

    assert!(result.traitor);
    assert_eq!(result.winner, Some(HK));
    assert!(result.aggressor.leader_killed);
    assert_eq!(game.forces_at(Territory::Arrakeen, 10, Faction::Harkonnen), ForcePool::new(7, 0));
    assert_eq!(game.faction(Faction::Harkonnen).unwrap().spice, 10 + 5);
}

#[test]
fn phase_survives_serialization_mid_battle() {
    let mut game = duel();
    let (mut phase, mut topic) = open(&game);
    phase
        .submit_plan(AT, BattlePlan::led_by("Duncan Idaho").dial(3).with_spice(3), &mut game, &mut topic)
        .unwrap();

    let saved = serde_json::to_string(&phase).unwrap();
    let saved_game = serde_json::to_string(&game).unwrap();
    let mut phase: Battles = serde_json::from_str(&saved).unwrap();
    let mut game: GameState = serde_json::from_str(&saved_game).unwrap();
    assert_eq!(phase.step(), PhaseStep::PlansPending);

    let result = phase
        .submit_plan(HK, BattlePlan::led_by("Umman Kudu"), &mut game, &mut topic)
        .unwrap()
        .unwrap();
    assert_eq!(result.winner, Some(AT));
}
