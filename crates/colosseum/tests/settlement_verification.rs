//! # Settlement Verification Tests
//!
//! End-to-end checks of the pipeline the whole system exists for:
//!
//! 1. **Battle -> finalize**: deterministic turn resolution to a single
//!    replayable winner and the authoritative settlement signal
//! 2. **Pool lifecycle**: bets -> close (odds snapshot) -> capability-gated
//!    settle -> proportional claims, rounding in the house's favor
//! 3. **Parlay lifecycle**: closed-pool legs -> combined odds -> winner
//!    accounting -> finalized payouts
//!
//! Run with: cargo test --test settlement_verification -- --nocapture

use colosseum::{Colosseum, ColosseumConfig};
use colosseum_arena::{Battle, BattleSide, Character, CharacterClass, SipMixer, Stance, TurnCommand};
use colosseum_core::{Address, CallContext, MemoryStore, Notification};
use colosseum_market::{AssetLedger, MemoryLedger, Outcome, PoolParams, HOUSE};

type Runtime = Colosseum<MemoryStore, MemoryLedger, SipMixer>;

const NOW: u64 = 1_700_000_000;
const CLOSE: u64 = NOW + 600;
const ASSET: &str = "IRON";

fn ctx(caller: &str, now: u64) -> CallContext {
    CallContext::new(caller, now)
}

fn new_runtime() -> Runtime {
    let mut ledger = MemoryLedger::new();
    let house = Address::new(HOUSE);
    for who in ["carol", "dave", "erin"] {
        let addr = Address::new(who);
        ledger.mint(ASSET, &addr, 100_000);
        ledger.approve(ASSET, &addr, &house, 100_000);
    }
    let mut rt = Colosseum::new(
        MemoryStore::new(),
        ledger,
        SipMixer::default(),
        ColosseumConfig::default(),
        &Address::new("admin"),
    );
    rt.authorize_settler(&ctx("admin", NOW), &Address::new("oracle"))
        .unwrap();
    rt
}

/// Creates the two fighters and battle `b1` (alice's Warrior vs bob's Tank).
fn stage_battle(rt: &mut Runtime) {
    rt.create_character(&ctx("alice", NOW), "c1", CharacterClass::Warrior, "Maximus")
        .unwrap();
    rt.create_character(&ctx("bob", NOW), "c2", CharacterClass::Tank, "Wall")
        .unwrap();
    rt.create_battle(&ctx("alice", NOW), "b1", "c1", "c2", NOW)
        .unwrap();
}

/// Drives `b1` to the finish, declining every wildcard, checking the
/// character invariants after every accepted call. Returns the winner.
fn run_battle_to_finish(rt: &mut Runtime) -> BattleSide {
    for round in 0..1_000u64 {
        let now = NOW + round;
        let battle = Battle::load(rt.store(), "b1").unwrap();
        if battle.finished {
            return battle.winner.expect("finished battle has a winner");
        }
        if battle.wildcard.active {
            rt.decide_wildcard(&ctx("alice", now), "b1", false).unwrap();
            rt.decide_wildcard(&ctx("bob", now), "b1", false).unwrap();
        } else {
            let (character, owner) = match battle.turn_of {
                BattleSide::One => ("c1", "alice"),
                BattleSide::Two => ("c2", "bob"),
            };
            rt.execute_turn(
                &ctx(owner, now),
                &TurnCommand {
                    battle: "b1".into(),
                    character: character.into(),
                    stance: Stance::Balanced,
                    use_special: false,
                    skill_slot: 0,
                },
            )
            .unwrap();
        }
        for id in ["c1", "c2"] {
            let c = Character::load(rt.store(), id).unwrap();
            assert!(c.current_hp <= c.max_hp, "hp invariant broke for {id}");
            assert!(c.energy <= 100, "energy invariant broke for {id}");
        }
    }
    panic!("battle b1 did not finish within 1000 rounds");
}

// ============================================================================
// MISSION 1: CLASS TABLES AND PROGRESSION
// ============================================================================

#[test]
fn verify_warrior_class_table() {
    let mut rt = new_runtime();
    rt.create_character(&ctx("alice", NOW), "c1", CharacterClass::Warrior, "Maximus")
        .unwrap();
    let c = Character::load(rt.store(), "c1").unwrap();
    assert_eq!(c.max_hp, 120);
    assert_eq!((c.damage_min, c.damage_max), (8, 15));
    assert_eq!(c.crit_bp, 1_500);
    assert_eq!(c.dodge_bp, 0);
}

#[test]
fn verify_admin_surface_is_role_gated() {
    let mut rt = new_runtime();
    stage_battle(&mut rt);

    // a random caller may not mint, grant xp, or create pools
    assert!(rt
        .mint_equipment(
            &ctx("mallory", NOW),
            "e1",
            &Address::new("mallory"),
            colosseum_arena::EquipmentKind::Weapon,
            colosseum_arena::EquipRarity::Legendary,
        )
        .is_err());
    assert!(rt.grant_xp(&ctx("mallory", NOW), "c1", 1_000).is_err());
    assert!(rt
        .create_pool(
            &ctx("mallory", NOW),
            "p1",
            "b1",
            ASSET,
            CLOSE,
            PoolParams::default()
        )
        .is_err());

    // pause blocks pause-gated entry points until unpause
    rt.pause(&ctx("admin", NOW)).unwrap();
    assert!(rt
        .create_character(&ctx("alice", NOW), "c9", CharacterClass::Mage, "Imp")
        .is_err());
    rt.unpause(&ctx("admin", NOW)).unwrap();
    rt.create_character(&ctx("alice", NOW), "c9", CharacterClass::Mage, "Imp")
        .unwrap();
}

// ============================================================================
// MISSION 2: BATTLE -> FINALIZE -> POOL SETTLEMENT
// ============================================================================

#[test]
fn verify_battle_to_settlement_pipeline() {
    let mut rt = new_runtime();
    stage_battle(&mut rt);
    rt.create_pool(
        &ctx("admin", NOW),
        "p1",
        "b1",
        ASSET,
        CLOSE,
        PoolParams::default(),
    )
    .unwrap();

    // third parties stake on both outcomes
    rt.place_bet(&ctx("carol", NOW), "p1", Outcome::A, 1_000)
        .unwrap();
    rt.place_bet(&ctx("dave", NOW), "p1", Outcome::B, 1_000)
        .unwrap();

    let winner = run_battle_to_finish(&mut rt);
    rt.finalize_battle("b1").unwrap();

    // the authoritative settlement signal is in the outbox
    let signals = rt.take_signals();
    let expected = format!("BattleFinalized:b1:winner={}", winner.as_u8());
    assert!(
        signals.iter().any(|s| s.to_string() == expected),
        "missing settlement signal {expected}"
    );

    // bot sweeps: close after close time, then settler settles from the
    // finalized battle
    assert_eq!(rt.close_due_pools(&ctx("bot", CLOSE), 15).unwrap(), 1);
    assert_eq!(rt.close_due_pools(&ctx("bot", CLOSE), 15).unwrap(), 0);
    assert!(rt.settle_due_pools(&ctx("mallory", CLOSE), 15).is_err());
    assert_eq!(rt.settle_due_pools(&ctx("oracle", CLOSE), 15).unwrap(), 1);
    assert_eq!(rt.settle_due_pools(&ctx("oracle", CLOSE), 15).unwrap(), 0);

    // claims: 2000 total, 500 bps edge -> payout pool 1900, solo winner
    let (winning_bettor, losing_bettor) = match winner {
        BattleSide::One => ("carol", "dave"),
        BattleSide::Two => ("dave", "carol"),
    };
    let paid = rt
        .claim_bet("p1", &Address::new(winning_bettor))
        .unwrap();
    assert_eq!(paid, 1_900);
    assert_eq!(rt.claim_bet("p1", &Address::new(losing_bettor)).unwrap(), 0);
    assert!(rt.claim_bet("p1", &Address::new(winning_bettor)).is_err());

    assert_eq!(
        rt.ledger()
            .balance_of(ASSET, &Address::new(winning_bettor)),
        100_900
    );
    assert_eq!(
        rt.ledger().balance_of(ASSET, &Address::new(losing_bettor)),
        99_000
    );

    // the edge sits in the house account until the admin withdraws it
    assert_eq!(
        rt.withdraw_treasury(&ctx("admin", NOW), ASSET, &Address::new("vault"))
            .unwrap(),
        100
    );
    assert_eq!(rt.ledger().balance_of(ASSET, &Address::new("vault")), 100);
    assert_eq!(rt.ledger().balance_of(ASSET, &Address::new(HOUSE)), 0);
}

#[test]
fn verify_battle_replay_is_deterministic() {
    let run = || {
        let mut rt = new_runtime();
        stage_battle(&mut rt);
        let winner = run_battle_to_finish(&mut rt);
        let battle = Battle::load(rt.store(), "b1").unwrap();
        (winner, battle.turn, battle.encode())
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);
}

// ============================================================================
// MISSION 3: PARLAY TICKETS
// ============================================================================

#[test]
fn verify_parlay_pipeline_scenario_d() {
    let mut rt = new_runtime();
    stage_battle(&mut rt);

    // two pools over the same battle, zero edge for round odds
    let params = PoolParams {
        edge_bps: 0,
        ..PoolParams::default()
    };
    rt.create_pool(&ctx("admin", NOW), "p1", "b1", ASSET, CLOSE, params)
        .unwrap();
    rt.create_pool(&ctx("admin", NOW), "p2", "b1", ASSET, CLOSE, params)
        .unwrap();
    // p1: 1000/1000 -> 2.0x per side; p2: 2000 A / 1000 B -> A at 1.5x
    rt.place_bet(&ctx("carol", NOW), "p1", Outcome::A, 1_000)
        .unwrap();
    rt.place_bet(&ctx("dave", NOW), "p1", Outcome::B, 1_000)
        .unwrap();
    rt.place_bet(&ctx("carol", NOW), "p2", Outcome::A, 2_000)
        .unwrap();
    rt.place_bet(&ctx("dave", NOW), "p2", Outcome::B, 1_000)
        .unwrap();

    rt.create_multipool(&ctx("admin", NOW), "m1", ASSET, 500)
        .unwrap();

    // legs must be closed pools - placement before close is rejected
    assert!(rt
        .place_multibet(
            &ctx("erin", NOW),
            "s1",
            "m1",
            500,
            &[("p1".to_owned(), Outcome::A)],
        )
        .is_err());

    assert_eq!(rt.close_due_pools(&ctx("bot", CLOSE), 15).unwrap(), 2);

    // Scenario D: legs 2.0x and 1.5x -> combined 3.0x, weight = 500 x 3
    rt.place_multibet(
        &ctx("erin", CLOSE),
        "s1",
        "m1",
        500,
        &[("p1".to_owned(), Outcome::A), ("p2".to_owned(), Outcome::A)],
    )
    .unwrap();
    let signals = rt.take_signals();
    assert!(signals
        .iter()
        .any(|s| matches!(s, Notification::MultibetPlaced { combined_odds, .. } if *combined_odds == 3_000_000)));

    // winner accounting needs settled legs
    assert!(rt.check_winner("s1").is_err());
    rt.settle_pool(&ctx("oracle", CLOSE), "p1", Outcome::A)
        .unwrap();
    rt.settle_pool(&ctx("oracle", CLOSE), "p2", Outcome::A)
        .unwrap();
    assert!(rt.check_winner("s1").unwrap());

    rt.finalize_multipool(&ctx("oracle", CLOSE), "m1").unwrap();
    // pot = 500 - 5% = 475; erin holds all winning weight
    assert_eq!(rt.claim_betslip("s1").unwrap(), 475);
    assert!(rt.claim_betslip("s1").is_err());
}
