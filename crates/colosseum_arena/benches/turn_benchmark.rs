//! Benchmark for the hot turn-resolution path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use colosseum_arena::{
    BattleEngine, BattleRules, CharacterClass, CharacterRegistry, SipMixer, Stance, TurnCommand,
};
use colosseum_core::{CallContext, MemoryStore};

fn bench_execute_turn(c: &mut Criterion) {
    let rules = BattleRules::default();

    c.bench_function("execute_turn", |b| {
        b.iter_batched(
            || {
                let mut store = MemoryStore::new();
                let ctx = CallContext::new("alice", 1_700_000_000);
                let mut reg = CharacterRegistry::new(&mut store, &rules);
                reg.create_character(&ctx, "c1", CharacterClass::Warrior, "Maximus")
                    .unwrap();
                let ctx2 = CallContext::new("bob", 1_700_000_000);
                reg.create_character(&ctx2, "c2", CharacterClass::Tank, "Wall")
                    .unwrap();
                let mut mixer = SipMixer::default();
                let mut engine = BattleEngine::new(&mut store, &mut mixer, &rules);
                engine
                    .create_battle(&ctx, "b1", "c1", "c2", 1_700_000_000)
                    .unwrap();
                store
            },
            |mut store| {
                let ctx = CallContext::new("alice", 1_700_000_001);
                let mut mixer = SipMixer::default();
                let mut engine = BattleEngine::new(&mut store, &mut mixer, &rules);
                let cmd = TurnCommand {
                    battle: "b1".into(),
                    character: "c1".into(),
                    stance: Stance::Balanced,
                    use_special: false,
                    skill_slot: 0,
                };
                // a wildcard trigger is a valid outcome too; both paths count
                let _ = black_box(engine.execute_turn(&ctx, &cmd));
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_execute_turn);
criterion_main!(benches);
