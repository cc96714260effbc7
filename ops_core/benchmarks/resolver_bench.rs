use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use ops_core::{
    ActionBoard, ActionKind, ActionResolver, AgentProfile, ChanceMode, DeskSnapshot, Reviver,
    SaveGame, Stat,
};

fn catalog(size: usize) -> String {
    let actions: Vec<String> = (0..size)
        .map(|index| {
            let kind = ActionKind::ALL[index % ActionKind::ALL.len()];
            format!(
                r#"{{ "kind": "{}", "name": "Action {index}", "base_difficulty": {}.0, "count": 50 }}"#,
                kind.key(),
                100 + index * 25
            )
        })
        .collect();
    format!(r#"{{ "actions": [{}] }}"#, actions.join(","))
}

fn bench_success_chance(c: &mut Criterion) {
    let resolver = ActionResolver::default();
    let board = ActionBoard::from_catalog_str(&catalog(64), 42).expect("bench catalog");
    let desk = DeskSnapshot {
        team_size: 20,
        ..DeskSnapshot::default()
    };
    let mut group = c.benchmark_group("success_chance");

    for level in [10.0f64, 1_000.0, 100_000.0] {
        let agent = AgentProfile::with_stats(Stat::ALL.into_iter().map(|stat| (stat, level)));
        group.bench_with_input(BenchmarkId::new("board", level as u64), &agent, |b, agent| {
            b.iter(|| {
                for action in board.iter() {
                    let chance = resolver
                        .est_success_chance(action, &desk, agent)
                        .expect("finite chance");
                    black_box(chance);
                    black_box(resolver.success_chance(action, &desk, agent, ChanceMode::Real));
                }
            })
        });
    }

    group.finish();
}

fn bench_save_round_trip(c: &mut Criterion) {
    let reviver = Reviver::builtin();
    let mut group = c.benchmark_group("save");

    for size in [16usize, 128, 512] {
        let game = SaveGame {
            board: ActionBoard::from_catalog_str(&catalog(size), 7).expect("bench catalog"),
            ..SaveGame::default()
        };
        group.bench_with_input(BenchmarkId::new("round_trip", size), &game, |b, game| {
            b.iter_batched(
                || game.to_save_string().expect("save"),
                |save| {
                    let loaded = SaveGame::load(&save, &reviver).expect("load");
                    black_box(loaded);
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(resolver_benches, bench_success_chance, bench_save_round_trip);
criterion_main!(resolver_benches);
