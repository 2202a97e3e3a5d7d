// -------------------------------------------------------------------------
// SCPN Kinetic -- Collision Sweep Benchmark
// Times one full collide() timestep of an electron-proton group over a
// single bin at two population sizes, fixed and automatic Coulomb log.
// -------------------------------------------------------------------------

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use kinetic_collisions::context::CollisionContext;
use kinetic_collisions::group::{run_collisions, CollisionGroup};
use kinetic_types::config::{CollisionsSpec, PatchLayout, SimulationParams};
use kinetic_types::species::Species;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use std::hint::black_box;
use std::path::PathBuf;

fn make_params() -> SimulationParams {
    SimulationParams {
        timestep: 0.1,
        reference_angular_frequency_si: 1.88e15,
        cells_per_bin: 1.0,
        dim: 3,
        patch: PatchLayout::default(),
        output_dir: PathBuf::from("."),
    }
}

fn make_species(n: usize) -> Vec<Species> {
    let mut rng = StdRng::seed_from_u64(7);
    let thermal = Normal::new(0.0, 0.1).unwrap();
    let cold = Normal::new(0.0, 0.001).unwrap();

    let mut electron = Species::new("electron", 1.0, 0);
    let mut proton = Species::new("proton", 1836.0, 1);
    for _ in 0..n {
        electron.particles.push(
            [0.0; 3],
            [
                thermal.sample(&mut rng),
                thermal.sample(&mut rng),
                thermal.sample(&mut rng),
            ],
            1.0,
            -1.0,
        );
        proton.particles.push(
            [0.0; 3],
            [
                cold.sample(&mut rng),
                cold.sample(&mut rng),
                cold.sample(&mut rng),
            ],
            1.0,
            1.0,
        );
    }
    electron.rebin_single();
    proton.rebin_single();
    vec![electron, proton]
}

fn make_spec(coulomb_log: Option<f64>) -> CollisionsSpec {
    CollisionsSpec {
        species1: vec!["electron".to_string()],
        species2: vec!["proton".to_string()],
        coulomb_log,
        debug_every: None,
        ionizing: None,
    }
}

fn bench_collide(c: &mut Criterion) {
    let params = make_params();
    let mut group = c.benchmark_group("collide");

    for &n in &[1_000usize, 10_000] {
        for (label, clog) in [("fixed_log", Some(5.0)), ("auto_log", None)] {
            group.bench_with_input(
                BenchmarkId::new(label, n),
                &n,
                |b, &n| {
                    b.iter_batched(
                        || {
                            let species = make_species(n);
                            let groups = CollisionGroup::create_all(
                                &[make_spec(clog)],
                                &species,
                                &params,
                            )
                            .expect("valid bench configuration");
                            let ctx = CollisionContext::for_groups(&groups);
                            (groups, species, ctx, StdRng::seed_from_u64(99))
                        },
                        |(mut groups, mut species, mut ctx, mut rng)| {
                            run_collisions(
                                &mut groups,
                                &mut species,
                                &mut ctx,
                                &params,
                                0,
                                &mut rng,
                            )
                            .expect("collide step");
                            black_box(species)
                        },
                        BatchSize::LargeInput,
                    )
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_collide);
criterion_main!(benches);
