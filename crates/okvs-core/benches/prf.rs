use criterion::{black_box, criterion_group, criterion_main, Criterion};
use okvs_core::{Gf2e, Prf};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn bench_prf(c: &mut Criterion) {
    let prf = Prf::new(&[42u8; 16]).unwrap();

    c.bench_function("prf_integer", |b| {
        b.iter(|| prf.integer(black_box(b"benchmark-key"), black_box(1 << 20)))
    });

    c.bench_function("prf_bytes_48", |b| {
        b.iter(|| prf.bytes(black_box(b"benchmark-key"), 48))
    });
}

fn bench_gf2e(c: &mut Criterion) {
    let mut rng = ChaCha20Rng::seed_from_u64(0);
    let field = Gf2e::new(128).unwrap();
    let a = field.random(&mut rng);
    let b = field.random(&mut rng);

    c.bench_function("gf2e_128_mul", |bench| {
        bench.iter(|| field.mul(black_box(&a), black_box(&b)))
    });

    c.bench_function("gf2e_128_inv", |bench| {
        bench.iter(|| field.inv(black_box(&a)))
    });
}

criterion_group!(benches, bench_prf, bench_gf2e);
criterion_main!(benches);
