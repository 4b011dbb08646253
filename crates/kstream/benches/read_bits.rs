use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use kstream::{BitOrder, Session, Stream};

fn gen_packet(total_bytes: usize) -> Vec<u8> {
    // Deterministic but non-trivial pattern
    (0..total_bytes).map(|i| (i * 31 % 256) as u8).collect()
}

fn bench_read_bits(c: &mut Criterion) {
    let packet = gen_packet(4096);

    for &width in &[1u32, 7, 13, 32, 64] {
        for (name, order) in [("be", BitOrder::MsbFirst), ("le", BitOrder::LsbFirst)] {
            let mut stream = Stream::from_memory(packet.clone());
            let reads = packet.len() as u64 * 8 / width as u64;

            c.bench_function(&format!("read_bits_{name}_{width}"), |b| {
                b.iter(|| {
                    stream.seek(0).unwrap();
                    for _ in 0..reads {
                        black_box(stream.read_bits(width, order).unwrap());
                    }
                })
            });
        }
    }
}

fn bench_session_reads(c: &mut Criterion) {
    let packet = gen_packet(4096);

    c.bench_function("session_u4le_4096", |b| {
        b.iter(|| {
            let mut ks = Session::default();
            let io = ks.open_memory(packet.clone()).unwrap();
            for _ in 0..packet.len() / 4 {
                black_box(ks.read(io, |s| s.read_u4le()).unwrap());
            }
        })
    });

    c.bench_function("session_lazy_bytes_4096", |b| {
        b.iter(|| {
            let mut ks = Session::default();
            let io = ks.open_memory(packet.clone()).unwrap();
            for _ in 0..packet.len() / 16 {
                black_box(ks.read_bytes(io, 16).unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_read_bits, bench_session_reads);
criterion_main!(benches);
