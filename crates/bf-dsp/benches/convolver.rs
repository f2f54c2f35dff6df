//! Convolver benchmarks

use bf_core::Sample;
use bf_dsp::{BlockFft, Convolver, Filter, IrFilter};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

const BLOCK_SIZE: usize = 256;
const IR_SIZE: usize = 16384;

fn make_filter(frames: usize) -> Filter {
    let samples: Vec<Sample> = (0..frames * 2)
        .map(|i| (i as Sample * 0.001).sin() * 0.1)
        .collect();
    let mut fft = BlockFft::new(BLOCK_SIZE);
    IrFilter::from_interleaved(&samples, BLOCK_SIZE)
        .unwrap()
        .prepare(&mut fft)
        .unwrap()
}

fn bench_process_steady_state(c: &mut Criterion) {
    let mut conv = Convolver::new(IR_SIZE, BLOCK_SIZE, 0);
    conv.set_filter(&make_filter(IR_SIZE), false, 1.0, None)
        .unwrap();

    let input: Vec<Sample> = (0..BLOCK_SIZE).map(|i| (i as Sample * 0.01).sin()).collect();
    let mut left = vec![0.0; BLOCK_SIZE];
    let mut right = vec![0.0; BLOCK_SIZE];

    c.bench_function("convolver_mono_16k_ir_256_block", |b| {
        b.iter(|| {
            conv.process(black_box(&input), &mut left, &mut right)
                .unwrap();
        })
    });
}

fn bench_process_with_crossfade(c: &mut Criterion) {
    let filter_a = make_filter(IR_SIZE);
    let filter_b = make_filter(IR_SIZE);
    let mut conv = Convolver::new(IR_SIZE, BLOCK_SIZE, 0);
    conv.set_filter(&filter_a, false, 1.0, None).unwrap();

    let input: Vec<Sample> = (0..BLOCK_SIZE).map(|i| (i as Sample * 0.01).sin()).collect();
    let mut left = vec![0.0; BLOCK_SIZE];
    let mut right = vec![0.0; BLOCK_SIZE];
    let mut flip = false;

    c.bench_function("convolver_crossfaded_swap_every_block", |b| {
        b.iter(|| {
            let next = if flip { &filter_a } else { &filter_b };
            flip = !flip;
            conv.set_filter(next, true, 1.0, None).unwrap();
            conv.process(black_box(&input), &mut left, &mut right)
                .unwrap();
        })
    });
}

criterion_group!(benches, bench_process_steady_state, bench_process_with_crossfade);
criterion_main!(benches);
