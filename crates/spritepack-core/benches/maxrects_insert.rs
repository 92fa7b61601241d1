use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};
use spritepack_core::packer::MaxRectsPacker;
use spritepack_core::prelude::*;
use std::hint::black_box;

fn generate_sizes(count: usize, min_size: u32, max_size: u32) -> Vec<(u32, u32)> {
    use rand::{Rng, SeedableRng};
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    (0..count)
        .map(|_| {
            (
                rng.gen_range(min_size..=max_size),
                rng.gen_range(min_size..=max_size),
            )
        })
        .collect()
}

fn generate_sprites(sizes: &[(u32, u32)]) -> Vec<Sprite> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| {
            let shade = (i % 251) as u8;
            Sprite::new(
                format!("frame_{i}"),
                RgbaImage::from_pixel(w, h, Rgba([shade, 64, 200, 255])),
            )
        })
        .collect()
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("maxrects_insert");

    for count in [50, 200, 800] {
        let sizes = generate_sizes(count, 8, 64);
        group.throughput(Throughput::Elements(count as u64));

        for padding in [0, 2] {
            group.bench_with_input(
                BenchmarkId::new(format!("pad{padding}"), count),
                &sizes,
                |b, sizes| {
                    b.iter(|| {
                        let mut packer = MaxRectsPacker::new(2048, 2048, padding);
                        for &(w, h) in sizes {
                            black_box(packer.insert(w, h));
                        }
                        black_box(packer.free_list_len())
                    });
                },
            );
        }
    }

    group.finish();
}

fn bench_pack_modes(c: &mut Criterion) {
    let mut group = c.benchmark_group("pack_modes");
    group.sample_size(20);

    let sprites = generate_sprites(&generate_sizes(120, 8, 48));
    group.throughput(Throughput::Elements(sprites.len() as u64));

    for (label, mode) in [
        ("optimal", PackingMode::Optimal),
        ("smart", PackingMode::Smart),
        ("preserve", PackingMode::Preserve),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(label), &sprites, |b, sprites| {
            b.iter(|| {
                let opts = PackingOptions::builder()
                    .with_max_dimensions(1024, 1024)
                    .packing_mode(mode)
                    .compression_quality(CompressionQuality::Fast)
                    .formats(["json"])
                    .build();
                black_box(pack(sprites.clone(), opts).map(|r| r.sheets.len()))
            });
        });
    }

    group.finish();
}

fn bench_dedup(c: &mut Criterion) {
    let mut group = c.benchmark_group("dedup");

    // every fourth frame repeats its predecessor
    let mut sprites = generate_sprites(&generate_sizes(200, 16, 32));
    for i in (3..sprites.len()).step_by(4) {
        sprites[i].image = sprites[i - 1].image.clone();
    }

    group.bench_function("200_frames", |b| {
        b.iter(|| black_box(deduplicate(sprites.clone()).0.len()));
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_pack_modes, bench_dedup);
criterion_main!(benches);
