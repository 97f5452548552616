use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pyrite_core::{PipelineConfig, Raster, RasterMut};
use pyrite_fast::{fast_detect, fast_extract, fast_score_harris, FeaturePipeline};

/// Benchmark image with a gradient background and scattered bright blocks
/// so every stage has real survivors to chew on.
fn create_benchmark_image(width: usize, height: usize) -> Vec<u8> {
    let mut img = vec![0u8; width * height];
    for y in 0..height {
        for x in 0..width {
            let gradient = ((x as f32 / width as f32) * 50.0) as u8;
            let noise = ((x + y) % 7) as u8;
            img[y * width + x] = 100 + gradient + noise;
        }
    }
    for i in 0..24 {
        let cx = 30 + (i * 67) % (width - 60);
        let cy = 30 + (i * 53) % (height - 60);
        for dy in 0..6 {
            for dx in 0..6 {
                img[(cy + dy) * width + (cx + dx)] = if (dx + dy) % 2 == 0 { 40 } else { 215 };
            }
        }
    }
    img
}

fn bench_detect(c: &mut Criterion) {
    let (width, height) = (640, 480);
    let img = create_benchmark_image(width, height);
    let mut marks = vec![0u8; width * height];

    c.bench_function("fast_detect_vga", |b| {
        b.iter(|| {
            let src = Raster::new(black_box(&img), width);
            let mut dst = RasterMut::new(&mut marks, width);
            fast_detect(width, height, 16, 20, src, &mut dst);
        })
    });
}

fn bench_score_and_extract(c: &mut Criterion) {
    let (width, height) = (640, 480);
    let img = create_benchmark_image(width, height);

    let mut detected = vec![0u8; width * height];
    {
        let src = Raster::new(&img, width);
        let mut dst = RasterMut::new(&mut detected, width);
        fast_detect(width, height, 16, 20, src, &mut dst);
        fast_score_harris(width, height, 16, 1 << 15, src, &mut dst);
    }

    let mut group = c.benchmark_group("score_extract");

    let mut marks = vec![0u8; width * height];
    group.bench_function("score_harris", |b| {
        b.iter(|| {
            marks.copy_from_slice(&detected);
            let src = Raster::new(black_box(&img), width);
            let mut dst = RasterMut::new(&mut marks, width);
            fast_score_harris(width, height, 16, 1 << 15, src, &mut dst);
        })
    });

    group.bench_function("extract_plain", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(4096);
            fast_extract(
                width,
                height,
                16,
                0,
                0,
                Raster::new(black_box(&detected), width),
                &mut out,
            );
            black_box(out)
        })
    });

    group.bench_function("extract_bucketed", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(4096);
            fast_extract(
                width,
                height,
                16,
                4,
                5,
                Raster::new(black_box(&detected), width),
                &mut out,
            );
            black_box(out)
        })
    });

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let (width, height) = (640, 480);
    let img = create_benchmark_image(width, height);
    let mut marks = vec![0u8; width * height];

    let pipeline = FeaturePipeline::new(PipelineConfig::default(), width, height, width).unwrap();

    c.bench_function("pipeline_vga", |b| {
        b.iter(|| {
            let mut kps = Vec::with_capacity(4096);
            pipeline
                .run(black_box(&img), &mut marks, &mut kps)
                .unwrap();
            black_box(kps)
        })
    });
}

criterion_group!(benches, bench_detect, bench_score_and_extract, bench_full_pipeline);
criterion_main!(benches);
