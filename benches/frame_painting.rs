use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use clock_demo::core::{ClientRect, ClockState, YAxis};
use clock_demo::render::tessellate::tessellate;
use clock_demo::render::VectorSurface;
use clock_demo::scene::{ClockFace, DrawOp, LabelMode};

const SIZES: [u32; 3] = [200, 400, 800];

fn display_list(axis: YAxis) -> Vec<DrawOp> {
    let face = ClockFace::new(ClockState::new(10, 10, 30, 250), axis);
    face.display_list(LabelMode::Text.resolve(59.7, true))
}

/// Benchmark: building the display list alone
fn bench_display_list(c: &mut Criterion) {
    let time = ClockState::new(10, 10, 30, 250);

    c.bench_function("display_list", |b| {
        b.iter(|| {
            let face = ClockFace::new(black_box(time), YAxis::Down);
            black_box(face.display_list(LabelMode::Text.resolve(black_box(60.0), true)))
        })
    });
}

/// Benchmark: anti-aliased vector painting at several window sizes
fn bench_vector_paint(c: &mut Criterion) {
    let ops = display_list(YAxis::Down);
    let mut group = c.benchmark_group("vector_paint");

    for size in SIZES.iter() {
        let Ok(mut surface) = VectorSurface::new(ClientRect::new(*size, *size)) else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("square", size), size, |b, _| {
            b.iter(|| {
                surface.paint(black_box(&ops));
                black_box(surface.data()[0])
            })
        });
    }

    group.finish();
}

/// Benchmark: coverage-mask painting into a BGRA pixel buffer
#[cfg(feature = "imaging")]
fn bench_imaging_paint(c: &mut Criterion) {
    use clock_demo::pixels::PixelBuffer;
    use clock_demo::render::ImagingContext;

    let ops = display_list(YAxis::Up);
    let mut group = c.benchmark_group("imaging_paint");

    for size in SIZES.iter() {
        let Ok(mut context) = PixelBuffer::new(*size, *size).and_then(ImagingContext::from_buffer)
        else {
            continue;
        };
        group.bench_with_input(BenchmarkId::new("square", size), size, |b, _| {
            b.iter(|| {
                context.paint(black_box(&ops));
                black_box(context.buffer().data()[0])
            })
        });
    }

    group.finish();
}

#[cfg(not(feature = "imaging"))]
fn bench_imaging_paint(_c: &mut Criterion) {}

/// Benchmark: tessellating the frame into GPU triangles
fn bench_tessellate(c: &mut Criterion) {
    let ops = display_list(YAxis::Down);
    let mut group = c.benchmark_group("tessellate");

    for size in SIZES.iter() {
        let rect = ClientRect::new(*size, *size);
        group.bench_with_input(BenchmarkId::new("mesh", size), size, |b, _| {
            b.iter(|| {
                let mesh = tessellate(black_box(&ops), rect, true);
                black_box(mesh.triangle_count())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_display_list,
    bench_vector_paint,
    bench_imaging_paint,
    bench_tessellate,
);
criterion_main!(benches);
