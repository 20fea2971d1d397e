#[macro_use]
extern crate criterion;
extern crate fraktal;
extern crate num;

use criterion::Criterion;
use fraktal::{escape_time, ColorGradient, FractalFunction, Renderer, Rgb, Viewport};
use num::Complex;

// The worst-case pixel: an interior point pays for every iteration.
fn bench_escape_time(c: &mut Criterion) {
    let function = FractalFunction::compile("z**2").unwrap();
    c.bench_function("escape_time interior point", move |b| {
        b.iter(|| escape_time(&function, Complex::new(-0.1, 0.1), 1000))
    });
}

fn bench_escape_time_with_builtins(c: &mut Criterion) {
    let function = FractalFunction::compile("sin(z) * z").unwrap();
    c.bench_function("escape_time trig formula", move |b| {
        b.iter(|| escape_time(&function, Complex::new(-0.1, 0.1), 1000))
    });
}

fn bench_small_render(c: &mut Criterion) {
    c.bench_function("render 64x64", |b| {
        let viewport = Viewport::from_coords(-2.0, -2.0, 2.0, 2.0).unwrap();
        let gradient = ColorGradient::new(Rgb::new(0, 0, 0), Rgb::new(0, 255, 0));
        let renderer = Renderer::new("z**2", 64, 50, viewport, gradient).unwrap();
        b.iter(|| renderer.render(2))
    });
}

criterion_group!(
    benches,
    bench_escape_time,
    bench_escape_time_with_builtins,
    bench_small_render
);
criterion_main!(benches);
