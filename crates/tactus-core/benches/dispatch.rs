//! Benchmarks for touch dispatch and arbitration.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;
use tactus_core::gestures::angle_difference;
use tactus_core::{
    GestureArena, GestureRecognizer, ManualClock, Point, TouchId, TouchPhase, TouchPoint,
    VelocityTracker,
};

fn full_arena(clock: &ManualClock) -> GestureArena {
    let mut arena = GestureArena::new().with_clock(clock.clone());
    arena.add(GestureRecognizer::tap());
    arena.add(GestureRecognizer::long_press());
    arena.add(GestureRecognizer::pan());
    arena.add(GestureRecognizer::scale());
    arena.add(GestureRecognizer::rotate());
    arena.add(GestureRecognizer::swipe());
    arena
}

fn bench_dispatch_drag(c: &mut Criterion) {
    let clock = ManualClock::new();
    let mut arena = full_arena(&clock);

    c.bench_function("dispatch_drag_six_recognizers", |b| {
        b.iter(|| {
            let mut touch = TouchPoint::new(TouchId(1), 0.0, 0.0);
            let _ = arena.dispatch(black_box(&[touch.clone()]));
            for step in 1..=20 {
                clock.advance_ms(16);
                touch = touch.moved_to(step as f32 * 12.0, step as f32 * 3.0);
                let _ = arena.dispatch(black_box(&[touch.clone()]));
            }
            let _ = arena.dispatch(&[touch.in_place(TouchPhase::Ended)]);
        });
    });
}

fn bench_dispatch_pinch(c: &mut Criterion) {
    let clock = ManualClock::new();
    let mut arena = full_arena(&clock);

    c.bench_function("dispatch_pinch_six_recognizers", |b| {
        b.iter(|| {
            let mut a = TouchPoint::new(TouchId(1), 100.0, 100.0);
            let mut z = TouchPoint::new(TouchId(2), 200.0, 100.0);
            let _ = arena.dispatch(&[a.clone(), z.clone()]);
            for step in 1..=20 {
                clock.advance_ms(16);
                let spread = step as f32 * 6.0;
                a = a.moved_to(100.0 - spread, 100.0);
                z = z.moved_to(200.0 + spread, 100.0);
                let _ = arena.dispatch(black_box(&[a.clone(), z.clone()]));
            }
            let _ = arena.dispatch(&[
                a.in_place(TouchPhase::Ended),
                z.in_place(TouchPhase::Ended),
            ]);
        });
    });
}

fn bench_simulate_pan(c: &mut Criterion) {
    let mut arena = GestureArena::new().with_clock(ManualClock::new());
    let pan = arena.add(GestureRecognizer::pan());
    let path: Vec<f32> = (0..32).flat_map(|i| [i as f32 * 10.0, 0.0]).collect();

    c.bench_function("simulate_pan_32_points", |b| {
        b.iter(|| arena.simulate(pan, black_box(&path)))
    });
}

fn bench_velocity_update(c: &mut Criterion) {
    let mut tracker = VelocityTracker::new();
    let mut now = Duration::ZERO;
    let mut x = 0.0_f32;

    c.bench_function("velocity_update", |b| {
        b.iter(|| {
            now += Duration::from_millis(16);
            x += 4.0;
            tracker.update(black_box(Point::new(x, 0.0)), now);
        })
    });
}

fn bench_angle_difference(c: &mut Criterion) {
    c.bench_function("angle_difference", |b| {
        b.iter(|| angle_difference(black_box(3.0), black_box(-3.0)))
    });
}

criterion_group!(
    benches,
    bench_dispatch_drag,
    bench_dispatch_pinch,
    bench_simulate_pan,
    bench_velocity_update,
    bench_angle_difference,
);
criterion_main!(benches);
