use criterion::{black_box, criterion_group, criterion_main, Criterion};

use vexi_machine_core::fixtures::{blend_machine, button_machine, slide_machine};
use vexi_machine_core::MachineContext;

fn bench_advance(c: &mut Criterion) {
    let mut group = c.benchmark_group("advance");

    group.bench_function("button_idle", |b| {
        let mut ctx = MachineContext::default();
        let (def, ab) = button_machine();
        let mut inst = ctx.instantiate(def, ab).unwrap();
        inst.advance(0.0);
        b.iter(|| {
            black_box(inst.advance(black_box(1.0 / 60.0)));
        });
    });

    group.bench_function("blend_tracking", |b| {
        let mut ctx = MachineContext::default();
        let (def, ab) = blend_machine();
        let mut inst = ctx.instantiate(def, ab).unwrap();
        inst.advance(0.0);
        let amount = inst.get_number("amount").unwrap();
        let mut t = 0.0f32;
        b.iter(|| {
            t += 1.0;
            inst.set_number(amount, (t.sin() * 0.5 + 0.5) * 100.0);
            black_box(inst.advance(1.0 / 60.0));
        });
    });

    group.bench_function("crossfade_cycle", |b| {
        let mut ctx = MachineContext::default();
        let (def, ab) = slide_machine();
        let mut inst = ctx.instantiate(def, ab).unwrap();
        inst.advance(0.0);
        let go = inst.get_bool("go").unwrap();
        inst.set_bool(go, true);
        b.iter(|| {
            black_box(inst.advance(black_box(0.01)));
        });
    });

    group.finish();
}

criterion_group!(benches, bench_advance);
criterion_main!(benches);
