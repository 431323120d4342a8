use bitframe::{field::FieldDesc, frame::Frame};
use criterion::{Criterion, criterion_group, criterion_main};

fn gen_frame(field_count: usize) -> Frame {
    let mut frame = Frame::new();
    let mut fields = Vec::with_capacity(field_count);

    for i in 0..field_count {
        fields.push(FieldDesc::sized(format!("f{}", i), 11, 0u16));
    }
    frame.add_fields(&fields).unwrap();

    // Deterministic but non-trivial values
    for i in 0..field_count {
        frame
            .set(format!("f{}", i).as_str(), (i * 31 % 2048) as u16)
            .unwrap();
    }

    frame
}

fn bench_frame_codec(c: &mut Criterion) {
    for &field_count in &[1usize, 10, 50, 100] {
        let frame = gen_frame(field_count);
        let wire = frame.encode().unwrap();

        c.bench_function(&format!("encode_{}_fields", field_count), |b| {
            b.iter(|| {
                let _ = frame.encode().unwrap();
            })
        });

        c.bench_function(&format!("decode_{}_fields", field_count), |b| {
            b.iter(|| {
                frame.decode(&wire).unwrap();
            })
        });
    }
}

criterion_group!(benches, bench_frame_codec);
criterion_main!(benches);
