use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use swf_core::{Drawable, Extractor};

fn tag(code: u16, payload: &[u8]) -> Vec<u8> {
    let mut out = ((code << 6) | 0x3F).to_le_bytes().to_vec();
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

// `shapes` DefineShape3 tags with one solid fill, each placed on its own depth.
fn movie(shapes: u16) -> Vec<u8> {
    let mut data = Vec::new();
    for id in 1..=shapes {
        let mut payload = id.to_le_bytes().to_vec();
        // 0..100 x 0..50 twips, 8 bit fields
        payload.extend_from_slice(&[0x40, 0x03, 0x20, 0x01, 0x90]);
        payload.extend_from_slice(&[1, 0x00, 255, 0, 0, 255, 0, 0x10, 0x00]);
        data.extend(tag(32, &payload));
    }
    for depth in 1..=shapes {
        let mut payload = vec![0x02];
        payload.extend_from_slice(&depth.to_le_bytes());
        payload.extend_from_slice(&depth.to_le_bytes());
        data.extend(tag(26, &payload));
    }
    data.extend(tag(1, &[]));
    data.extend_from_slice(&[0, 0]);
    data
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("Extractor");

    for &count in &[100u16, 1_000, 10_000] {
        let data = movie(count);
        group.bench_with_input(BenchmarkId::new("shapes", count), &data, |b, data| {
            b.iter(|| Extractor::builder(data.clone()).build().shapes().map(|shapes| shapes.len()))
        });
        group.bench_with_input(BenchmarkId::new("timeline", count), &data, |b, data| {
            b.iter(|| {
                let extractor = Extractor::builder(data.clone()).build();
                extractor.timeline(false).and_then(|timeline| timeline.bounds())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
