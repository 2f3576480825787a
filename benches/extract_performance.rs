use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ncov_inventory::extract::{self, AREA_STAT_MARKER, TIMESTAMP_MARKER, TIMESTAMP_TERMINATOR};
use ncov_inventory::fetch::{Fetcher, StaticSource};

/// Fixture generator for pages shaped like the remote source
mod fixtures {
    /// A page with `provinces` provinces of `cities` cities each, surrounded
    /// by `padding` bytes of unrelated script.
    pub fn page(provinces: usize, cities: usize, padding: usize) -> String {
        let mut area = String::from("[");
        for p in 0..provinces {
            if p > 0 {
                area.push(',');
            }
            area.push_str(&format!(
                r#"{{"provinceName":"province-{p}","confirmedCount":{},"suspectedCount":0,"curedCount":1,"deadCount":0,"cities":["#,
                p * 10
            ));
            for c in 0..cities {
                if c > 0 {
                    area.push(',');
                }
                area.push_str(&format!(
                    r#"{{"cityName":"city-{p}-{c}","confirmedCount":{c},"suspectedCount":0,"curedCount":0,"deadCount":0}}"#
                ));
            }
            area.push_str("]}");
        }
        area.push(']');

        let filler = "var x = [1, [2, 3], 4];".repeat(padding / 24 + 1);
        format!(
            "<html><script>{filler}</script><script>window.timeStamp=1580000000000</script>\
             <script>try {{ window.getAreaStat = {area}}}catch(e){{}}</script>{filler}</html>"
        )
    }
}

fn bench_extract_area_stat(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_area_stat");

    for provinces in [10usize, 34, 200] {
        let page = fixtures::page(provinces, 20, 64 * 1024);
        group.bench_with_input(BenchmarkId::new("provinces", provinces), &page, |b, page| {
            b.iter(|| extract::extract_object_array(black_box(page), AREA_STAT_MARKER).unwrap());
        });
    }

    group.finish();
}

fn bench_extract_timestamp(c: &mut Criterion) {
    let page = fixtures::page(34, 20, 64 * 1024);
    c.bench_function("extract_timestamp", |b| {
        b.iter(|| {
            extract::extract_timestamp(black_box(&page), TIMESTAMP_MARKER, TIMESTAMP_TERMINATOR)
                .unwrap()
        });
    });
}

fn bench_fetch_to_disk(c: &mut Criterion) {
    c.bench_function("fetch_snapshot_static", |b| {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let fetcher = Fetcher::new(
            StaticSource::new("bench", fixtures::page(34, 20, 16 * 1024)),
            temp_dir.path(),
        );
        b.iter(|| fetcher.fetch_snapshot().unwrap());
    });
}

criterion_group!(
    benches,
    bench_extract_area_stat,
    bench_extract_timestamp,
    bench_fetch_to_disk
);
criterion_main!(benches);
