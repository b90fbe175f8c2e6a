use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use favirecon::{favicon_hash, find_icon_href, mime_base64, normalize, Config, Found, SignatureDb};
use std::collections::HashSet;
use std::time::Duration;

// Fast settings for all benchmarks
fn configure_fast_group(group: &mut criterion::BenchmarkGroup<criterion::measurement::WallTime>) {
    group.warm_up_time(Duration::from_millis(500));
    group.measurement_time(Duration::from_millis(500));
    group.sample_size(20);
}

fn benchmark_config_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("config");
    configure_fast_group(&mut group);

    group.bench_function("creation", |b| {
        b.iter(|| {
            let config = Config::default();
            black_box(config);
        });
    });

    group.bench_function("hash_filter", |b| {
        let config = Config {
            hashes: vec!["81586312".to_string(), " 116323821 ".to_string(), String::new()],
            ..Default::default()
        };
        b.iter(|| black_box(config.hash_filter()));
    });

    group.finish();
}

fn benchmark_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    configure_fast_group(&mut group);

    let inputs = vec![
        "example.com",
        "https://example.com/admin/",
        "http://10.0.0.1:8080/static/app.ico?v=2#top",
        "ab",
    ];

    group.bench_function("mixed", |b| {
        b.iter(|| {
            for input in &inputs {
                let _ = black_box(normalize(input));
            }
        });
    });

    group.finish();
}

fn benchmark_hashing(c: &mut Criterion) {
    let mut group = c.benchmark_group("favicon_hash");
    configure_fast_group(&mut group);

    // Typical favicon sizes: 16x16 ico, 32x32 ico, large png
    for size in [318usize, 1150, 15086] {
        let icon: Vec<u8> = (0..size).map(|i| (i * 31 % 251) as u8).collect();

        group.bench_with_input(BenchmarkId::new("mime_base64", size), &icon, |b, icon| {
            b.iter(|| black_box(mime_base64(icon)));
        });
        group.bench_with_input(BenchmarkId::new("hash", size), &icon, |b, icon| {
            b.iter(|| black_box(favicon_hash(icon)));
        });
    }

    group.finish();
}

fn benchmark_link_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("link_extraction");
    configure_fast_group(&mut group);

    let mut page = String::from("<html><head><title>Dashboard</title>");
    for i in 0..20 {
        page.push_str(&format!(r#"<link rel="stylesheet" href="/css/{i}.css">"#));
    }
    page.push_str(r#"<link rel="shortcut icon" href="/static/favicon.png"></head><body>"#);
    page.push_str(&"<div><p>content</p></div>".repeat(200));
    page.push_str("</body></html>");

    group.bench_function("find_icon_href", |b| {
        b.iter(|| black_box(find_icon_href(&page)));
    });

    group.finish();
}

fn benchmark_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("signatures");
    configure_fast_group(&mut group);

    let db = SignatureDb::embedded().unwrap();
    let no_filter = HashSet::new();
    let filter: HashSet<String> = ["81586312".to_string()].into_iter().collect();

    group.bench_function("lookup_hit", |b| {
        b.iter(|| black_box(db.lookup("81586312", &no_filter, None).is_ok()));
    });
    group.bench_function("lookup_miss", |b| {
        b.iter(|| black_box(db.lookup("-1541278541", &no_filter, Some("http://example.com/favicon.ico")).is_err()));
    });
    group.bench_function("lookup_filtered", |b| {
        b.iter(|| black_box(db.lookup("116323821", &filter, None).is_err()));
    });

    group.finish();
}

fn benchmark_output_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("output");
    configure_fast_group(&mut group);

    let found = Found {
        url: "https://ci.example.com".to_string(),
        hash: "81586312".to_string(),
        name: "Jenkins".to_string(),
    };

    group.bench_function("plain", |b| {
        b.iter(|| black_box(found.format()));
    });
    group.bench_function("json", |b| {
        b.iter(|| black_box(found.format_json()));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_config_creation,
    benchmark_normalize,
    benchmark_hashing,
    benchmark_link_extraction,
    benchmark_lookup,
    benchmark_output_formatting
);
criterion_main!(benches);
