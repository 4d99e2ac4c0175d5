//! Benchmarks for listing dispatch and extraction.
//!
//! Measures URL-to-binding matching in the channel registries, full
//! listing parses on fixture pages, and the manifest/subtitle text passes.
//!
//! Run with: `cargo bench --bench registry_bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use retrokanal::channels::{nickelodeon, oppetarkiv};
use retrokanal::stream::adapters::hls::HlsAdapter;
use retrokanal::stream::subtitle::correct_hours;

// ---------------------------------------------------------------------------
// URL datasets
// ---------------------------------------------------------------------------

/// Main list URLs hit the exact bindings.
const MAIN_URLS: &[&str] = &[
    "http://www.oppetarkiv.se/kategori/titel",
    "http://www.nickelodeon.nl/shows",
];

/// Everything else falls through to the wildcard bindings.
const PAGE_URLS: &[&str] = &[
    "http://www.oppetarkiv.se/etikett/titel/Hem-till-byn/?sida=2&sort=tid_stigande&embed=true",
    "http://www.oppetarkiv.se/video/2740235?output=json",
    "http://www.nickelodeon.nl/video/101-het-begin?page_1=3",
];

// ---------------------------------------------------------------------------
// Fixture pages
// ---------------------------------------------------------------------------

fn title_index(entries: usize) -> String {
    let mut html = String::from("<ul class=\"svtoa-alphabet-list\">\n");
    for i in 0..entries {
        html.push_str(&format!(
            "  <li class=\"svtoa-js-searchlist-item\">\n    <a class=\"svt-text-bread\" href=\"/etikett/titel/Program-{i}/\">Program {i}</a>\n  </li>\n"
        ));
    }
    html.push_str("</ul>");
    html
}

fn nick_page(entries: usize) -> String {
    let mut html = String::from("<ul class='playlist'>\n");
    for i in 0..entries {
        html.push_str(&format!(
            "<li class='playlist-item' data-item-id='{i}'>\n  <a href='/video/{i}-clip'>\n    <img class=\"thumb\" src=\"http://images.mtvnn.com/{i}.jpg\" alt=\"\">\n    <p class='title'>Show {i}</p>\n    <p data-id='{i}' class='subtitle'>Clip {i}</p>\n  </a>\n</li>\n"
        ));
    }
    html.push_str("<li class=\"divider playlist-item\"><p>Andere leuke video’s</p></li>\n");
    html.push_str(&"<li class='playlist-item'>related</li>\n".repeat(entries));
    html.push_str("</ul>");
    html
}

fn master_playlist(variants: usize) -> String {
    let mut m3u8 = String::from("#EXTM3U\n");
    for i in 1..=variants {
        m3u8.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION=1280x720,CODECS=\"avc1.4d401f,mp4a.40.2\"\nindex_{i}_av.m3u8\n",
            i * 400_000
        ));
    }
    m3u8
}

fn subtitle_track(cues: usize) -> String {
    (0..cues)
        .map(|i| format!("{}\n10:{:02}:01,000 --> 10:{:02}:04,000\nRad {i}\n\n", i + 1, i % 60, i % 60))
        .collect()
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_registry_resolve(c: &mut Criterion) {
    let svt = oppetarkiv::registry().unwrap();
    let nick = nickelodeon::registry("http://www.nickelodeon.nl/shows").unwrap();

    c.bench_function("registry_resolve_exact", |b| {
        b.iter(|| {
            for url in MAIN_URLS {
                black_box(svt.resolve(black_box(url)).is_ok());
                black_box(nick.resolve(black_box(url)).is_ok());
            }
        });
    });

    c.bench_function("registry_resolve_wildcard", |b| {
        b.iter(|| {
            for url in PAGE_URLS {
                black_box(svt.resolve(black_box(url)).is_ok());
                black_box(nick.resolve(black_box(url)).is_ok());
            }
        });
    });
}

fn bench_parse_listing(c: &mut Criterion) {
    let svt = oppetarkiv::build(oppetarkiv::CODE).unwrap();
    let nick = nickelodeon::build("nickelodeon").unwrap();
    let index = title_index(500);
    let page = nick_page(50);

    c.bench_function("parse_title_index_500", |b| {
        b.iter(|| {
            black_box(
                svt.parse_listing(oppetarkiv::MAIN_LIST_URL, black_box(&index))
                    .unwrap(),
            )
        });
    });

    c.bench_function("parse_truncated_video_page_50", |b| {
        b.iter(|| {
            black_box(
                nick.parse_listing("http://www.nickelodeon.nl/video/0-clip", black_box(&page))
                    .unwrap(),
            )
        });
    });
}

fn bench_text_passes(c: &mut Criterion) {
    let master = master_playlist(8);
    let subtitle = subtitle_track(600);

    c.bench_function("hls_master_8_variants", |b| {
        b.iter(|| {
            let variants = HlsAdapter::parse_master_playlist(
                black_box(&master),
                "http://svtplay-i.akamaihd.net/i/o/1/master.m3u8",
            );
            black_box(HlsAdapter::streams_from_variants(&variants))
        });
    });

    c.bench_function("subtitle_correct_hours_600", |b| {
        b.iter(|| black_box(correct_hours(black_box(&subtitle))));
    });
}

criterion_group!(
    benches,
    bench_registry_resolve,
    bench_parse_listing,
    bench_text_passes
);
criterion_main!(benches);
