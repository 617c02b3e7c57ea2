//! Benchmarks for the artist/album aware shuffle.
//!
//! Compares a plain uniform shuffle against the repair passes on libraries
//! with few and many distinct artists.

use std::hint::black_box;

use {
    criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main},
    rand::{SeedableRng, rngs::StdRng, seq::SliceRandom},
};

use playqueue::{
    MediaEntity, MediaId, Song,
    queue::EnhancedShuffle,
};

fn library(size: usize, artists: usize) -> Vec<MediaEntity> {
    (0..size)
        .map(|i| {
            let artist = i % artists;
            let song = Song {
                id: i64::try_from(i).unwrap_or(i64::MAX),
                title: format!("Track {i}"),
                artist: format!("Artist {artist}"),
                album: format!("Album {}", artist * 2 + i % 2),
                ..Song::default()
            };
            MediaEntity::from_song(&song, song.id, &MediaId::songs_category())
        })
        .collect()
}

fn bench_shuffle(c: &mut Criterion) {
    let mut group = c.benchmark_group("enhanced_shuffle");

    for (size, artists) in [(100, 5), (1_000, 20), (10_000, 200)] {
        let input = library(size, artists);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("uniform", size), &input, |b, input| {
            let mut rng = StdRng::seed_from_u64(7);
            b.iter(|| {
                let mut list = input.clone();
                list.shuffle(&mut rng);
                black_box(list)
            });
        });

        group.bench_with_input(BenchmarkId::new("enhanced", size), &input, |b, input| {
            let shuffle = EnhancedShuffle::default();
            let mut rng = StdRng::seed_from_u64(7);
            b.iter(|| black_box(shuffle.shuffle_with_rng(input.clone(), &mut rng)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_shuffle);
criterion_main!(benches);
