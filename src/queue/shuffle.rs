//! Shuffle that avoids playing the same artist or album back to back.
//!
//! A uniform Fisher-Yates permutation is drawn first, then a bounded number of
//! repair passes swap items out of clashing neighbour pairs. A swap is kept
//! only if it strictly lowers the clash count around both touched slots, so
//! the result never has more clashes than the uniform draw it started from.

use rand::{Rng, seq::SliceRandom};

use crate::queue::MediaEntity;

const UNKNOWN: &str = "<unknown>";

/// Artist/album aware shuffler.
#[derive(Debug, Clone, Copy)]
pub struct EnhancedShuffle {
    max_passes: usize,
}

impl Default for EnhancedShuffle {
    fn default() -> Self {
        Self::new(3)
    }
}

impl EnhancedShuffle {
    /// Creates a shuffler running at most `max_passes` repair passes.
    #[must_use]
    pub fn new(max_passes: usize) -> Self {
        Self { max_passes }
    }

    /// Shuffles with the thread-local RNG.
    #[must_use]
    pub fn shuffle(&self, list: Vec<MediaEntity>) -> Vec<MediaEntity> {
        self.shuffle_with_rng(list, &mut rand::rng())
    }

    /// Shuffles with a caller-provided RNG.
    #[must_use]
    pub fn shuffle_with_rng<R: Rng + ?Sized>(
        &self,
        mut list: Vec<MediaEntity>,
        rng: &mut R,
    ) -> Vec<MediaEntity> {
        list.shuffle(rng);
        if list.len() < 3 {
            return list;
        }

        for _ in 0..self.max_passes {
            if !repair_pass(&mut list) {
                break;
            }
        }
        list
    }
}

/// Number of adjacent pairs sharing an artist or album.
#[must_use]
pub fn count_clashes(list: &[MediaEntity]) -> usize {
    list.windows(2).filter(|w| clash(&w[0], &w[1])).count()
}

fn clash(a: &MediaEntity, b: &MediaEntity) -> bool {
    same_key(&a.artist, &b.artist) || same_key(&a.album, &b.album)
}

fn same_key(a: &str, b: &str) -> bool {
    let a = a.trim();
    !a.is_empty() && !a.eq_ignore_ascii_case(UNKNOWN) && a.eq_ignore_ascii_case(b.trim())
}

/// Runs one pass; returns whether anything moved.
fn repair_pass(list: &mut [MediaEntity]) -> bool {
    let mut moved = false;
    for i in 1..list.len() {
        if !clash(&list[i - 1], &list[i]) {
            continue;
        }
        for k in (i + 1)..list.len() {
            if try_swap(list, i, k) {
                moved = true;
                break;
            }
        }
    }
    moved
}

/// Swaps `i` and `k` if that strictly reduces clashes on the affected pairs.
fn try_swap(list: &mut [MediaEntity], i: usize, k: usize) -> bool {
    let mut pairs = vec![i - 1, i, k - 1, k];
    pairs.sort_unstable();
    pairs.dedup();
    pairs.retain(|p| p + 1 < list.len());
    let local = |list: &[MediaEntity]| {
        pairs
            .iter()
            .filter(|p| clash(&list[**p], &list[**p + 1]))
            .count()
    };

    let before = local(&*list);
    list.swap(i, k);
    if local(&*list) < before {
        true
    } else {
        list.swap(i, k);
        false
    }
}
