//! Character k-gram hashing and winnowing.
//!
//! Both operations run in O(n) over the number of characters or k-grams.

use std::collections::VecDeque;

use xxhash_rust::xxh3::xxh3_128_with_seed;

use crate::fingerprint::WinnowedKgram;

/// Hash every overlapping k-gram of `text` with XXH3-128.
///
/// k-grams are taken over Unicode scalar values, so a multi-byte character
/// counts as one position. The output is index-aligned with k-gram start
/// offsets; it is empty when `k == 0` or the text is shorter than `k`.
pub fn kgram_hashes(text: &str, k: usize, seed: u64) -> Vec<u128> {
    if k == 0 {
        return Vec::new();
    }
    // Byte offset of every char boundary, including the end of the text.
    let mut bounds: Vec<usize> = text.char_indices().map(|(idx, _)| idx).collect();
    let n = bounds.len();
    if n < k {
        return Vec::new();
    }
    bounds.push(text.len());

    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(n - k + 1);
    for start in 0..=(n - k) {
        let gram = &bytes[bounds[start]..bounds[start + k]];
        out.push(xxh3_128_with_seed(gram, seed));
    }
    out
}

/// Winnowing via monotonic deque, O(n).
///
/// Selects the minimum hash in each window of `w` consecutive k-gram hashes,
/// breaking ties towards the rightmost position. A position chosen by
/// consecutive windows is emitted once. Fewer than `w` hashes yield no
/// selection at all.
pub fn winnow(hashes: &[u128], w: usize) -> Vec<WinnowedKgram> {
    let n = hashes.len();
    if w == 0 || n < w {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(n - w + 1);
    // Indices in the current window, hash values non-decreasing from front
    // to back. The front is always the window minimum.
    let mut dq: VecDeque<usize> = VecDeque::with_capacity(w);
    let mut last_picked: Option<usize> = None;

    let push = |dq: &mut VecDeque<usize>, i: usize| {
        // Popping on `<=` leaves the rightmost of equal minima at the front.
        while let Some(&j) = dq.back() {
            if hashes[i] <= hashes[j] {
                dq.pop_back();
            } else {
                break;
            }
        }
        dq.push_back(i);
    };

    let mut emit = |dq: &VecDeque<usize>, out: &mut Vec<WinnowedKgram>| {
        if let Some(&idx) = dq.front() {
            // Selected positions never move backwards, so comparing with the
            // last pick is enough to skip already selected positions.
            if last_picked != Some(idx) {
                out.push(WinnowedKgram {
                    hash: hashes[idx],
                    position: idx,
                });
                last_picked = Some(idx);
            }
        }
    };

    for i in 0..w {
        push(&mut dq, i);
    }
    emit(&dq, &mut out);

    for i in w..n {
        let left = i + 1 - w;
        while let Some(&j) = dq.front() {
            if j < left {
                dq.pop_front();
            } else {
                break;
            }
        }
        push(&mut dq, i);
        emit(&dq, &mut out);
    }

    out
}
