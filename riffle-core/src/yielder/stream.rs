//! Independent random streams derived from one seed
//!
//! A single seed feeds several generators: one file shuffle per epoch, the
//! buffer picks of a basic yielder, and the source draws of a weighted mix.
//! Each generator is keyed by a stream id and the pair is run through a
//! SplitMix64 finalizer, so seeds `S` and `S + 1` never share a stream.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Buffer picks of a basic yielder
pub const BUFFER_PICKS: u64 = 0;
/// Source draws of a weighted mix
pub const SOURCE_PICKS: u64 = u64::MAX;
// File shuffles use the 1-based epoch as their stream id.

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Seed of stream `stream` under `seed`
pub fn stream_seed(seed: u64, stream: u64) -> u64 {
    splitmix64(splitmix64(seed) ^ stream)
}

/// Generator for stream `stream` under `seed`
pub fn stream_rng(seed: u64, stream: u64) -> StdRng {
    StdRng::seed_from_u64(stream_seed(seed, stream))
}
