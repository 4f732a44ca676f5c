//! Dataset fingerprinting: content hash of the price universe.
//!
//! Series are hashed in symbol order, so the hash does not depend on the order
//! the universe was loaded in. Each bar contributes its date and the
//! little-endian bytes of every field.

use crate::domain::{DatasetHash, PriceSeries};

pub fn dataset_hash(universe: &[PriceSeries]) -> DatasetHash {
    let mut ordered: Vec<&PriceSeries> = universe.iter().collect();
    ordered.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let mut hasher = blake3::Hasher::new();
    for series in ordered {
        hasher.update(series.symbol.as_bytes());
        hasher.update(&(series.bars.len() as u64).to_le_bytes());
        for bar in &series.bars {
            hasher.update(bar.date.to_string().as_bytes());
            for value in [bar.open, bar.high, bar.low, bar.close] {
                hasher.update(&value.to_le_bytes());
            }
            hasher.update(&bar.volume.to_le_bytes());
        }
    }
    DatasetHash::from_hash(hasher.finalize().to_hex().as_str())
}
