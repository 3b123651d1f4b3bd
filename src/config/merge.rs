//! Configuration merge logic
//!
//! Merges an overlay tree onto a base tree:
//! - Mappings: deep-merge by key (base order kept, new keys appended)
//! - Sequences: ordered union (base items first, then unseen overlay items)
//! - Scalars: override (overlay wins)
//! - Shape conflicts: override (overlay wins)

use super::value::{ConfigValue, Scalar};

/// Deep merge two configuration trees.
///
/// Nothing present in either input is lost except where the overlay
/// replaces a scalar, or a value of a different shape.
pub fn deep_merge(base: ConfigValue, overlay: ConfigValue) -> ConfigValue {
    match (base, overlay) {
        // Both mappings: deep merge
        (ConfigValue::Map(mut base_map), ConfigValue::Map(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(slot) => {
                        let base_value = std::mem::take(slot);
                        *slot = deep_merge(base_value, overlay_value);
                    }
                    None => {
                        base_map.insert(key, overlay_value);
                    }
                }
            }
            ConfigValue::Map(base_map)
        }

        // Both sequences: union, first occurrence wins its position
        (ConfigValue::Seq(base_items), ConfigValue::Seq(overlay_items)) => {
            let mut merged: Vec<ConfigValue> = Vec::with_capacity(base_items.len());
            for item in base_items.into_iter().chain(overlay_items) {
                if !merged.iter().any(|seen| same_value(seen, &item)) {
                    merged.push(item);
                }
            }
            ConfigValue::Seq(merged)
        }

        // Shape conflict: mapping or sequence against anything else
        (ConfigValue::Map(_), overlay) | (ConfigValue::Seq(_), overlay) => overlay,

        // Scalars: overlay wins
        (ConfigValue::Scalar(_), overlay) => overlay,
    }
}

/// Value equality for the sequence union. Floats compare by bit pattern
/// so NaN matches itself.
fn same_value(a: &ConfigValue, b: &ConfigValue) -> bool {
    match (a, b) {
        (ConfigValue::Scalar(Scalar::Float(x)), ConfigValue::Scalar(Scalar::Float(y))) => {
            x.to_bits() == y.to_bits()
        }
        (ConfigValue::Seq(xs), ConfigValue::Seq(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| same_value(x, y))
        }
        (ConfigValue::Map(xs), ConfigValue::Map(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).map_or(false, |y| same_value(x, y)))
        }
        (a, b) => a == b,
    }
}

/// Merge `overlay` into `target` in place
pub fn merge_into(target: &mut ConfigValue, overlay: ConfigValue) {
    let base = std::mem::take(target);
    *target = deep_merge(base, overlay);
}

/// Merge multiple layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<ConfigValue>) -> ConfigValue {
    layers.into_iter().fold(ConfigValue::default(), deep_merge)
}
