pub mod resolver;

pub use resolver::*;

use std::collections::HashMap;

/// String-keyed variable mapping. Values keep whatever shape the source
/// document gave them.
pub type Variables = HashMap<String, serde_json::Value>;

/// Right-biased merge: keys from `source` overwrite keys in `target`.
pub fn assign(target: &mut Variables, source: &Variables) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}
