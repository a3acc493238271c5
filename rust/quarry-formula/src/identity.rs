use xxhash_rust::xxh3::Xxh3;

use crate::formula::Formula;

/// Seed of formula cache keys ("QryFrm01" in hex).
const FORMULA_HASH_SEED: u64 = 0x5172_7946_726d_3031;

impl Formula {
    /// Content-addressable identity of the formula.
    ///
    /// Two trees of the same shape over equal sets have equal keys. Children order
    /// matters only for kinds whose result depends on it (`Not`, `Disentangle`,
    /// `CombinedFacet`).
    pub fn cache_key(&self) -> u64 {
        *self.0.cache_key.get_or_init(|| {
            let operation = self.operation();
            let mut hasher = Xxh3::with_seed(FORMULA_HASH_SEED);
            hasher.update(&[operation.tag()]);
            self.kind().hash_params(&mut hasher);

            let mut child_keys = self
                .children()
                .iter()
                .map(Formula::cache_key)
                .collect::<Vec<_>>();
            if operation.is_commutative() {
                child_keys.sort_unstable();
            }
            hasher.update(&(child_keys.len() as u64).to_le_bytes());
            for key in child_keys {
                hasher.update(&key.to_le_bytes());
            }
            hasher.digest()
        })
    }
}
