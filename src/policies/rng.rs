use rand::{rngs::SmallRng, SeedableRng};

#[derive(Clone, Debug)]
pub struct MaybeSeededRng {
    seed: Option<u64>,
    rng: SmallRng,
}

impl MaybeSeededRng {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = if let Some(seed) = seed {
            SmallRng::seed_from_u64(seed)
        } else {
            SmallRng::from_os_rng()
        };

        Self { seed, rng }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn get_rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    /// Independent generator for the given stream (e.g. a trial index).
    /// Seeded generators fork deterministically, unseeded ones draw fresh entropy.
    pub fn fork(&self, stream: u64) -> Self {
        Self::new(self.seed.map(|seed| splitmix64(splitmix64(seed) ^ stream)))
    }
}

// splitmix64 finaliser, so nearby (seed, stream) pairs land on unrelated seeds
fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
