//! Seeded random streams for the kingfisher.
//!
//! Attack rolls and victim picks draw from separate streams so that adding a
//! victim pick never shifts later attack rolls for the same seed.
use hmac::{Hmac, Mac};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::Sha256;

/// Deterministic pair of RNG streams derived from one user-visible seed.
#[derive(Debug, Clone)]
pub struct ThreatRng {
    seed: u64,
    attack: CountingRng<ChaCha8Rng>,
    victim: CountingRng<ChaCha8Rng>,
}

impl ThreatRng {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            attack: CountingRng::new(derive_stream_seed(seed, b"attack")),
            victim: CountingRng::new(derive_stream_seed(seed, b"victim")),
        }
    }

    /// Seed from the operating system; the chosen seed stays readable via [`Self::seed`].
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Stream used for attack rolls.
    pub fn attack(&mut self) -> &mut CountingRng<ChaCha8Rng> {
        &mut self.attack
    }

    /// Stream used for victim selection.
    pub fn victim(&mut self) -> &mut CountingRng<ChaCha8Rng> {
        &mut self.victim
    }

    /// Spend one victim draw on a standalone generator. Clones of it replay
    /// the same pick, so a settlement retried against a fresh snapshot does
    /// not advance the victim stream again.
    pub fn fork_victim(&mut self) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.victim.next_u64())
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha8Rng> {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()).expect("64-bit seed is valid key");
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}
