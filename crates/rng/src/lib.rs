//! Deterministic SHAKE256 counter generator used for shot sampling.
//!
//! Every draw is keyed by a context label, so two call sites never share a
//! stream by accident. Independent per-sample streams are obtained with
//! [`OndRng::fork`], which does not depend on how the forks are scheduled.

use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake256,
};

#[derive(Clone, Debug)]
pub struct OndRng {
    state: [u8; 32],
    step: u64,
}

impl OndRng {
    pub fn new(seed: &[u8]) -> Self {
        let mut state = [0u8; 32];
        shake(&[seed, b"OND_INIT"], &mut state);
        Self { state, step: 0 }
    }

    /// Uniform `f64` in `[0, 1)`.
    pub fn next_f64(&mut self, ctx: &[u8]) -> f64 {
        let word = self.next_u64(ctx);
        // 53 mantissa bits keep the value strictly below 1.0
        (word >> 11) as f64 / (1u64 << 53) as f64
    }

    pub fn next_u64(&mut self, ctx: &[u8]) -> u64 {
        self.advance();

        let mut out = [0u8; 8];
        shake(&[&self.state, ctx], &mut out);
        u64::from_be_bytes(out)
    }

    /// Derive an independent child generator.
    ///
    /// The child depends only on the parent state, `ctx` and `index`, so
    /// forking `0..m` up front and handing the children to worker threads
    /// yields the same streams regardless of thread interleaving.
    pub fn fork(&mut self, ctx: &[u8], index: u64) -> OndRng {
        self.advance();

        let mut state = [0u8; 32];
        shake(&[&self.state, ctx, &index.to_be_bytes(), b"FORK"], &mut state);
        OndRng { state, step: 0 }
    }

    fn advance(&mut self) {
        self.step += 1;

        let state = self.state;
        let step_bytes = self.step.to_be_bytes();
        shake(&[&state, &step_bytes, b"QSIM"], &mut self.state);

        if self.state[0] < 16 {
            let state = self.state;
            shake(&[&state, b"SKIP"], &mut self.state);
        }
    }
}

fn shake(parts: &[&[u8]], out: &mut [u8]) {
    let mut h = Shake256::default();
    for p in parts {
        h.update(p);
    }
    let mut r = h.finalize_xof();
    r.read(out);
}

#[cfg(test)]
mod tests {
    use super::OndRng;

    #[test]
    fn same_seed_same_stream() {
        let mut a = OndRng::new(b"seed");
        let mut b = OndRng::new(b"seed");
        for _ in 0..32 {
            assert_eq!(a.next_u64(b"T"), b.next_u64(b"T"));
        }
    }

    #[test]
    fn context_separates_streams() {
        let mut a = OndRng::new(b"seed");
        let mut b = OndRng::new(b"seed");
        assert_ne!(a.next_u64(b"A"), b.next_u64(b"B"));
    }

    #[test]
    fn uniform_stays_in_unit_interval() {
        let mut rng = OndRng::new(b"unit");
        for _ in 0..10_000 {
            let x = rng.next_f64(b"U");
            assert!((0.0..1.0).contains(&x), "x = {}", x);
        }
    }

    #[test]
    fn forks_are_reproducible_and_distinct() {
        let mut p1 = OndRng::new(b"parent");
        let mut p2 = OndRng::new(b"parent");

        let mut c1: Vec<OndRng> = (0..4).map(|i| p1.fork(b"SAMPLE", i)).collect();
        let mut c2: Vec<OndRng> = (0..4).map(|i| p2.fork(b"SAMPLE", i)).collect();

        let draws1: Vec<u64> = c1.iter_mut().map(|r| r.next_u64(b"X")).collect();
        let draws2: Vec<u64> = c2.iter_mut().map(|r| r.next_u64(b"X")).collect();
        assert_eq!(draws1, draws2);

        for i in 0..draws1.len() {
            for j in i + 1..draws1.len() {
                assert_ne!(draws1[i], draws1[j]);
            }
        }
    }
}
