use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::Normal;

/// Number of pre-generated noise samples in the circular buffer.
const BUFFER_LEN: usize = 1000;

/// Pre-generated circular buffer of zero-mean Gaussian write-variability
/// factors.
///
/// The buffer is filled once from a seeded generator, so a run's pulse
/// non-idealities are deterministically reproducible from the seed. One
/// sample is consumed per write; the index wraps after the buffer is
/// exhausted.
#[derive(Debug, Clone)]
pub struct WriteVariability {
    samples: Vec<f64>,
    index: usize,
}

impl WriteVariability {
    /// Fills the buffer from `Normal(0, std_dev)` seeded with `seed`.
    ///
    /// A standard deviation of zero produces an all-zero buffer, disabling
    /// variability without changing the write path.
    pub fn new(std_dev: f64, seed: u64) -> Self {
        let samples = if std_dev > 0.0 {
            let normal = Normal::new(0.0, std_dev)
                .expect("standard deviation is positive and finite");
            let mut rng = StdRng::seed_from_u64(seed);
            (0..BUFFER_LEN).map(|_| rng.sample(normal)).collect()
        } else {
            vec![0.0; BUFFER_LEN]
        };

        Self { samples, index: 0 }
    }

    /// Advances the circular index and returns the next noise factor.
    pub fn next_factor(&mut self) -> f64 {
        self.index = if self.index < self.samples.len() - 1 {
            self.index + 1
        } else {
            0
        };
        self.samples[self.index]
    }
}
