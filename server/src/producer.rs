//! Vector producers
//!
//! A producer hands out the next vector to send. Both variants keep one
//! internal buffer and overwrite it on every call.

use crate::config::ProducerKind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Number of vectors between two steps of the test pattern.
pub const TEST_PATTERN_PERIOD: u64 = 100;

/// Source of vectors for one connection
pub trait VectorProducer: Send {
    /// Produce the next vector. The slice is valid until the next call.
    fn next_vector(&mut self) -> &[f64];

    /// Length of every vector this producer returns.
    fn vector_len(&self) -> usize;
}

impl<P: VectorProducer + ?Sized> VectorProducer for Box<P> {
    fn next_vector(&mut self) -> &[f64] {
        (**self).next_vector()
    }

    fn vector_len(&self) -> usize {
        (**self).vector_len()
    }
}

/// Standard-normal vectors from a generator seeded once at construction
pub struct RandomProducer {
    rng: StdRng,
    buf: Vec<f64>,
}

impl RandomProducer {
    /// `seed = None` seeds from OS entropy.
    pub fn new(vector_len: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            buf: vec![0.0; vector_len],
        }
    }
}

impl VectorProducer for RandomProducer {
    fn next_vector(&mut self) -> &[f64] {
        for value in self.buf.iter_mut() {
            *value = self.rng.sample(StandardNormal);
        }
        &self.buf
    }

    fn vector_len(&self) -> usize {
        self.buf.len()
    }
}

/// Deterministic pattern: calls 1-100 return zeros, calls 101-200 ones, and so on.
pub struct TestPatternProducer {
    calls: u64,
    buf: Vec<f64>,
}

impl TestPatternProducer {
    pub fn new(vector_len: usize) -> Self {
        Self {
            calls: 0,
            buf: vec![0.0; vector_len],
        }
    }
}

impl VectorProducer for TestPatternProducer {
    fn next_vector(&mut self) -> &[f64] {
        if self.calls > 0 && self.calls % TEST_PATTERN_PERIOD == 0 {
            for value in self.buf.iter_mut() {
                *value += 1.0;
            }
        }
        self.calls += 1;
        &self.buf
    }

    fn vector_len(&self) -> usize {
        self.buf.len()
    }
}

/// Build the producer selected by configuration.
pub fn build_producer(
    kind: ProducerKind,
    vector_len: usize,
    seed: Option<u64>,
) -> Box<dyn VectorProducer> {
    match kind {
        ProducerKind::Random => Box::new(RandomProducer::new(vector_len, seed)),
        ProducerKind::TestPattern => Box::new(TestPatternProducer::new(vector_len)),
    }
}
