use std::collections::BTreeMap;

use super::model::{ArrayError, AttrValue, Coordinate, DType, LabeledArray};

/// Minimal deterministic PRNG (xoshiro256**)
pub struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    /// Seeded from the wall clock, for "random" self-test data.
    pub fn from_time() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(42);
        Self::new(nanos)
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    /// Uniform in [0, 1).
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    pub fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + i as f64 * step).collect()
        }
    }
}

fn text(s: &str) -> AttrValue {
    AttrValue::Text(s.to_string())
}

/// The self-test array: 11 uniform random samples along `iteration`, with
/// coordinates `iteration` in [0, 1] and `time` in [0, 13].
pub fn self_test_array(rng: &mut SimpleRng) -> Result<LabeledArray, ArrayError> {
    const N: usize = 11;
    let data = (0..N).map(|_| rng.next_f64()).collect();

    let mut coords = BTreeMap::new();
    coords.insert(
        "iteration".to_string(),
        Coordinate::new(linspace(0.0, 1.0, N), DType::Float64),
    );
    coords.insert(
        "time".to_string(),
        Coordinate::new(linspace(0.0, 13.0, N), DType::Float64),
    );

    Ok(LabeledArray::new("iteration", data, DType::Float64, coords)?
        .with_attrs(vec![("title".to_string(), text("Test Data"))]))
}

/// A larger demo signal: a noisy damped oscillation sampled `n` times.
pub fn demo_array(n: usize, rng: &mut SimpleRng) -> Result<LabeledArray, ArrayError> {
    let time = linspace(0.0, 20.0, n);
    let omega = 2.0 * std::f64::consts::PI * 0.4;
    let data: Vec<f64> = time
        .iter()
        .map(|&t| 2.5 * (-t / 6.0).exp() * (omega * t).cos() + rng.gauss(0.0, 0.05))
        .collect();
    let phase: Vec<f64> = time
        .iter()
        .map(|&t| (omega * t) % (2.0 * std::f64::consts::PI))
        .collect();
    let sample: Vec<f64> = (0..n).map(|i| i as f64).collect();

    let mut coords = BTreeMap::new();
    coords.insert(
        "time".to_string(),
        Coordinate::new(time, DType::Float64).with_attrs(vec![
            ("units".to_string(), text("s")),
            ("long_name".to_string(), text("elapsed time")),
        ]),
    );
    coords.insert(
        "phase".to_string(),
        Coordinate::new(phase, DType::Float64).with_attrs(vec![("units".to_string(), text("rad"))]),
    );
    coords.insert("sample".to_string(), Coordinate::new(sample, DType::Int32));

    Ok(LabeledArray::new("sample", data, DType::Float64, coords)?
        .with_name("voltage")
        .with_attrs(vec![
            ("title".to_string(), text("Damped oscillator")),
            ("units".to_string(), text("V")),
            ("damping_time".to_string(), AttrValue::Float(6.0)),
            ("frequency".to_string(), AttrValue::Float(0.4)),
            ("channels".to_string(), AttrValue::IntegerList(vec![1, 2])),
        ]))
}
