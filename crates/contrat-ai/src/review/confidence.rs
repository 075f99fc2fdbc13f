use std::sync::Mutex;

use super::domain::{AnalysisResult, Contract, Decision, MotifCode};

/// Bounded noise injected into confidence scores to simulate model
/// uncertainty. Injected so tests can seed or zero it.
pub trait UncertaintySource: Send {
    /// Perturbation in [0, 0.20), subtracted from the raw score.
    fn perturbation(&mut self) -> f64;
}

/// Deterministic xorshift64 PRNG; explicit seed, zero seed remapped.
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform draw in [0, 1).
    pub fn next_unit(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Weighted draw over 0..100.
    pub fn next_percent(&mut self) -> u64 {
        self.next_u64() % 100
    }
}

impl UncertaintySource for Xorshift64 {
    fn perturbation(&mut self) -> f64 {
        self.next_unit() * 0.20
    }
}

/// Source producing no perturbation; used where reproducible scores matter.
pub struct NoUncertainty;

impl UncertaintySource for NoUncertainty {
    fn perturbation(&mut self) -> f64 {
        0.0
    }
}

/// Maps a preliminary rule decision to a confidence score in [0, 1].
pub struct ConfidenceScorer {
    source: Mutex<Box<dyn UncertaintySource>>,
}

impl ConfidenceScorer {
    pub fn new(source: Box<dyn UncertaintySource>) -> Self {
        Self {
            source: Mutex::new(source),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Box::new(Xorshift64::new(seed)))
    }

    pub fn score(&self, contract: &Contract, preliminary: &AnalysisResult) -> f64 {
        let mut confidence = match preliminary.decision {
            Decision::Reject => rejection_base(preliminary.motif_code),
            _ => approval_score(contract),
        };

        let perturbation = {
            let mut source = self.source.lock().expect("uncertainty mutex poisoned");
            source.perturbation()
        };
        confidence -= perturbation;

        round2(confidence.clamp(0.0, 1.0))
    }
}

fn rejection_base(code: MotifCode) -> f64 {
    match code {
        MotifCode::ConsentMissing => 0.95,
        MotifCode::SignatureMissing => 0.90,
        MotifCode::EmailInvalid => 0.85,
        MotifCode::PhoneInvalid => 0.80,
        MotifCode::DateIncoherent => 0.75,
        MotifCode::AddressInvalid => 0.70,
        _ => 1.0,
    }
}

fn approval_score(contract: &Contract) -> f64 {
    let mut confidence = 1.0;
    if contract.email.contains("test") {
        confidence -= 0.30;
    }
    if contract.telephone.starts_with("06") {
        confidence -= 0.10;
    }
    if contract.delivery_street.len() < 10 {
        confidence -= 0.40;
    }
    if contract.price < 50.0 {
        confidence -= 0.25;
    }
    confidence
}

/// Two decimal places, locale-independent.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
