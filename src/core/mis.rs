// Copyright @yucwang 2026

use crate::core::config::MisHeuristic;
use crate::math::constants::Float;

/// Weight of strategy 0 when combined with strategy 1.
///
/// `n0`/`n1` are the number of samples each strategy takes and `p0`/`p1`
/// the densities both assign to the sample being weighted. The result is
/// always in [0, 1]; NaN or negative densities count as zero.
pub fn eval_mis(heuristic: MisHeuristic, exponent: Float, n0: u32, p0: Float, n1: u32, p1: Float) -> Float {
    let q0 = weight_term(heuristic, exponent, n0 as Float * p0);
    if !(q0 > 0.0) {
        return 0.0;
    }
    let q1 = weight_term(heuristic, exponent, n1 as Float * p1);
    let q1 = if q1 > 0.0 { q1 } else { 0.0 };
    if q0.is_infinite() {
        return if q1.is_infinite() { 0.5 } else { 1.0 };
    }
    (q0 / (q0 + q1)).min(1.0)
}

fn weight_term(heuristic: MisHeuristic, exponent: Float, q: Float) -> Float {
    match heuristic {
        MisHeuristic::Balance => q,
        MisHeuristic::PowerTwo => q * q,
        MisHeuristic::PowerExp => q.powf(exponent),
    }
}
