//! Numerically stable helpers shared by the policy families

use rand::Rng;

/// Append the constant bias feature: `[ob, 1]`
pub fn include_bias(ob: &[f64]) -> Vec<f64> {
    let mut ob_1 = Vec::with_capacity(ob.len() + 1);
    ob_1.extend_from_slice(ob);
    ob_1.push(1.0);
    ob_1
}

/// Log-softmax of a logit vector
///
/// The maximum logit is subtracted before exponentiating, so logits in the
/// thousands do not overflow.
pub fn log_softmax(logits: &[f64]) -> Vec<f64> {
    let max_logit = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let log_sum = logits.iter().map(|&x| (x - max_logit).exp()).sum::<f64>().ln();
    logits.iter().map(|&x| x - max_logit - log_sum).collect()
}

/// Softmax of a logit vector (sums to 1)
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    log_softmax(logits).into_iter().map(f64::exp).collect()
}

/// Entropy of the categorical distribution defined by `logits`
pub fn entropy(logits: &[f64]) -> f64 {
    -log_softmax(logits).iter().map(|&logp| logp * logp.exp()).sum::<f64>()
}

/// Draw an index from the categorical distribution `softmax(logits)`
pub fn weighted_sample<R: Rng + ?Sized>(logits: &[f64], rng: &mut R) -> usize {
    let probs = softmax(logits);
    let u: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (k, p) in probs.iter().enumerate() {
        cumulative += p;
        if u < cumulative {
            return k;
        }
    }
    // Rounding can leave the cumulative sum a hair below u
    probs.len().saturating_sub(1)
}
