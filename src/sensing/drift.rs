use rand::Rng;

/// Bounded random walk step: add a uniform delta in `[-volatility/2, volatility/2]`, then clamp.
pub fn drift<R: Rng + ?Sized>(rng: &mut R, value: f64, min: f64, max: f64, volatility: f64) -> f64 {
    let change = (rng.gen::<f64>() - 0.5) * volatility;
    (value + change).clamp(min, max)
}
