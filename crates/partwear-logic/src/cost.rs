//! Part pricing from component quality.
//!
//! A part with every component at the default quality (0.75) costs its
//! base price. Zero quality halves it; higher quality costs more.

/// Fraction of the base cost paid at zero quality.
pub const TERRIBLE_COST_FRACTION: f64 = 0.5;

/// Cost of a part whose reliability modules have the given qualities.
///
/// `terrible = base * 0.5`, `per_percent = (base - terrible) / 75 / n`,
/// `cost = round(terrible + Σ per_percent * quality * 100)`. A part with no
/// modules costs its base price.
pub fn part_cost(base_cost: f64, qualities: &[f32]) -> f64 {
    if qualities.is_empty() {
        return base_cost;
    }
    let terrible = base_cost * TERRIBLE_COST_FRACTION;
    let per_percent = (base_cost - terrible) / 75.0 / qualities.len() as f64;
    let extra: f64 = qualities
        .iter()
        .map(|q| per_percent * (q.clamp(0.0, 1.0) as f64) * 100.0)
        .sum();
    (terrible + extra).round()
}
