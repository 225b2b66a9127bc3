//! Closed-form results used to check simulated figures.

/// Blocking probability of an M/M/1/B queue.
///
/// `buffer_capacity` counts waiting positions. With the packet in service the
/// system holds at most `B + 1` packets, so with `ρ = λ / μ`:
///
/// ```text
/// P_block = ρ^(B+1) (1 - ρ) / (1 - ρ^(B+2))
/// ```
///
/// At `ρ = 1` the expression is 0/0; its limit `1 / (B + 2)` is returned.
///
/// ```
/// let p = netdes::analysis::blocking_probability(0.5, 1.0, 10);
/// assert!((p - 2.4420e-4).abs() < 1e-7);
/// ```
pub fn blocking_probability(arrival_rate: f64, service_rate: f64, buffer_capacity: u32) -> f64 {
    let rho = arrival_rate / service_rate;
    let n = buffer_capacity as i32;

    if (rho - 1.0).abs() < 1e-12 {
        return 1.0 / (buffer_capacity as f64 + 2.0);
    }

    rho.powi(n + 1) * (1.0 - rho) / (1.0 - rho.powi(n + 2))
}
