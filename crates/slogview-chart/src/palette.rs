//! Perceptually uniform lane colors.

/// Viridis sampled at eleven evenly spaced stops.
const VIRIDIS_STOPS: [(u8, u8, u8); 11] = [
    (0x44, 0x01, 0x54),
    (0x48, 0x24, 0x75),
    (0x41, 0x44, 0x87),
    (0x35, 0x5f, 0x8d),
    (0x2a, 0x78, 0x8e),
    (0x21, 0x91, 0x8c),
    (0x22, 0xa8, 0x84),
    (0x44, 0xbf, 0x70),
    (0x7a, 0xd1, 0x51),
    (0xbd, 0xdf, 0x26),
    (0xfd, 0xe7, 0x25),
];

/// `n` viridis colors from dark to light as `#rrggbb`.
pub fn viridis(n: usize) -> Vec<String> {
    match n {
        0 => Vec::new(),
        1 => vec![hex(VIRIDIS_STOPS[0])],
        _ => (0..n)
            .map(|i| sample(i as f64 / (n - 1) as f64))
            .collect(),
    }
}

fn sample(t: f64) -> String {
    let scaled = t.clamp(0.0, 1.0) * (VIRIDIS_STOPS.len() - 1) as f64;
    let lower = scaled.floor() as usize;
    let upper = (lower + 1).min(VIRIDIS_STOPS.len() - 1);
    let frac = scaled - lower as f64;

    let (r0, g0, b0) = VIRIDIS_STOPS[lower];
    let (r1, g1, b1) = VIRIDIS_STOPS[upper];
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;

    hex((mix(r0, r1), mix(g0, g1), mix(b0, b1)))
}

fn hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}
