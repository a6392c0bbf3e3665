//! Gauss-Legendre quadrature rules for panel integration

// Allow excessive precision for high-precision mathematical constants
#![allow(clippy::excessive_precision)]

/// Maximum supported Gauss-Legendre order
pub const MAX_GAUSS_ORDER: usize = 8;

/// Gauss-Legendre abscissas and weights on [-1, 1].
///
/// Orders outside 1..=8 are clamped to the nearest available rule.
pub fn gauss_legendre(order: usize) -> (&'static [f64], &'static [f64]) {
    match order.clamp(1, MAX_GAUSS_ORDER) {
        1 => (&GL1_X, &GL1_W),
        2 => (&GL2_X, &GL2_W),
        3 => (&GL3_X, &GL3_W),
        4 => (&GL4_X, &GL4_W),
        5 => (&GL5_X, &GL5_W),
        6 => (&GL6_X, &GL6_W),
        7 => (&GL7_X, &GL7_W),
        _ => (&GL8_X, &GL8_W),
    }
}

/// Quad quadrature points (tensor product of 1D Gauss-Legendre)
///
/// Returns (xi, eta, weight) tuples for the reference square [-1,1]².
pub fn quad_quadrature(order: usize) -> Vec<(f64, f64, f64)> {
    let (points, weights) = gauss_legendre(order);
    let mut result = Vec::with_capacity(points.len() * points.len());

    for (i, &xi) in points.iter().enumerate() {
        for (j, &eta) in points.iter().enumerate() {
            result.push((xi, eta, weights[i] * weights[j]));
        }
    }

    result
}

/// Triangle quadrature points (xi, eta, weight)
///
/// Returns (xi, eta, weight) tuples for the reference triangle with vertices
/// at (0,0), (1,0), (0,1). Weights sum to 0.5, the reference triangle area.
pub fn triangle_quadrature(order: usize) -> Vec<(f64, f64, f64)> {
    // The raw tables use the unit-simplex convention (weights sum to 1).
    const AREA_SCALE: f64 = 0.5;
    let table: &[[f64; 3]] = match order {
        1 => &TR1,
        2 => &TR4,
        3 => &TR7,
        _ => &TR13,
    };
    table
        .iter()
        .map(|&[x, y, w]| (x, y, w * AREA_SCALE))
        .collect()
}

static GL1_X: [f64; 1] = [0.0];
static GL1_W: [f64; 1] = [2.0];

static GL2_X: [f64; 2] = [-0.5773502691896257, 0.5773502691896257];
static GL2_W: [f64; 2] = [1.0, 1.0];

static GL3_X: [f64; 3] = [-0.7745966692414834, 0.0, 0.7745966692414834];
static GL3_W: [f64; 3] = [0.5555555555555556, 0.8888888888888888, 0.5555555555555556];

static GL4_X: [f64; 4] = [
    -0.8611363115940526,
    -0.3399810435848563,
    0.3399810435848563,
    0.8611363115940526,
];
static GL4_W: [f64; 4] = [
    0.3478548451374538,
    0.6521451548625461,
    0.6521451548625461,
    0.3478548451374538,
];

static GL5_X: [f64; 5] = [
    -0.9061798459386640,
    -0.5384693101056831,
    0.0,
    0.5384693101056831,
    0.9061798459386640,
];
static GL5_W: [f64; 5] = [
    0.2369268850561891,
    0.4786286704993665,
    0.5688888888888889,
    0.4786286704993665,
    0.2369268850561891,
];

static GL6_X: [f64; 6] = [
    -0.9324695142031521,
    -0.6612093864662645,
    -0.2386191860831969,
    0.2386191860831969,
    0.6612093864662645,
    0.9324695142031521,
];
static GL6_W: [f64; 6] = [
    0.1713244923791704,
    0.3607615730481386,
    0.4679139345726910,
    0.4679139345726910,
    0.3607615730481386,
    0.1713244923791704,
];

static GL7_X: [f64; 7] = [
    -0.9491079123427585,
    -0.7415311855993945,
    -0.4058451513773972,
    0.0,
    0.4058451513773972,
    0.7415311855993945,
    0.9491079123427585,
];
static GL7_W: [f64; 7] = [
    0.1294849661688697,
    0.2797053914892766,
    0.3818300505051189,
    0.4179591836734694,
    0.3818300505051189,
    0.2797053914892766,
    0.1294849661688697,
];

static GL8_X: [f64; 8] = [
    -0.9602898564975363,
    -0.7966664774136267,
    -0.5255324099163290,
    -0.1834346424956498,
    0.1834346424956498,
    0.5255324099163290,
    0.7966664774136267,
    0.9602898564975363,
];
static GL8_W: [f64; 8] = [
    0.1012285362903763,
    0.2223810344533745,
    0.3137066458778873,
    0.3626837833783620,
    0.3626837833783620,
    0.3137066458778873,
    0.2223810344533745,
    0.1012285362903763,
];

// Triangle quadrature rules, [xi, eta, weight]

static TR1: [[f64; 3]; 1] = [[0.333333333333333, 0.333333333333333, 1.0]];

static TR4: [[f64; 3]; 4] = [
    [0.333333333333333, 0.333333333333333, -0.5625],
    [0.6, 0.2, 0.520833333333333],
    [0.2, 0.6, 0.520833333333333],
    [0.2, 0.2, 0.520833333333333],
];

static TR7: [[f64; 3]; 7] = [
    [0.333333333333333, 0.333333333333333, 0.225],
    [0.797426985353087, 0.101286507323456, 0.125939180544827],
    [0.101286507323456, 0.797426985353087, 0.125939180544827],
    [0.101286507323456, 0.101286507323456, 0.125939180544827],
    [0.470142064105115, 0.059715871789770, 0.132394152788506],
    [0.059715871789770, 0.470142064105115, 0.132394152788506],
    [0.470142064105115, 0.470142064105115, 0.132394152788506],
];

static TR13: [[f64; 3]; 13] = [
    [0.333333333333333, 0.333333333333333, -0.149570044467682],
    [0.260345966079040, 0.260345966079040, 0.175615257433208],
    [0.260345966079040, 0.479308067841920, 0.175615257433208],
    [0.479308067841920, 0.260345966079040, 0.175615257433208],
    [0.065130102902216, 0.065130102902216, 0.053347235608838],
    [0.065130102902216, 0.869739794195568, 0.053347235608838],
    [0.869739794195568, 0.065130102902216, 0.053347235608838],
    [0.638444188569810, 0.048690315425316, 0.077113760890257],
    [0.048690315425316, 0.638444188569810, 0.077113760890257],
    [0.638444188569810, 0.312865496004874, 0.077113760890257],
    [0.312865496004874, 0.638444188569810, 0.077113760890257],
    [0.048690315425316, 0.312865496004874, 0.077113760890257],
    [0.312865496004874, 0.048690315425316, 0.077113760890257],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauss_weights_sum() {
        // Sum of weights should be 2 (integral of 1 over [-1,1])
        for n in 1..=MAX_GAUSS_ORDER {
            let (x, w) = gauss_legendre(n);
            assert_eq!(x.len(), n);
            let sum: f64 = w.iter().sum();
            assert!((sum - 2.0).abs() < 1e-10, "n={}: sum={}", n, sum);
        }
    }

    #[test]
    fn test_gauss_integrates_cubics_exactly() {
        // order-2 Gauss is exact for x^3 over [-1,1]
        let (x, w) = gauss_legendre(2);
        let integral: f64 = x.iter().zip(w).map(|(&xi, &wi)| wi * xi.powi(3)).sum();
        assert!(integral.abs() < 1e-14);
    }

    #[test]
    fn test_quad_quadrature_weights() {
        let quad = quad_quadrature(3);
        assert_eq!(quad.len(), 9);
        // Weights should sum to 4 (area of [-1,1]²)
        let sum: f64 = quad.iter().map(|&(_, _, w)| w).sum();
        assert!((sum - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_triangle_quadrature_weights() {
        for order in 1..=4 {
            let tri = triangle_quadrature(order);
            let sum: f64 = tri.iter().map(|&(_, _, w)| w).sum();
            assert!((sum - 0.5).abs() < 1e-10, "order={}", order);
        }
    }
}
