// Deterministic 3D gradient noise.
//
// `NoiseField` is the seam every placement decision goes through: site
// classification, island heights, house/tree scoring and the kelp field all
// sample a field through this trait and apply their own scale and offset at
// the call site (those constants live in `config.rs`, not here).
//
// `SimplexNoise` is the stock field: the Ashima/McEwan 3D simplex kernel
// (permutation polynomial `(34x + 1)x mod 289`, 7x7 gradient ring,
// radial falloff `max(0.6 - r^2, 0)^4`), evaluated entirely in `f64`. It has
// no seed and no state; the same coordinates give the same value on every
// platform. Output is continuous and lies in [-1, 1].
//
// Any `Fn([f64; 3]) -> f64 + Send + Sync` is also a field, which keeps tests
// free to pin decisions with a hand-written surface.
//
// See also: `city.rs` and `reef.rs` for the call sites.
//
// **Critical constraint: determinism.** No lookup tables seeded at runtime,
// no SIMD, no fused multiply-add: the kernel is plain scalar arithmetic.

/// A pure, thread-safe scalar field over 3D space.
pub trait NoiseField: Send + Sync {
    fn sample(&self, p: [f64; 3]) -> f64;
}

impl<F> NoiseField for F
where
    F: Fn([f64; 3]) -> f64 + Send + Sync,
{
    fn sample(&self, p: [f64; 3]) -> f64 {
        self(p)
    }
}

/// Stateless 3D simplex noise.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimplexNoise;

impl NoiseField for SimplexNoise {
    fn sample(&self, p: [f64; 3]) -> f64 {
        simplex3(p)
    }
}

// ---------------------------------------------------------------------------
// Kernel
// ---------------------------------------------------------------------------

const SKEW: f64 = 1.0 / 3.0;
const UNSKEW: f64 = 1.0 / 6.0;

fn mod289(x: f64) -> f64 {
    x - (x / 289.0).floor() * 289.0
}

fn permute(x: f64) -> f64 {
    mod289((x * 34.0 + 1.0) * x)
}

fn taylor_inv_sqrt(r: f64) -> f64 {
    1.792_842_914_001_59 - 0.853_734_720_953_14 * r
}

fn dot3(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// `step(edge, x)`: 1 when `x >= edge`.
fn step(edge: f64, x: f64) -> f64 {
    if x >= edge { 1.0 } else { 0.0 }
}

/// 3D simplex noise at `v`, in [-1, 1].
pub fn simplex3(v: [f64; 3]) -> f64 {
    // First corner of the containing simplex.
    let s = (v[0] + v[1] + v[2]) * SKEW;
    let i = [
        (v[0] + s).floor(),
        (v[1] + s).floor(),
        (v[2] + s).floor(),
    ];
    let t = (i[0] + i[1] + i[2]) * UNSKEW;
    let x0 = [v[0] - i[0] + t, v[1] - i[1] + t, v[2] - i[2] + t];

    // Remaining corners, picked by ranking the offset components.
    let g = [step(x0[1], x0[0]), step(x0[2], x0[1]), step(x0[0], x0[2])];
    let l = [1.0 - g[0], 1.0 - g[1], 1.0 - g[2]];
    let i1 = [g[0].min(l[2]), g[1].min(l[0]), g[2].min(l[1])];
    let i2 = [g[0].max(l[2]), g[1].max(l[0]), g[2].max(l[1])];

    let corners: [[f64; 3]; 4] = [
        x0,
        [
            x0[0] - i1[0] + UNSKEW,
            x0[1] - i1[1] + UNSKEW,
            x0[2] - i1[2] + UNSKEW,
        ],
        [
            x0[0] - i2[0] + SKEW,
            x0[1] - i2[1] + SKEW,
            x0[2] - i2[2] + SKEW,
        ],
        [x0[0] - 0.5, x0[1] - 0.5, x0[2] - 0.5],
    ];
    let offsets: [[f64; 3]; 4] = [[0.0; 3], i1, i2, [1.0; 3]];

    let cell = [mod289(i[0]), mod289(i[1]), mod289(i[2])];

    // Gradient ring: 7x7 points on an octahedron, indexed by the hash.
    let ns = [2.0 / 7.0, 0.5 / 7.0 - 1.0, 1.0 / 7.0];

    let mut total = 0.0;
    for (corner, offset) in corners.iter().zip(offsets.iter()) {
        let hash = permute(
            permute(permute(cell[2] + offset[2]) + cell[1] + offset[1]) + cell[0] + offset[0],
        );

        let j = hash - 49.0 * (hash * ns[2] * ns[2]).floor();
        let gx_ = (j * ns[2]).floor();
        let gy_ = (j - 7.0 * gx_).floor();
        let gx = gx_ * ns[0] + ns[1];
        let gy = gy_ * ns[0] + ns[1];
        let h = 1.0 - gx.abs() - gy.abs();

        let sh = -step(h, 0.0);
        let grad = [
            gx + ((gx.floor() * 2.0) + 1.0) * sh,
            gy + ((gy.floor() * 2.0) + 1.0) * sh,
            h,
        ];
        let norm = taylor_inv_sqrt(dot3(grad, grad));
        let grad = [grad[0] * norm, grad[1] * norm, grad[2] * norm];

        let m = (0.6 - dot3(*corner, *corner)).max(0.0);
        let m2 = m * m;
        total += m2 * m2 * dot3(grad, *corner);
    }

    42.0 * total
}

#[cfg(test)]
mod tests {
    use super::*;
    use archipelago_prng::GenRng;

    #[test]
    fn same_point_same_value() {
        let p = [1.25, -3.5, 7.75];
        assert_eq!(simplex3(p).to_bits(), simplex3(p).to_bits());
        assert_eq!(SimplexNoise.sample(p).to_bits(), simplex3(p).to_bits());
    }

    #[test]
    fn lattice_origin_is_zero() {
        // Every corner offset at an integer lattice point is either zero or
        // outside the falloff radius.
        assert_eq!(simplex3([0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn output_stays_in_unit_range() {
        let mut rng = GenRng::new(11);
        let mut lo = f64::MAX;
        let mut hi = f64::MIN;
        for _ in 0..20_000 {
            let p = [
                rng.next_f64() * 200.0 - 100.0,
                rng.next_f64() * 200.0 - 100.0,
                rng.next_f64() * 200.0 - 100.0,
            ];
            let n = simplex3(p);
            assert!(n.is_finite());
            assert!(n.abs() <= 1.05, "noise {n} at {p:?}");
            lo = lo.min(n);
            hi = hi.max(n);
        }
        // The field actually spans both signs.
        assert!(lo < -0.5 && hi > 0.5, "range [{lo}, {hi}]");
    }

    #[test]
    fn field_is_continuous() {
        let mut rng = GenRng::new(23);
        for _ in 0..2_000 {
            let p = [
                rng.next_f64() * 50.0,
                rng.next_f64() * 50.0,
                rng.next_f64() * 50.0,
            ];
            let q = [p[0] + 1e-4, p[1] - 1e-4, p[2] + 1e-4];
            assert!((simplex3(p) - simplex3(q)).abs() < 1e-2);
        }
    }

    #[test]
    fn closures_are_fields() {
        let flat = |_: [f64; 3]| 0.25;
        assert_eq!(flat.sample([9.0, 9.0, 9.0]), 0.25);
    }
}
