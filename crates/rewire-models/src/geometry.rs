// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Pairwise geometric feature builders.

All builders take the (already position-mapped) soma positions of the
source candidates plus a single target position, and return one feature
vector entry per candidate. The feature set a probability model consumes
is fixed by its family; see `ConnProbModel`.
*/

use ndarray::Array1;

/// Euclidean source-to-target distances, one entry per source
pub fn distances(src_pos: &[[f64; 3]], tgt_pos: [f64; 3]) -> Array1<f64> {
    Array1::from(
        src_pos
            .iter()
            .map(|s| {
                let dx = tgt_pos[0] - s[0];
                let dy = tgt_pos[1] - s[1];
                let dz = tgt_pos[2] - s[2];
                (dx * dx + dy * dy + dz * dz).sqrt()
            })
            .collect::<Vec<_>>(),
    )
}

/// Bipolar (signed z-axis) offsets: +1 when the target lies above the
/// source along z, -1 below, 0 at equal height
pub fn bipolar_offsets(src_pos: &[[f64; 3]], tgt_pos: [f64; 3]) -> Array1<f64> {
    Array1::from(
        src_pos
            .iter()
            .map(|s| {
                let dz = tgt_pos[2] - s[2];
                if dz == 0.0 {
                    0.0
                } else {
                    dz.signum()
                }
            })
            .collect::<Vec<_>>(),
    )
}

/// Per-axis target-minus-source offsets (dx, dy, dz)
pub fn axis_offsets(src_pos: &[[f64; 3]], tgt_pos: [f64; 3]) -> [Array1<f64>; 3] {
    let mut dx = Vec::with_capacity(src_pos.len());
    let mut dy = Vec::with_capacity(src_pos.len());
    let mut dz = Vec::with_capacity(src_pos.len());
    for s in src_pos {
        dx.push(tgt_pos[0] - s[0]);
        dy.push(tgt_pos[1] - s[1]);
        dz.push(tgt_pos[2] - s[2]);
    }
    [Array1::from(dx), Array1::from(dy), Array1::from(dz)]
}

/// Absolute per-axis source positions (x, y, z)
pub fn axis_positions(src_pos: &[[f64; 3]]) -> [Array1<f64>; 3] {
    let mut x = Vec::with_capacity(src_pos.len());
    let mut y = Vec::with_capacity(src_pos.len());
    let mut z = Vec::with_capacity(src_pos.len());
    for s in src_pos {
        x.push(s[0]);
        y.push(s[1]);
        z.push(s[2]);
    }
    [Array1::from(x), Array1::from(y), Array1::from(z)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_and_offsets() {
        let src = vec![[0.0, 0.0, 0.0], [3.0, 4.0, 0.0]];
        let tgt = [0.0, 0.0, 0.0];

        let d = distances(&src, tgt);
        assert_eq!(d[0], 0.0);
        assert_eq!(d[1], 5.0);

        let [dx, dy, dz] = axis_offsets(&src, tgt);
        assert_eq!(dx[1], -3.0);
        assert_eq!(dy[1], -4.0);
        assert_eq!(dz[1], 0.0);
    }

    #[test]
    fn bipolar_sign() {
        let src = vec![[0.0, 0.0, -1.0], [0.0, 0.0, 2.0], [0.0, 0.0, 0.0]];
        let bip = bipolar_offsets(&src, [0.0, 0.0, 0.0]);
        assert_eq!(bip[0], 1.0);
        assert_eq!(bip[1], -1.0);
        assert_eq!(bip[2], 0.0);
    }
}
