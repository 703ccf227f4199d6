// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Connection probability models.

A model is one of five families ("orders"), each with a fixed input arity:

| order | family            | inputs                                  |
|-------|-------------------|-----------------------------------------|
| 1     | Constant          | none                                    |
| 2     | Distance          | distance                                |
| 3     | BipolarDistance   | distance, bipolar z offset              |
| 4     | Offset            | dx, dy, dz offsets                      |
| 5     | Position          | x, y, z positions + dx, dy, dz offsets  |

The caller builds exactly the feature set the loaded family declares and
passes it as the matching `ModelInputs` variant; any other combination is
an input-contract error. Evaluation returns raw per-candidate values; the
rewiring core owns NaN zeroing, clamping and autapse exclusion.

Model files are JSON documents tagged with the family name, e.g.

```json
{ "family": "distance", "scale": 0.1, "exponent": 0.008 }
```
*/

use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Feature vectors for one target neuron against N source candidates.
///
/// The variant must match the loaded model family; see module docs.
#[derive(Debug, Clone)]
pub enum ModelInputs {
    /// No geometric inputs; `count` fixes the output length
    Constant { count: usize },
    Distance {
        dist: Array1<f64>,
    },
    DistanceBipolar {
        dist: Array1<f64>,
        bipolar: Array1<f64>,
    },
    Offsets {
        dx: Array1<f64>,
        dy: Array1<f64>,
        dz: Array1<f64>,
    },
    PositionsAndOffsets {
        x: Array1<f64>,
        y: Array1<f64>,
        z: Array1<f64>,
        dx: Array1<f64>,
        dy: Array1<f64>,
        dz: Array1<f64>,
    },
}

impl ModelInputs {
    /// Number of geometric feature vectors carried by this variant
    pub fn arity(&self) -> usize {
        match self {
            ModelInputs::Constant { .. } => 0,
            ModelInputs::Distance { .. } => 1,
            ModelInputs::DistanceBipolar { .. } => 2,
            ModelInputs::Offsets { .. } => 3,
            ModelInputs::PositionsAndOffsets { .. } => 6,
        }
    }
}

/// Connection probability model, tagged by family
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ConnProbModel {
    /// Order 1: constant probability, no geometric inputs
    Constant { p: f64 },
    /// Order 2: exponential distance decay, p(d) = scale * exp(-exponent * d)
    Distance { scale: f64, exponent: f64 },
    /// Order 3: distance decay with separate parameters for targets above
    /// (bipolar >= 0) and below (bipolar < 0) the source along z
    BipolarDistance {
        scale_above: f64,
        exponent_above: f64,
        scale_below: f64,
        exponent_below: f64,
    },
    /// Order 4: anisotropic exponential decay over per-axis offsets,
    /// p = scale * exp(-(|dx|*ex + |dy|*ey + |dz|*ez))
    Offset {
        scale: f64,
        exponent_x: f64,
        exponent_y: f64,
        exponent_z: f64,
    },
    /// Order 5: position-modulated offset decay; the base amplitude varies
    /// linearly with the source z position, then decays with offset norm
    Position {
        base: f64,
        z_slope: f64,
        exponent: f64,
    },
}

impl ConnProbModel {
    /// Model order (1-5), matching the declared input arity
    pub fn order(&self) -> u8 {
        match self {
            ConnProbModel::Constant { .. } => 1,
            ConnProbModel::Distance { .. } => 2,
            ConnProbModel::BipolarDistance { .. } => 3,
            ConnProbModel::Offset { .. } => 4,
            ConnProbModel::Position { .. } => 5,
        }
    }

    /// Number of geometric feature vectors this model consumes
    pub fn input_arity(&self) -> usize {
        match self {
            ConnProbModel::Constant { .. } => 0,
            ConnProbModel::Distance { .. } => 1,
            ConnProbModel::BipolarDistance { .. } => 2,
            ConnProbModel::Offset { .. } => 3,
            ConnProbModel::Position { .. } => 6,
        }
    }

    /// Load a model from a JSON file, validating the family tag and
    /// parameter ranges
    pub fn from_file(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ModelError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path).map_err(|e| ModelError::InvalidModelFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let model: ConnProbModel =
            serde_json::from_str(&content).map_err(|e| ModelError::InvalidModelFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        model.validate()?;
        Ok(model)
    }

    /// Parameter range validation; every scale/probability must be
    /// non-negative and `Constant::p` must lie in [0, 1]
    pub fn validate(&self) -> ModelResult<()> {
        let check = |name: &str, v: f64| {
            if v.is_finite() && v >= 0.0 {
                Ok(())
            } else {
                Err(ModelError::InvalidParameters(format!(
                    "{name} must be finite and non-negative, got {v}"
                )))
            }
        };
        match *self {
            ConnProbModel::Constant { p } => {
                check("p", p)?;
                if p > 1.0 {
                    return Err(ModelError::InvalidParameters(format!(
                        "p must be <= 1.0, got {p}"
                    )));
                }
            }
            ConnProbModel::Distance { scale, exponent } => {
                check("scale", scale)?;
                check("exponent", exponent)?;
            }
            ConnProbModel::BipolarDistance {
                scale_above,
                exponent_above,
                scale_below,
                exponent_below,
            } => {
                check("scale_above", scale_above)?;
                check("exponent_above", exponent_above)?;
                check("scale_below", scale_below)?;
                check("exponent_below", exponent_below)?;
            }
            ConnProbModel::Offset {
                scale,
                exponent_x,
                exponent_y,
                exponent_z,
            } => {
                check("scale", scale)?;
                check("exponent_x", exponent_x)?;
                check("exponent_y", exponent_y)?;
                check("exponent_z", exponent_z)?;
            }
            ConnProbModel::Position {
                base,
                z_slope,
                exponent,
            } => {
                check("base", base)?;
                check("exponent", exponent)?;
                if !z_slope.is_finite() {
                    return Err(ModelError::InvalidParameters(format!(
                        "z_slope must be finite, got {z_slope}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Evaluate the model over the given feature vectors.
    ///
    /// The inputs variant must match the model family; returns raw
    /// per-candidate values (no clamping, no NaN handling).
    pub fn evaluate(&self, inputs: &ModelInputs) -> ModelResult<Array1<f64>> {
        match (self, inputs) {
            (ConnProbModel::Constant { p }, ModelInputs::Constant { count }) => {
                Ok(Array1::from_elem(*count, *p))
            }
            (ConnProbModel::Distance { scale, exponent }, ModelInputs::Distance { dist }) => {
                Ok(dist.mapv(|d| scale * (-exponent * d).exp()))
            }
            (
                ConnProbModel::BipolarDistance {
                    scale_above,
                    exponent_above,
                    scale_below,
                    exponent_below,
                },
                ModelInputs::DistanceBipolar { dist, bipolar },
            ) => {
                if dist.len() != bipolar.len() {
                    return Err(ModelError::ShapeMismatch(format!(
                        "distance has {} entries, bipolar has {}",
                        dist.len(),
                        bipolar.len()
                    )));
                }
                let mut out = Array1::zeros(dist.len());
                for (i, (&d, &b)) in dist.iter().zip(bipolar.iter()).enumerate() {
                    out[i] = if b >= 0.0 {
                        scale_above * (-exponent_above * d).exp()
                    } else {
                        scale_below * (-exponent_below * d).exp()
                    };
                }
                Ok(out)
            }
            (
                ConnProbModel::Offset {
                    scale,
                    exponent_x,
                    exponent_y,
                    exponent_z,
                },
                ModelInputs::Offsets { dx, dy, dz },
            ) => {
                if dx.len() != dy.len() || dy.len() != dz.len() {
                    return Err(ModelError::ShapeMismatch(format!(
                        "offset vectors have lengths {}, {}, {}",
                        dx.len(),
                        dy.len(),
                        dz.len()
                    )));
                }
                let mut out = Array1::zeros(dx.len());
                for i in 0..dx.len() {
                    let decay =
                        dx[i].abs() * exponent_x + dy[i].abs() * exponent_y + dz[i].abs() * exponent_z;
                    out[i] = scale * (-decay).exp();
                }
                Ok(out)
            }
            (
                ConnProbModel::Position {
                    base,
                    z_slope,
                    exponent,
                },
                ModelInputs::PositionsAndOffsets {
                    x,
                    y,
                    z,
                    dx,
                    dy,
                    dz,
                },
            ) => {
                let n = x.len();
                if [y.len(), z.len(), dx.len(), dy.len(), dz.len()]
                    .iter()
                    .any(|&l| l != n)
                {
                    return Err(ModelError::ShapeMismatch(
                        "position/offset vectors must all have the same length".to_string(),
                    ));
                }
                let mut out = Array1::zeros(n);
                for i in 0..n {
                    let amplitude = base + z_slope * z[i];
                    let norm =
                        (dx[i] * dx[i] + dy[i] * dy[i] + dz[i] * dz[i]).sqrt();
                    out[i] = amplitude * (-exponent * norm).exp();
                }
                Ok(out)
            }
            (model, inputs) => Err(ModelError::InputMismatch {
                order: model.order(),
                expected: model.input_arity(),
                got: inputs.arity(),
            }),
        }
    }
}
