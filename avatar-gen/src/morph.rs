//! Morph target synthesis
//!
//! Displacement fields are pure functions of the final vertex positions and
//! the mesh height bounds. Four primary axes are computed from geometry;
//! three clinical composites are fixed linear blends of the primaries. The
//! set is built once and read thereafter; nothing here mutates the base
//! mesh.
//!
//! Target order is established here and threaded unchanged through export,
//! so consumers can rely on a stable index-to-name mapping.

use crate::error::BuildError;
use glam::Vec3;

/// Maximum radial displacement at full weight, in meters
pub const BASE_SCALE: f32 = 0.05;

/// Radial distance below which a vertex counts as on the midline
pub const MIDLINE_GUARD: f32 = 0.02;

/// Active band for the Weight field, as normalized height
pub const WEIGHT_BAND: (f32, f32) = (0.15, 0.92);
/// Sub-band of `WEIGHT_BAND` where the torso multiplier applies
pub const WEIGHT_TORSO_BAND: (f32, f32) = (0.5, 0.7);
/// Multiplier on `BASE_SCALE` inside the torso sub-band
pub const WEIGHT_TORSO_FACTOR: f32 = 1.5;

/// Active band for the AbdomenGirth field
pub const ABDOMEN_BAND: (f32, f32) = (0.5, 0.75);
/// Navel height for the abdominal Gaussian, as normalized height
pub const ABDOMEN_CENTER: f32 = 0.62;
/// Variance of the abdominal Gaussian
pub const ABDOMEN_SIGMA_SQ: f32 = 0.01;
/// Multiplier on `BASE_SCALE` for the abdominal push
pub const ABDOMEN_FACTOR: f32 = 1.5;
/// Forward depth at which the front factor saturates, in meters
pub const ABDOMEN_FRONT_REACH: f32 = 0.08;

/// Lateral |x| beyond which a vertex belongs to the arm zone, in meters
pub const MUSCLE_ARM_LATERAL_MIN: f32 = 0.18;
/// Multiplier on `BASE_SCALE` in the arm zone
pub const MUSCLE_ARM_FACTOR: f32 = 0.8;
/// Anterior chest band, as normalized height
pub const MUSCLE_CHEST_BAND: (f32, f32) = (0.75, 0.9);
/// Forward z beyond which a chest vertex counts as anterior, in meters
pub const MUSCLE_CHEST_FRONT_MIN: f32 = 0.02;
/// Multiplier on `BASE_SCALE` in the chest zone
pub const MUSCLE_CHEST_FACTOR: f32 = 0.6;
/// Leg band, as normalized height
pub const MUSCLE_LEG_BAND: (f32, f32) = (0.1, 0.45);
/// Center of the leg Gaussian, as normalized height
pub const MUSCLE_LEG_CENTER: f32 = 0.35;
/// Variance of the leg Gaussian
pub const MUSCLE_LEG_SIGMA_SQ: f32 = 0.02;
/// Multiplier on `BASE_SCALE` in the leg zone
pub const MUSCLE_LEG_FACTOR: f32 = 0.6;

/// Normalized height above which the Posture field is active
pub const POSTURE_THRESHOLD: f32 = 0.82;
/// Downward pull at the apex, in meters
pub const POSTURE_DROP: f32 = 0.07;
/// Forward lean at the apex, in meters
pub const POSTURE_LEAN: f32 = 0.08;

/// DiabetesEffect = `DIABETES_WEIGHT_COEFF`·Weight + `DIABETES_ABDOMEN_COEFF`·AbdomenGirth
pub const DIABETES_WEIGHT_COEFF: f32 = 0.5;
pub const DIABETES_ABDOMEN_COEFF: f32 = 0.8;
/// HypertensionEffect = `HYPERTENSION_WEIGHT_COEFF`·Weight + `HYPERTENSION_ABDOMEN_COEFF`·AbdomenGirth
pub const HYPERTENSION_WEIGHT_COEFF: f32 = 0.3;
pub const HYPERTENSION_ABDOMEN_COEFF: f32 = 0.4;
/// HeartDiseaseEffect = `HEART_WEIGHT_COEFF`·Weight + `HEART_POSTURE_COEFF`·Posture
pub const HEART_WEIGHT_COEFF: f32 = 0.2;
pub const HEART_POSTURE_COEFF: f32 = 0.5;

/// Canonical morph target order, fixed across synthesis and export
pub const MORPH_TARGET_NAMES: [&str; 7] = [
    "Weight",
    "AbdomenGirth",
    "MuscleMass",
    "Posture",
    "DiabetesEffect",
    "HypertensionEffect",
    "HeartDiseaseEffect",
];

/// A named per-vertex displacement field
#[derive(Debug, Clone)]
pub struct MorphTarget {
    name: &'static str,
    displacement: Vec<[f32; 3]>,
}

impl MorphTarget {
    /// Clinical name of this field
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Per-vertex displacement at full weight
    pub fn displacement(&self) -> &[[f32; 3]] {
        &self.displacement
    }
}

/// The complete ordered morph target set for one mesh
#[derive(Debug, Clone)]
pub struct MorphSet {
    targets: Vec<MorphTarget>,
}

impl MorphSet {
    /// Synthesize all seven fields from final vertex positions.
    ///
    /// Positions must be the post-repair, post-smoothing geometry; the set
    /// shares index correspondence with it from here on.
    pub fn synthesize(positions: &[[f32; 3]]) -> Result<Self, BuildError> {
        if positions.is_empty() {
            return Err(BuildError::EmptyMesh);
        }
        let (y_min, y_max) = y_bounds(positions);
        let span = (y_max - y_min).max(f32::EPSILON);
        let y_norm = |y: f32| (y - y_min) / span;

        let weight = synthesize_weight(positions, &y_norm);
        let abdomen = synthesize_abdomen(positions, &y_norm);
        let muscle = synthesize_muscle(positions, &y_norm);
        let posture = synthesize_posture(positions, &y_norm);

        let diabetes = blend(
            &weight,
            DIABETES_WEIGHT_COEFF,
            &abdomen,
            DIABETES_ABDOMEN_COEFF,
        );
        let hypertension = blend(
            &weight,
            HYPERTENSION_WEIGHT_COEFF,
            &abdomen,
            HYPERTENSION_ABDOMEN_COEFF,
        );
        let heart = blend(&weight, HEART_WEIGHT_COEFF, &posture, HEART_POSTURE_COEFF);

        let fields = [
            weight,
            abdomen,
            muscle,
            posture,
            diabetes,
            hypertension,
            heart,
        ];
        let targets = MORPH_TARGET_NAMES
            .iter()
            .zip(fields)
            .map(|(&name, displacement)| MorphTarget { name, displacement })
            .collect();

        Ok(Self { targets })
    }

    /// Targets in canonical order
    pub fn targets(&self) -> &[MorphTarget] {
        &self.targets
    }

    /// Target names in canonical order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.targets.iter().map(|t| t.name)
    }

    /// Number of targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Check index correspondence against a mesh vertex count.
    pub fn validate(&self, vertex_count: usize) -> Result<(), BuildError> {
        for t in &self.targets {
            if t.displacement.len() != vertex_count {
                return Err(BuildError::MorphLengthMismatch {
                    name: t.name.to_string(),
                    len: t.displacement.len(),
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Expand a sparse name-to-weight mapping into the canonical-order
    /// weight array used at export.
    pub fn weight_array(&self, weights: &[(&str, f32)]) -> Result<Vec<f32>, BuildError> {
        for &(name, _) in weights {
            if !self.targets.iter().any(|t| t.name == name) {
                return Err(BuildError::UnknownMorphTarget(name.to_string()));
            }
        }
        Ok(self
            .targets
            .iter()
            .map(|t| {
                weights
                    .iter()
                    .find(|(name, _)| *name == t.name)
                    .map_or(0.0, |&(_, w)| w)
            })
            .collect())
    }

    /// Bake a weight vector into positions, producing deformed geometry for
    /// a frozen (non-morphable) export. The inputs are left untouched.
    pub fn apply_weights(
        &self,
        positions: &[[f32; 3]],
        weights: &[(&str, f32)],
    ) -> Result<Vec<[f32; 3]>, BuildError> {
        self.validate(positions.len())?;
        let expanded = self.weight_array(weights)?;

        let mut out = positions.to_vec();
        for (target, w) in self.targets.iter().zip(expanded) {
            if w == 0.0 {
                continue;
            }
            for (p, d) in out.iter_mut().zip(&target.displacement) {
                p[0] += w * d[0];
                p[1] += w * d[1];
                p[2] += w * d[2];
            }
        }
        Ok(out)
    }
}

fn y_bounds(positions: &[[f32; 3]]) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for p in positions {
        min = min.min(p[1]);
        max = max.max(p[1]);
    }
    (min, max)
}

/// Radial direction from the vertical axis, or None inside the midline guard
fn radial_direction(p: &[f32; 3]) -> Option<Vec3> {
    let radial = Vec3::new(p[0], 0.0, p[2]);
    let dist = radial.length();
    if dist > MIDLINE_GUARD {
        Some(radial / dist)
    } else {
        None
    }
}

fn in_band(y_norm: f32, band: (f32, f32)) -> bool {
    y_norm > band.0 && y_norm < band.1
}

fn synthesize_weight(positions: &[[f32; 3]], y_norm: &impl Fn(f32) -> f32) -> Vec<[f32; 3]> {
    positions
        .iter()
        .map(|p| {
            let yn = y_norm(p[1]);
            if !in_band(yn, WEIGHT_BAND) {
                return [0.0; 3];
            }
            match radial_direction(p) {
                Some(dir) => {
                    let factor = if in_band(yn, WEIGHT_TORSO_BAND) {
                        WEIGHT_TORSO_FACTOR
                    } else {
                        1.0
                    };
                    let d = dir * BASE_SCALE * factor;
                    [d.x, d.y, d.z]
                }
                None => [0.0; 3],
            }
        })
        .collect()
}

fn synthesize_abdomen(positions: &[[f32; 3]], y_norm: &impl Fn(f32) -> f32) -> Vec<[f32; 3]> {
    positions
        .iter()
        .map(|p| {
            let yn = y_norm(p[1]);
            // Front-only: posterior vertices stay at zero.
            if !in_band(yn, ABDOMEN_BAND) || p[2] <= 0.0 {
                return [0.0; 3];
            }
            let y_factor = (-(yn - ABDOMEN_CENTER).powi(2) / ABDOMEN_SIGMA_SQ).exp();
            let front_factor = (p[2] / ABDOMEN_FRONT_REACH).min(1.0);
            [0.0, 0.0, BASE_SCALE * ABDOMEN_FACTOR * y_factor * front_factor]
        })
        .collect()
}

fn synthesize_muscle(positions: &[[f32; 3]], y_norm: &impl Fn(f32) -> f32) -> Vec<[f32; 3]> {
    positions
        .iter()
        .map(|p| {
            let yn = y_norm(p[1]);
            let Some(dir) = radial_direction(p) else {
                return [0.0; 3];
            };
            // Zones are disjoint by construction, first match wins.
            let magnitude = if p[0].abs() > MUSCLE_ARM_LATERAL_MIN {
                BASE_SCALE * MUSCLE_ARM_FACTOR
            } else if in_band(yn, MUSCLE_CHEST_BAND) && p[2] > MUSCLE_CHEST_FRONT_MIN {
                BASE_SCALE * MUSCLE_CHEST_FACTOR
            } else if in_band(yn, MUSCLE_LEG_BAND) {
                let falloff = (-(yn - MUSCLE_LEG_CENTER).powi(2) / MUSCLE_LEG_SIGMA_SQ).exp();
                BASE_SCALE * MUSCLE_LEG_FACTOR * falloff
            } else {
                return [0.0; 3];
            };
            let d = dir * magnitude;
            [d.x, d.y, d.z]
        })
        .collect()
}

fn synthesize_posture(positions: &[[f32; 3]], y_norm: &impl Fn(f32) -> f32) -> Vec<[f32; 3]> {
    positions
        .iter()
        .map(|p| {
            let yn = y_norm(p[1]);
            if yn <= POSTURE_THRESHOLD {
                return [0.0; 3];
            }
            let t = (yn - POSTURE_THRESHOLD) / (1.0 - POSTURE_THRESHOLD);
            let ease = t * t;
            [0.0, -POSTURE_DROP * ease, POSTURE_LEAN * ease]
        })
        .collect()
}

fn blend(a: &[[f32; 3]], ka: f32, b: &[[f32; 3]], kb: f32) -> Vec<[f32; 3]> {
    a.iter()
        .zip(b)
        .map(|(da, db)| {
            [
                ka * da[0] + kb * db[0],
                ka * da[1] + kb * db[1],
                ka * da[2] + kb * db[2],
            ]
        })
        .collect()
}
