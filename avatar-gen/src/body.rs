//! Built-in anatomical tables and the pipeline entry point
//!
//! The torso column runs from the pelvis to the scalp apex in one stitched
//! tube; each leg is a separate column sampled sole to groin and each arm
//! hand to shoulder, both at per-side lateral offsets. Parts are
//! concatenated, repaired, optionally subdivided and smoothed, then handed
//! to morph synthesis.

use crate::assemble::{concatenate, stitch_column, CapEnds};
use crate::error::BuildError;
use crate::mesh::Mesh;
use crate::modifiers::{LaplacianSmooth, MeshApply, Subdivide};
use crate::morph::MorphSet;
use crate::profile::{sample_ring_at, AnatomicalProfile, Asymmetry, ProfileColumn, Ring};
use crate::repair;

/// Arm cross-sections are narrower front to back than their nominal radius
const ARM_RADIUS_SQUASH: f32 = 0.8;

/// Hip radii multiplier for the female body
const FEMALE_HIP_SCALE: f32 = 1.08;
/// Shoulder radii multiplier for the female body
const FEMALE_SHOULDER_SCALE: f32 = 0.92;
/// Height band treated as hip for the female adjustment
const HIP_BAND: (f32, f32) = (0.49, 0.55);
/// Height band treated as shoulder for the female adjustment
const SHOULDER_BAND: (f32, f32) = (0.83, 0.89);

/// Torso cross-sections, pelvis to scalp apex.
///
/// Columns: height fraction, x radius, z radius, point count,
/// front flatten, back flatten, lateral bulge.
#[rustfmt::skip]
const TORSO_TABLE: &[(f32, f32, f32, usize, f32, f32, f32)] = &[
    // pelvis, wide enough to receive both leg tops
    (0.470, 0.150, 0.092, 40, 0.0,  0.1,  0.1),
    // hips
    (0.500, 0.145, 0.095, 40, 0.0,  0.15, 0.05),
    (0.520, 0.155, 0.100, 40, 0.0,  0.15, 0.05),
    (0.540, 0.160, 0.105, 40, 0.0,  0.15, 0.05),
    // lower abdomen
    (0.560, 0.155, 0.100, 40, 0.0,  0.2,  0.0),
    (0.580, 0.148, 0.095, 40, 0.0,  0.2,  0.0),
    (0.600, 0.142, 0.092, 40, 0.0,  0.25, 0.0),
    // waist
    (0.620, 0.135, 0.088, 40, 0.0,  0.25, 0.0),
    (0.640, 0.130, 0.085, 40, 0.0,  0.25, 0.0),
    (0.660, 0.132, 0.087, 40, 0.0,  0.25, 0.0),
    // ribcage
    (0.680, 0.138, 0.090, 40, 0.0,  0.2,  0.0),
    (0.700, 0.148, 0.095, 40, 0.0,  0.2,  0.0),
    (0.720, 0.158, 0.100, 40, 0.0,  0.18, 0.0),
    (0.740, 0.168, 0.105, 40, 0.0,  0.15, 0.0),
    // chest
    (0.760, 0.175, 0.108, 40, 0.0,  0.12, 0.0),
    (0.780, 0.180, 0.112, 40, 0.0,  0.1,  0.0),
    (0.800, 0.182, 0.115, 40, 0.0,  0.08, 0.0),
    (0.820, 0.178, 0.110, 40, 0.0,  0.1,  0.0),
    // shoulders
    (0.840, 0.170, 0.100, 40, 0.0,  0.12, 0.0),
    (0.855, 0.190, 0.090, 40, 0.0,  0.15, 0.0),
    (0.870, 0.195, 0.085, 40, 0.0,  0.18, 0.0),
    (0.880, 0.165, 0.078, 36, 0.0,  0.2,  0.0),
    // neck
    (0.895, 0.065, 0.065, 28, 0.0,  0.1,  0.0),
    (0.910, 0.058, 0.058, 28, 0.0,  0.1,  0.0),
    (0.925, 0.052, 0.052, 28, 0.0,  0.1,  0.0),
    (0.940, 0.048, 0.050, 28, 0.0,  0.1,  0.0),
    // head
    (0.950, 0.055, 0.060, 32, 0.1,  0.0,  0.0),
    (0.965, 0.068, 0.075, 32, 0.1,  0.0,  0.0),
    (0.980, 0.072, 0.082, 32, 0.08, 0.0,  0.0),
    (1.000, 0.075, 0.088, 32, 0.05, 0.0,  0.0),
    (1.020, 0.074, 0.085, 32, 0.0,  0.0,  0.0),
    (1.045, 0.072, 0.082, 32, 0.0,  0.0,  0.0),
    (1.070, 0.065, 0.072, 28, 0.0,  0.0,  0.0),
    (1.090, 0.045, 0.050, 20, 0.0,  0.0,  0.0),
    (1.100, 0.020, 0.022, 12, 0.0,  0.0,  0.0),
];

/// Arm cross-sections, fingertips to shoulder.
///
/// Columns: lateral center offset, height fraction, x radius, z radius,
/// point count.
#[rustfmt::skip]
const ARM_TABLE: &[(f32, f32, f32, f32, usize)] = &[
    (0.283, 0.450, 0.020, 0.010, 12),
    (0.282, 0.470, 0.024, 0.012, 14),
    (0.280, 0.500, 0.022, 0.020, 16),
    (0.278, 0.550, 0.026, 0.023, 18),
    (0.275, 0.600, 0.028, 0.025, 18),
    (0.270, 0.650, 0.030, 0.028, 18),
    (0.265, 0.700, 0.034, 0.032, 20),
    (0.255, 0.750, 0.036, 0.034, 20),
    (0.240, 0.800, 0.038, 0.036, 20),
    (0.220, 0.840, 0.040, 0.038, 20),
    (0.195, 0.870, 0.045, 0.040, 20),
];

/// Leg cross-sections, sole to groin, one column per side.
///
/// Columns: lateral center offset, height fraction, x radius, z radius,
/// point count, back flatten.
#[rustfmt::skip]
const LEG_TABLE: &[(f32, f32, f32, f32, usize, f32)] = &[
    // foot
    (0.080, 0.000, 0.045, 0.110, 20, 0.0),
    (0.080, 0.008, 0.042, 0.100, 20, 0.0),
    (0.080, 0.020, 0.038, 0.060, 20, 0.0),
    // ankle and calf
    (0.080, 0.040, 0.040, 0.045, 24, 0.1),
    (0.080, 0.080, 0.042, 0.048, 24, 0.1),
    (0.080, 0.120, 0.044, 0.052, 24, 0.1),
    (0.080, 0.160, 0.046, 0.056, 24, 0.1),
    (0.080, 0.200, 0.044, 0.052, 24, 0.1),
    // knee
    (0.080, 0.240, 0.048, 0.055, 24, 0.15),
    (0.080, 0.260, 0.052, 0.058, 24, 0.2),
    (0.080, 0.280, 0.050, 0.056, 24, 0.15),
    // thigh, tapering into the groin
    (0.080, 0.320, 0.058, 0.062, 24, 0.1),
    (0.081, 0.360, 0.064, 0.068, 24, 0.1),
    (0.082, 0.400, 0.070, 0.074, 24, 0.1),
    (0.083, 0.440, 0.072, 0.076, 24, 0.1),
    (0.084, 0.470, 0.066, 0.070, 24, 0.1),
];

/// Body type selecting the profile constant set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyType {
    #[default]
    Male,
    Female,
}

/// Full pipeline configuration
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Nominal body height in meters (soles to face, the scalp apex sits
    /// slightly above)
    pub height: f32,
    /// Profile constant set
    pub body: BodyType,
    /// Midpoint subdivision iterations applied after repair
    pub subdivide: u32,
    /// Laplacian smoothing iterations
    pub smooth_iterations: u32,
    /// Laplacian pull strength
    pub smooth_lambda: f32,
    /// Vertex weld tolerance used by the repair pass
    pub weld_epsilon: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            height: 1.75,
            body: BodyType::Male,
            subdivide: 1,
            smooth_iterations: 3,
            smooth_lambda: 0.5,
            weld_epsilon: repair::WELD_EPSILON,
        }
    }
}

/// One fully built avatar: final geometry plus its morph target set
#[derive(Debug, Clone)]
pub struct Avatar {
    /// Repaired, smoothed, recentered surface mesh
    pub mesh: Mesh,
    /// Morph targets synthesized from the final vertex positions
    pub morphs: MorphSet,
    /// Nominal height the body was built for, in meters
    pub height: f32,
}

/// Build one avatar from profile tables through morph synthesis.
///
/// Runs the whole pipeline sequentially: sample and stitch the torso, both
/// legs and both arms, concatenate, repair, subdivide, smooth, recenter,
/// then synthesize the morph set from the final positions.
pub fn build_avatar(config: &PipelineConfig) -> Result<Avatar, BuildError> {
    if config.height <= 0.0 {
        return Err(BuildError::InvalidProfile {
            field: "height",
            constraint: "positive",
            value: config.height,
        });
    }

    let torso = torso_column(config.body)?;
    let torso_mesh = stitch_column(&torso.sample(config.height), CapEnds::BOTH)?;
    let left_leg = stitch_column(&leg_rings(config.height, -1.0)?, CapEnds::BOTTOM)?;
    let right_leg = stitch_column(&leg_rings(config.height, 1.0)?, CapEnds::BOTTOM)?;
    let left_arm = stitch_column(&arm_rings(config.height, -1.0)?, CapEnds::BOTTOM)?;
    let right_arm = stitch_column(&arm_rings(config.height, 1.0)?, CapEnds::BOTTOM)?;

    let mut mesh = concatenate(&[torso_mesh, left_leg, right_leg, left_arm, right_arm]);
    repair::repair(&mut mesh, config.weld_epsilon)?;

    mesh.apply(Subdivide {
        iterations: config.subdivide,
    })
    .apply(LaplacianSmooth {
        iterations: config.smooth_iterations,
        lambda: config.smooth_lambda,
    });
    mesh.recenter();
    repair::recompute_normals(&mut mesh)?;

    let morphs = MorphSet::synthesize(&mesh.positions)?;
    morphs.validate(mesh.vertex_count())?;

    Ok(Avatar {
        mesh,
        morphs,
        height: config.height,
    })
}

/// Torso profiles for a body type, with the female hip/shoulder adjustment.
fn torso_column(body: BodyType) -> Result<ProfileColumn, BuildError> {
    let profiles = TORSO_TABLE
        .iter()
        .map(|&(h, rx, rz, n, front, back, bulge)| {
            let scale = match body {
                BodyType::Male => 1.0,
                BodyType::Female => {
                    if h > HIP_BAND.0 && h < HIP_BAND.1 {
                        FEMALE_HIP_SCALE
                    } else if h > SHOULDER_BAND.0 && h < SHOULDER_BAND.1 {
                        FEMALE_SHOULDER_SCALE
                    } else {
                        1.0
                    }
                }
            };
            let asymmetry = Asymmetry::new(front, back, bulge)?;
            AnatomicalProfile::new(h, rx * scale, rz * scale, n, asymmetry)
        })
        .collect::<Result<Vec<_>, _>>()?;
    ProfileColumn::new(profiles)
}

/// Arm rings for one side, hand to shoulder. `side` is -1.0 or 1.0.
fn arm_rings(total_height: f32, side: f32) -> Result<Vec<Ring>, BuildError> {
    ARM_TABLE
        .iter()
        .map(|&(offset, h, rx, rz, n)| {
            let profile =
                AnatomicalProfile::new(h, rx, rz * ARM_RADIUS_SQUASH, n, Asymmetry::NONE)?;
            Ok(sample_ring_at(&profile, total_height, side * offset))
        })
        .collect()
}

/// Leg rings for one side, sole to groin. `side` is -1.0 or 1.0.
fn leg_rings(total_height: f32, side: f32) -> Result<Vec<Ring>, BuildError> {
    LEG_TABLE
        .iter()
        .map(|&(offset, h, rx, rz, n, back)| {
            let asymmetry = Asymmetry::new(0.0, back, 0.0)?;
            let profile = AnatomicalProfile::new(h, rx, rz, n, asymmetry)?;
            Ok(sample_ring_at(&profile, total_height, side * offset))
        })
        .collect()
}
