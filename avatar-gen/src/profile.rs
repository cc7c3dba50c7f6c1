//! Anatomical cross-section profiles and ring sampling
//!
//! A profile describes one horizontal body cross-section as an ellipse with
//! anatomical asymmetry modifiers (flattened back, slightly flattened front,
//! lateral bulge). Sampling a profile yields a ring of 3D points in a single
//! height plane; the assembler stitches consecutive rings into a surface.

use crate::error::BuildError;
use glam::Vec3;
use std::f32::consts::TAU;

/// `|cos(angle)|` above which a point counts as lateral and receives bulge
const LATERAL_ZONE: f32 = 0.7;

/// Fraction of `front_flatten` actually applied to the anterior hemisphere
const FRONT_FLATTEN_RATIO: f32 = 0.3;

/// One ring of points sampled from a profile, all in one height plane
pub type Ring = Vec<Vec3>;

/// Asymmetry modifiers applied to an elliptical cross-section.
///
/// All fields are fractions in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Asymmetry {
    /// Flattens the anterior (+Z) hemisphere, attenuated by `FRONT_FLATTEN_RATIO`
    pub front_flatten: f32,
    /// Flattens the posterior (-Z) hemisphere
    pub back_flatten: f32,
    /// Widens the lateral extremes of the ring
    pub lateral_bulge: f32,
}

impl Asymmetry {
    /// A perfectly elliptical cross-section
    pub const NONE: Asymmetry = Asymmetry {
        front_flatten: 0.0,
        back_flatten: 0.0,
        lateral_bulge: 0.0,
    };

    /// Validated constructor; each fraction must lie in `[0, 1]`.
    pub fn new(front_flatten: f32, back_flatten: f32, lateral_bulge: f32) -> Result<Self, BuildError> {
        for (field, value) in [
            ("front_flatten", front_flatten),
            ("back_flatten", back_flatten),
            ("lateral_bulge", lateral_bulge),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(BuildError::InvalidProfile {
                    field,
                    constraint: "in [0, 1]",
                    value,
                });
            }
        }
        Ok(Self {
            front_flatten,
            back_flatten,
            lateral_bulge,
        })
    }
}

/// A validated anatomical cross-section definition.
///
/// Immutable once constructed; all parameters are checked by [`AnatomicalProfile::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnatomicalProfile {
    height_fraction: f32,
    radius_x: f32,
    radius_z: f32,
    point_count: usize,
    asymmetry: Asymmetry,
}

impl AnatomicalProfile {
    /// Validated constructor.
    ///
    /// `height_fraction` must lie in `[0, 1.2]` (the scalp apex of some body
    /// tables sits slightly above the nominal height), both radii must be
    /// positive, and `point_count` must be at least 3.
    pub fn new(
        height_fraction: f32,
        radius_x: f32,
        radius_z: f32,
        point_count: usize,
        asymmetry: Asymmetry,
    ) -> Result<Self, BuildError> {
        if !(0.0..=1.2).contains(&height_fraction) {
            return Err(BuildError::InvalidProfile {
                field: "height_fraction",
                constraint: "in [0, 1.2]",
                value: height_fraction,
            });
        }
        if radius_x <= 0.0 {
            return Err(BuildError::InvalidProfile {
                field: "radius_x",
                constraint: "positive",
                value: radius_x,
            });
        }
        if radius_z <= 0.0 {
            return Err(BuildError::InvalidProfile {
                field: "radius_z",
                constraint: "positive",
                value: radius_z,
            });
        }
        if point_count < 3 {
            return Err(BuildError::TooFewPoints(point_count));
        }
        Ok(Self {
            height_fraction,
            radius_x,
            radius_z,
            point_count,
            asymmetry,
        })
    }

    pub fn height_fraction(&self) -> f32 {
        self.height_fraction
    }

    pub fn radius_x(&self) -> f32 {
        self.radius_x
    }

    pub fn radius_z(&self) -> f32 {
        self.radius_z
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn asymmetry(&self) -> Asymmetry {
        self.asymmetry
    }
}

/// An ordered sequence of profiles with strictly increasing heights.
///
/// This is the validated input of one stitched body part (torso column,
/// one arm, ...). Adjacent profiles may declare different point counts;
/// the assembler reconciles them by proportional down-sampling.
#[derive(Debug, Clone)]
pub struct ProfileColumn {
    profiles: Vec<AnatomicalProfile>,
}

impl ProfileColumn {
    /// Validate ordering and length; at least 2 profiles are required.
    pub fn new(profiles: Vec<AnatomicalProfile>) -> Result<Self, BuildError> {
        if profiles.len() < 2 {
            return Err(BuildError::TooFewRings(profiles.len()));
        }
        for pair in profiles.windows(2) {
            if pair[1].height_fraction() <= pair[0].height_fraction() {
                return Err(BuildError::NonIncreasingHeight {
                    prev: pair[0].height_fraction(),
                    next: pair[1].height_fraction(),
                });
            }
        }
        Ok(Self { profiles })
    }

    pub fn profiles(&self) -> &[AnatomicalProfile] {
        &self.profiles
    }

    /// Sample every profile into a ring, bottom to top.
    pub fn sample(&self, total_height: f32) -> Vec<Ring> {
        self.profiles
            .iter()
            .map(|p| sample_ring(p, total_height))
            .collect()
    }
}

/// Sample one ring on the body midline.
pub fn sample_ring(profile: &AnatomicalProfile, total_height: f32) -> Ring {
    sample_ring_at(profile, total_height, 0.0)
}

/// Sample one ring centered at a lateral offset (used for limb columns).
///
/// Pure function of its inputs. Points are emitted in increasing angular
/// order starting at the +X axis.
pub fn sample_ring_at(profile: &AnatomicalProfile, total_height: f32, center_x: f32) -> Ring {
    let n = profile.point_count();
    let a = profile.asymmetry();
    let y = profile.height_fraction() * total_height;

    (0..n)
        .map(|i| {
            let angle = TAU * i as f32 / n as f32;
            let (sin, cos) = angle.sin_cos();
            let mut x = profile.radius_x() * cos;
            let mut z = profile.radius_z() * sin;

            if z < 0.0 {
                z *= 1.0 - a.back_flatten;
            }
            if z > 0.0 {
                z *= 1.0 - a.front_flatten * FRONT_FLATTEN_RATIO;
            }
            if cos.abs() > LATERAL_ZONE {
                x *= 1.0 + a.lateral_bulge;
            }

            Vec3::new(center_x + x, y, z)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(n: usize) -> AnatomicalProfile {
        AnatomicalProfile::new(0.5, 0.15, 0.10, n, Asymmetry::NONE).unwrap()
    }

    #[test]
    fn test_ring_point_count_and_plane() {
        let ring = sample_ring(&profile(32), 1.75);
        assert_eq!(ring.len(), 32);
        for p in &ring {
            assert!((p.y - 0.5 * 1.75).abs() < 1e-6);
        }
    }

    #[test]
    fn test_ring_radial_bound() {
        let p = AnatomicalProfile::new(
            0.3,
            0.2,
            0.1,
            48,
            Asymmetry::new(0.2, 0.3, 0.1).unwrap(),
        )
        .unwrap();
        let ring = sample_ring(&p, 1.75);
        let limit = p.radius_x() + p.radius_z();
        for pt in &ring {
            let r = (pt.x * pt.x + pt.z * pt.z).sqrt();
            assert!(r <= limit, "radial distance {r} exceeds {limit}");
        }
    }

    #[test]
    fn test_back_flatten_only_affects_posterior() {
        let sym = sample_ring(&profile(64), 1.0);
        let flat = AnatomicalProfile::new(
            0.5,
            0.15,
            0.10,
            64,
            Asymmetry::new(0.0, 0.5, 0.0).unwrap(),
        )
        .unwrap();
        let asym = sample_ring(&flat, 1.0);

        for (s, a) in sym.iter().zip(&asym) {
            if s.z < 0.0 {
                assert!((a.z - s.z * 0.5).abs() < 1e-6);
            } else {
                assert!((a.z - s.z).abs() < 1e-6);
            }
            assert!((a.x - s.x).abs() < 1e-6);
        }
    }

    #[test]
    fn test_lateral_bulge_widens_extremes() {
        let bulged = AnatomicalProfile::new(
            0.5,
            0.15,
            0.10,
            64,
            Asymmetry::new(0.0, 0.0, 0.2).unwrap(),
        )
        .unwrap();
        let ring = sample_ring(&bulged, 1.0);
        // Point 0 sits exactly on +X and must be widened by 20%.
        assert!((ring[0].x - 0.15 * 1.2).abs() < 1e-6);
    }

    #[test]
    fn test_offset_sampling_moves_center() {
        let ring = sample_ring_at(&profile(16), 1.0, 0.25);
        let mean_x: f32 = ring.iter().map(|p| p.x).sum::<f32>() / 16.0;
        assert!((mean_x - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_factory_rejects_bad_parameters() {
        assert!(AnatomicalProfile::new(0.5, 0.0, 0.1, 16, Asymmetry::NONE).is_err());
        assert!(AnatomicalProfile::new(0.5, 0.1, -0.1, 16, Asymmetry::NONE).is_err());
        assert!(AnatomicalProfile::new(1.5, 0.1, 0.1, 16, Asymmetry::NONE).is_err());
        assert!(AnatomicalProfile::new(0.5, 0.1, 0.1, 2, Asymmetry::NONE).is_err());
        assert!(Asymmetry::new(1.2, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_column_rejects_non_increasing_heights() {
        let a = AnatomicalProfile::new(0.2, 0.1, 0.1, 8, Asymmetry::NONE).unwrap();
        let b = AnatomicalProfile::new(0.2, 0.1, 0.1, 8, Asymmetry::NONE).unwrap();
        assert!(matches!(
            ProfileColumn::new(vec![a, b]),
            Err(BuildError::NonIncreasingHeight { .. })
        ));
        assert!(matches!(
            ProfileColumn::new(vec![a]),
            Err(BuildError::TooFewRings(1))
        ));
    }
}
