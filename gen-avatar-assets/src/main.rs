//! gen-avatar-assets - clinical avatar batch generator
//!
//! Builds one parametric body per invocation and exports three GLB variants
//! from it (the geometry and morph synthesis run once):
//! - `avatar_morphable.glb` - all weights zero, for interactive UI control
//! - `avatar_baseline.glb` - a normative healthy weight set
//! - `avatar_clinical.glb` - the weight set of the selected condition
//!
//! plus `avatar_metadata.json` mapping weight-array indices to clinical
//! target names. With `--frozen`, the clinical weights are also baked into
//! a fourth, non-morphable container.

use anyhow::{Context, Result};
use avatar_gen::{build_avatar, Avatar, BodyType, PipelineConfig};
use avatar_glb::MorphableAsset;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const GENERATOR: &str = "gen-avatar-assets";

/// Healthy baseline weight set
const BASELINE_WEIGHTS: &[(&str, f32)] = &[("MuscleMass", 0.3)];

#[derive(Parser)]
#[command(name = "gen-avatar-assets")]
#[command(about = "Clinical avatar asset generator")]
#[command(version)]
struct Cli {
    /// Nominal body height in meters
    #[arg(long, default_value_t = 1.75)]
    height: f32,

    /// Body profile set
    #[arg(long, value_enum, default_value_t = BodyArg::Male)]
    body: BodyArg,

    /// Output directory for the containers and sidecar
    #[arg(short, long, default_value = "assets")]
    output: PathBuf,

    /// Condition encoded by the clinical variant
    #[arg(long, value_enum, default_value_t = Condition::Diabetes)]
    condition: Condition,

    /// Midpoint subdivision iterations
    #[arg(long, default_value_t = 1)]
    subdivide: u32,

    /// Laplacian smoothing iterations
    #[arg(long, default_value_t = 3)]
    smooth_iterations: u32,

    /// Also bake the clinical weights into a non-morphable container
    #[arg(long)]
    frozen: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BodyArg {
    Male,
    Female,
}

impl From<BodyArg> for BodyType {
    fn from(arg: BodyArg) -> Self {
        match arg {
            BodyArg::Male => BodyType::Male,
            BodyArg::Female => BodyType::Female,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Condition {
    Diabetes,
    Hypertension,
    HeartDisease,
}

impl Condition {
    /// Clinical weight preset for this condition
    fn weights(self) -> &'static [(&'static str, f32)] {
        match self {
            Condition::Diabetes => &[
                ("Weight", 0.6),
                ("AbdomenGirth", 0.7),
                ("DiabetesEffect", 0.5),
            ],
            Condition::Hypertension => &[
                ("Weight", 0.4),
                ("AbdomenGirth", 0.3),
                ("HypertensionEffect", 0.6),
            ],
            Condition::HeartDisease => &[
                ("Weight", 0.2),
                ("Posture", 0.5),
                ("HeartDiseaseEffect", 0.6),
            ],
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Metadata {
    morph_targets: Vec<TargetMeta>,
    vertex_count: usize,
    face_count: usize,
    height: f32,
    generator: &'static str,
}

#[derive(Serialize)]
struct TargetMeta {
    name: &'static str,
    index: usize,
    range: [f32; 2],
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    tracing::info!(
        "Building {:?} avatar, height {:.2}m",
        cli.body,
        cli.height
    );
    let avatar = build_avatar(&PipelineConfig {
        height: cli.height,
        body: cli.body.into(),
        subdivide: cli.subdivide,
        smooth_iterations: cli.smooth_iterations,
        ..Default::default()
    })?;
    tracing::info!(
        "Mesh: {} vertices, {} faces, {} morph targets",
        avatar.mesh.vertex_count(),
        avatar.mesh.triangle_count(),
        avatar.morphs.len()
    );

    fs::create_dir_all(&cli.output)
        .with_context(|| format!("creating output directory {:?}", cli.output))?;

    export_variant(&avatar, &[], &cli.output.join("avatar_morphable.glb"))?;
    export_variant(
        &avatar,
        BASELINE_WEIGHTS,
        &cli.output.join("avatar_baseline.glb"),
    )?;
    export_variant(
        &avatar,
        cli.condition.weights(),
        &cli.output.join("avatar_clinical.glb"),
    )?;
    if cli.frozen {
        export_frozen(
            &avatar,
            cli.condition.weights(),
            &cli.output.join("avatar_clinical_frozen.glb"),
        )?;
    }
    write_metadata(&avatar, &cli.output.join("avatar_metadata.json"))?;

    tracing::info!("Done!");
    Ok(())
}

/// Export one morphable container with the given initial weight set.
///
/// Geometry and morph buffers are identical across variants; only the
/// declared weight array changes.
fn export_variant(avatar: &Avatar, weights: &[(&str, f32)], path: &Path) -> Result<()> {
    let expanded = avatar.morphs.weight_array(weights)?;
    let targets: Vec<(&str, &[[f32; 3]])> = avatar
        .morphs
        .targets()
        .iter()
        .map(|t| (t.name(), t.displacement()))
        .collect();

    let bytes = MorphableAsset {
        name: "Avatar",
        positions: &avatar.mesh.positions,
        normals: &avatar.mesh.normals,
        indices: &avatar.mesh.indices,
        morph_targets: &targets,
        weights: &expanded,
        generator: GENERATOR,
    }
    .encode_glb()?;

    write_atomic(path, &bytes)?;
    tracing::info!("Wrote {:?} ({} bytes)", path, bytes.len());
    Ok(())
}

/// Export a non-morphable container with the weights baked into positions.
fn export_frozen(avatar: &Avatar, weights: &[(&str, f32)], path: &Path) -> Result<()> {
    let baked = avatar.morphs.apply_weights(&avatar.mesh.positions, weights)?;

    let bytes = MorphableAsset {
        name: "Avatar",
        positions: &baked,
        normals: &avatar.mesh.normals,
        indices: &avatar.mesh.indices,
        morph_targets: &[],
        weights: &[],
        generator: GENERATOR,
    }
    .encode_glb()?;

    write_atomic(path, &bytes)?;
    tracing::info!("Wrote {:?} ({} bytes)", path, bytes.len());
    Ok(())
}

fn write_metadata(avatar: &Avatar, path: &Path) -> Result<()> {
    let metadata = Metadata {
        morph_targets: avatar
            .morphs
            .names()
            .enumerate()
            .map(|(index, name)| TargetMeta {
                name,
                index,
                range: [0.0, 1.0],
            })
            .collect(),
        vertex_count: avatar.mesh.vertex_count(),
        face_count: avatar.mesh.triangle_count(),
        height: avatar.height,
        generator: GENERATOR,
    };
    let json = serde_json::to_string_pretty(&metadata)?;
    write_atomic(path, json.as_bytes())?;
    tracing::info!("Wrote {:?}", path);
    Ok(())
}

/// Write to a temporary sibling and rename into place, so a failed write
/// never leaves a truncated file at the target path.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("writing {tmp:?}"))?;
    fs::rename(&tmp, path).with_context(|| format!("renaming {tmp:?} to {path:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_avatar() -> Avatar {
        build_avatar(&PipelineConfig {
            subdivide: 0,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_condition_presets_use_known_targets() {
        let avatar = test_avatar();
        for condition in [
            Condition::Diabetes,
            Condition::Hypertension,
            Condition::HeartDisease,
        ] {
            let expanded = avatar.morphs.weight_array(condition.weights()).unwrap();
            assert_eq!(expanded.len(), avatar.morphs.len());
            assert!(expanded.iter().any(|&w| w > 0.0));
        }
    }

    #[test]
    fn test_variants_written_to_disk() {
        let avatar = test_avatar();
        let dir = tempfile::tempdir().unwrap();

        export_variant(&avatar, &[], &dir.path().join("avatar_morphable.glb")).unwrap();
        export_variant(
            &avatar,
            Condition::Diabetes.weights(),
            &dir.path().join("avatar_clinical.glb"),
        )
        .unwrap();
        export_frozen(
            &avatar,
            Condition::Diabetes.weights(),
            &dir.path().join("avatar_clinical_frozen.glb"),
        )
        .unwrap();
        write_metadata(&avatar, &dir.path().join("avatar_metadata.json")).unwrap();

        for name in [
            "avatar_morphable.glb",
            "avatar_clinical.glb",
            "avatar_clinical_frozen.glb",
            "avatar_metadata.json",
        ] {
            let data = fs::read(dir.path().join(name)).unwrap();
            assert!(!data.is_empty());
            // No temporary leftovers.
            assert!(!dir.path().join(name).with_extension("tmp").exists());
        }
    }

    #[test]
    fn test_clinical_container_read_back() {
        let avatar = test_avatar();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar_clinical.glb");
        export_variant(&avatar, Condition::Diabetes.weights(), &path).unwrap();

        let (doc, buffers, _) = gltf::import(&path).unwrap();
        let mesh = doc.meshes().next().unwrap();

        // Consumers map weight indices to names via the extras list.
        let extras: serde_json::Value =
            serde_json::from_str(mesh.extras().as_ref().unwrap().get()).unwrap();
        let names = extras["targetNames"].as_array().unwrap();
        assert_eq!(names.len(), 7);
        assert_eq!(names[0], "Weight");

        let weights = mesh.weights().unwrap();
        assert_eq!(weights.len(), 7);
        assert_eq!(weights[0], 0.6); // Weight
        assert_eq!(weights[1], 0.7); // AbdomenGirth
        assert_eq!(weights[4], 0.5); // DiabetesEffect

        let primitive = mesh.primitives().next().unwrap();
        let reader = primitive.reader(|b| Some(&buffers[b.index()].0[..]));
        let positions: Vec<[f32; 3]> = reader.read_positions().unwrap().collect();
        assert_eq!(positions, avatar.mesh.positions);
        assert_eq!(reader.read_morph_targets().count(), 7);
    }

    #[test]
    fn test_metadata_maps_indices_to_names() {
        let avatar = test_avatar();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avatar_metadata.json");
        write_metadata(&avatar, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        let targets = value["morphTargets"].as_array().unwrap();
        assert_eq!(targets.len(), 7);
        assert_eq!(targets[0]["name"], "Weight");
        assert_eq!(targets[0]["index"], 0);
        assert_eq!(targets[6]["name"], "HeartDiseaseEffect");
        assert_eq!(value["vertexCount"], avatar.mesh.vertex_count() as u64);
    }
}
