//! Data Export Module
//!
//! Writes the accumulated training examples as NumPy arrays for ML training.
//!
//! # Files
//!
//! For a configuration with file stem `{stem}` (see [`DatasetConfig::file_stem`]):
//!
//! | File | Content |
//! |------|---------|
//! | `X_{stem}.npy` | `[N_examples, H × 3]` float64 features |
//! | `y_{stem}.npy` | `[N_examples]` int64 labels, or `[N_examples, 3]` float64 targets |
//! | `{stem}_metadata.json` | variant, configuration, shapes, counts, timestamp |
//!
//! Both arrays are written to temporary names first and renamed only after
//! both writes succeeded, so a failed run never leaves an `X`/`y` pair from
//! two different runs.
//!
//! # Example
//!
//! ```ignore
//! use solver_trace_features::export::{load_dataset, NumpyExporter};
//!
//! let exporter = NumpyExporter::new(&config.output_dir);
//! let written = exporter.export(&config, &output.examples)?;
//!
//! let arrays = load_dataset(&config.output_dir, &written.stem)?;
//! assert_eq!(arrays.features.nrows(), output.examples.len());
//! ```

use crate::config::{DatasetConfig, DatasetVariant};
use crate::error::{DatasetError, Result};
use crate::schema::SOLVER_COUNT;
use crate::sequence_builder::{Target, TrainingExample};
use ndarray::{Array1, Array2};
use ndarray_npy::{ReadNpyExt, WriteNpyExt};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Target array, shape depends on the dataset variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Targets {
    /// `[N]` solver indices (0 = MIP, 1 = CP, 2 = ALNS)
    Labels(Array1<i64>),

    /// `[N, 3]` per-solver continuous targets
    Vectors(Array2<f64>),
}

impl Targets {
    /// Number of examples.
    pub fn len(&self) -> usize {
        match self {
            Self::Labels(a) => a.len(),
            Self::Vectors(a) => a.nrows(),
        }
    }

    /// Whether there are no examples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Array shape as written to disk.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            Self::Labels(a) => a.shape().to_vec(),
            Self::Vectors(a) => a.shape().to_vec(),
        }
    }

    /// Which kind of target this is.
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Labels(_) => TargetKind::Labels,
            Self::Vectors(_) => TargetKind::Vectors,
        }
    }
}

/// Target encoding recorded in the metadata sidecar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Integer labels
    Labels,
    /// Float vectors
    Vectors,
}

/// Positionally aligned feature and target arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetArrays {
    /// `[N, H × 3]`
    pub features: Array2<f64>,

    /// `[N]` or `[N, 3]`
    pub targets: Targets,
}

impl DatasetArrays {
    /// Stack examples in order.
    ///
    /// # Errors
    ///
    /// [`DatasetError::Shape`] if an example's feature length differs from
    /// `feature_width` or if an example's target kind differs from `kind`.
    pub fn from_examples(
        examples: &[TrainingExample],
        feature_width: usize,
        kind: TargetKind,
    ) -> Result<Self> {
        let n = examples.len();
        let mut flat = Vec::with_capacity(n * feature_width);
        let mut labels = Vec::new();
        let mut vectors = Vec::new();

        for (i, example) in examples.iter().enumerate() {
            if example.features.len() != feature_width {
                return Err(DatasetError::Shape(format!(
                    "example {i} has {} features, expected {feature_width}",
                    example.features.len()
                )));
            }
            flat.extend_from_slice(&example.features);

            match (kind, example.target) {
                (TargetKind::Labels, Target::Label(label)) => labels.push(label.index() as i64),
                (TargetKind::Vectors, Target::Vector(v)) => vectors.extend_from_slice(&v),
                _ => {
                    return Err(DatasetError::Shape(format!(
                        "example {i} target does not match {kind:?}"
                    )))
                }
            }
        }

        let features = Array2::from_shape_vec((n, feature_width), flat)
            .map_err(|e| DatasetError::Shape(format!("Failed to create feature array: {e}")))?;
        let targets = match kind {
            TargetKind::Labels => Targets::Labels(Array1::from_vec(labels)),
            TargetKind::Vectors => Targets::Vectors(
                Array2::from_shape_vec((n, SOLVER_COUNT), vectors).map_err(|e| {
                    DatasetError::Shape(format!("Failed to create target array: {e}"))
                })?,
            ),
        };

        Ok(Self { features, targets })
    }

    /// Number of examples.
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    /// Whether there are no examples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Metadata about an exported dataset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// Variant name (`best_solver`, `improvement`, `switching_improvement`)
    pub variant: String,

    /// File stem shared by the arrays
    pub stem: String,

    /// Number of examples
    pub n_examples: usize,

    /// Shape of the feature array
    pub features_shape: Vec<usize>,

    /// Shape of the target array
    pub targets_shape: Vec<usize>,

    /// Target encoding
    pub target_kind: TargetKind,

    /// Configuration that produced the arrays
    pub config: DatasetConfig,

    /// Export timestamp (RFC 3339)
    pub export_timestamp: String,
}

/// Paths produced by one export.
#[derive(Debug, Clone)]
pub struct ExportedFiles {
    /// File stem
    pub stem: String,
    /// Feature array path
    pub features: PathBuf,
    /// Target array path
    pub targets: PathBuf,
    /// Metadata sidecar path
    pub metadata: PathBuf,
    /// Shapes and counts
    pub info: ExportMetadata,
}

/// NumPy exporter - exports to .npy files for Python
pub struct NumpyExporter {
    output_dir: PathBuf,
}

impl NumpyExporter {
    /// Create new NumPy exporter
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Stack `examples` and write them under `config.file_stem()`.
    ///
    /// An empty example set is still written, with shape `(0, H × 3)`.
    pub fn export(
        &self,
        config: &DatasetConfig,
        examples: &[TrainingExample],
    ) -> Result<ExportedFiles> {
        let kind = target_kind_for(&config.variant);
        let arrays = DatasetArrays::from_examples(examples, config.feature_width(), kind)?;
        self.export_arrays(config, &arrays)
    }

    /// Write already stacked arrays.
    pub fn export_arrays(
        &self,
        config: &DatasetConfig,
        arrays: &DatasetArrays,
    ) -> Result<ExportedFiles> {
        if arrays.features.nrows() != arrays.targets.len() {
            return Err(DatasetError::Shape(format!(
                "{} feature rows but {} targets",
                arrays.features.nrows(),
                arrays.targets.len()
            )));
        }

        fs::create_dir_all(&self.output_dir)?;

        let stem = config.file_stem();
        let features_path = self.output_dir.join(features_file_name(&stem));
        let targets_path = self.output_dir.join(targets_file_name(&stem));
        let features_tmp = temp_path(&features_path);
        let targets_tmp = temp_path(&targets_path);

        let written = write_npy_file(&features_tmp, &arrays.features).and_then(|_| {
            match &arrays.targets {
                Targets::Labels(a) => write_npy_file(&targets_tmp, a),
                Targets::Vectors(a) => write_npy_file(&targets_tmp, a),
            }
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&features_tmp);
            let _ = fs::remove_file(&targets_tmp);
            return Err(e);
        }

        commit_pair(
            (&features_tmp, &features_path),
            (&targets_tmp, &targets_path),
        )?;

        let info = ExportMetadata {
            variant: config.variant.name().to_string(),
            stem: stem.clone(),
            n_examples: arrays.len(),
            features_shape: arrays.features.shape().to_vec(),
            targets_shape: arrays.targets.shape(),
            target_kind: arrays.targets.kind(),
            config: config.clone(),
            export_timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let metadata_path = self.output_dir.join(metadata_file_name(&stem));
        let mut writer = BufWriter::new(File::create(&metadata_path)?);
        serde_json::to_writer_pretty(&mut writer, &info)?;
        writer.flush()?;

        info!(
            features = %features_path.display(),
            targets = %targets_path.display(),
            examples = info.n_examples,
            "exported dataset"
        );

        Ok(ExportedFiles {
            stem,
            features: features_path,
            targets: targets_path,
            metadata: metadata_path,
            info,
        })
    }
}

fn write_npy_file<A: WriteNpyExt>(path: &Path, array: &A) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    array.write_npy(&mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Move both temporary files into place.
///
/// On failure neither file of the pair is left at its final path.
fn commit_pair(features: (&Path, &Path), targets: (&Path, &Path)) -> Result<()> {
    if let Err(e) = fs::rename(features.0, features.1) {
        let _ = fs::remove_file(features.0);
        let _ = fs::remove_file(targets.0);
        return Err(e.into());
    }
    if let Err(e) = fs::rename(targets.0, targets.1) {
        let _ = fs::remove_file(features.1);
        let _ = fs::remove_file(targets.0);
        return Err(DatasetError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot move {} into place: {e}", targets.1.display()),
        )));
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// `X_{stem}.npy`
pub fn features_file_name(stem: &str) -> String {
    format!("X_{stem}.npy")
}

/// `y_{stem}.npy`
pub fn targets_file_name(stem: &str) -> String {
    format!("y_{stem}.npy")
}

/// `{stem}_metadata.json`
pub fn metadata_file_name(stem: &str) -> String {
    format!("{stem}_metadata.json")
}

/// Read the metadata sidecar of an export.
pub fn load_metadata<P: AsRef<Path>>(dir: P, stem: &str) -> Result<ExportMetadata> {
    let file = File::open(dir.as_ref().join(metadata_file_name(stem)))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Read an exported dataset back.
///
/// The target encoding comes from the metadata sidecar.
pub fn load_dataset<P: AsRef<Path>>(dir: P, stem: &str) -> Result<DatasetArrays> {
    let dir = dir.as_ref();
    let metadata = load_metadata(dir, stem)?;

    let features = Array2::<f64>::read_npy(File::open(dir.join(features_file_name(stem)))?)?;
    let targets_file = File::open(dir.join(targets_file_name(stem)))?;
    let targets = match metadata.target_kind {
        TargetKind::Labels => Targets::Labels(Array1::<i64>::read_npy(targets_file)?),
        TargetKind::Vectors => Targets::Vectors(Array2::<f64>::read_npy(targets_file)?),
    };

    if features.nrows() != targets.len() {
        return Err(DatasetError::Shape(format!(
            "{} feature rows but {} targets in {stem}",
            features.nrows(),
            targets.len()
        )));
    }

    Ok(DatasetArrays { features, targets })
}

/// Target kind a variant produces.
pub fn target_kind_for(variant: &DatasetVariant) -> TargetKind {
    if variant.is_classification() {
        TargetKind::Labels
    } else {
        TargetKind::Vectors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SolverKind;
    use tempfile::TempDir;

    fn label_examples() -> Vec<TrainingExample> {
        vec![
            TrainingExample::classification(vec![1.0, 0.0, 0.0, 1.0, 0.0, 1.0], SolverKind::Mip),
            TrainingExample::classification(vec![1.0, 0.0, 1.0, 0.0, 0.0, 1.0], SolverKind::Alns),
        ]
    }

    #[test]
    fn test_from_examples_labels() {
        let arrays = DatasetArrays::from_examples(&label_examples(), 6, TargetKind::Labels).unwrap();
        assert_eq!(arrays.features.shape(), &[2, 6]);
        assert_eq!(arrays.targets, Targets::Labels(Array1::from_vec(vec![0, 2])));
    }

    #[test]
    fn test_from_examples_rejects_mismatches() {
        let err = DatasetArrays::from_examples(&label_examples(), 9, TargetKind::Labels);
        assert!(matches!(err, Err(DatasetError::Shape(_))));

        let err = DatasetArrays::from_examples(&label_examples(), 6, TargetKind::Vectors);
        assert!(matches!(err, Err(DatasetError::Shape(_))));
    }

    #[test]
    fn test_failed_commit_leaves_no_half_export() {
        let dir = TempDir::new().unwrap();
        let config = DatasetConfig::default()
            .with_time_horizon(2)
            .with_output_dir(dir.path());
        let stem = config.file_stem();
        // A directory in the way of the targets file makes the second rename fail.
        let blocker = dir.path().join(targets_file_name(&stem));
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), b"x").unwrap();

        let err = NumpyExporter::new(dir.path())
            .export(&config, &label_examples())
            .unwrap_err();
        assert!(matches!(err, DatasetError::Io(_)));
        assert!(err.to_string().contains(&targets_file_name(&stem)));

        let mut left: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec![targets_file_name(&stem)]);
    }

    #[test]
    fn test_metadata_is_complete_on_disk() {
        let dir = TempDir::new().unwrap();
        let config = DatasetConfig::default()
            .with_time_horizon(2)
            .with_output_dir(dir.path());
        let written = NumpyExporter::new(dir.path())
            .export(&config, &label_examples())
            .unwrap();

        let raw = fs::read_to_string(&written.metadata).unwrap();
        let parsed: ExportMetadata = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.n_examples, 2);
        assert_eq!(parsed.stem, written.stem);
    }

    #[test]
    fn test_empty_export_has_consistent_shape() {
        let dir = TempDir::new().unwrap();
        let config = DatasetConfig::default().with_output_dir(dir.path());
        let exporter = NumpyExporter::new(dir.path());

        let written = exporter.export(&config, &[]).unwrap();
        assert_eq!(written.info.features_shape, vec![0, 9]);
        assert_eq!(written.info.targets_shape, vec![0]);

        let arrays = load_dataset(dir.path(), &written.stem).unwrap();
        assert!(arrays.is_empty());
        assert_eq!(arrays.features.ncols(), 9);
    }

    #[test]
    fn test_export_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let config = DatasetConfig::default().with_time_horizon(2);
        let exporter = NumpyExporter::new(dir.path());
        exporter.export(&config, &label_examples()).unwrap();

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "X_t5_T300_h2.npy".to_string(),
                "t5_T300_h2_metadata.json".to_string(),
                "y_t5_T300_h2.npy".to_string(),
            ]
        );
    }

    #[test]
    fn test_temp_path() {
        assert_eq!(
            temp_path(Path::new("/a/X_t5.npy")),
            PathBuf::from("/a/X_t5.npy.tmp")
        );
    }
}
