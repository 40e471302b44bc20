//! 🫁欢迎光临🧊
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx3d, Vec3};

pub use crate::data::{FnLoader, NiftiLoader, Sample, ScanLoader, ScanVolume};
pub use crate::window::CtWindow;

pub use crate::consts::{CROP_DEPTH, CROP_WIDTH, POSITIVE_EXTRA_COPIES, VOXEL_DEPTH, VOXEL_WIDTH};

pub use crate::dataset::home_dataset_dir_with;
pub use crate::dataset::{
    self, Candidate, CubeDataset, DatasetIndex, LocatedCandidate, Partitions, Phase,
};

pub use crate::extract::extract_cube;
pub use crate::transform::{Compose, Transform};

pub use crate::{CubeError, CubeResult};
