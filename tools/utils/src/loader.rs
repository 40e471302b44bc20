//! 对 `luna-cube::dataset` 的更一层封装. 提供更直接的数据集加载器.

use luna_cube::dataset::{self, CubeDataset, Partitions, Phase};
use luna_cube::{CubeResult, DatasetIndex, NiftiLoader, ScanLoader};
use std::env;
use std::path::{Path, PathBuf};

/// 获取 LUNA16 数据集根目录 (其下为 `subset0` 至 `subset9`).
///
/// 1. 若环境变量 `$LUNA16_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/luna16`. 无法确定用户主目录时返回 `None`.
pub fn luna_dir_from_env_or_home() -> Option<PathBuf> {
    match env::var("LUNA16_DIR") {
        Ok(d) if !d.is_empty() => Some(PathBuf::from(d)),
        _ => dataset::home_dataset_dir_with(["luna16"]),
    }
}

/// 获取候选点清单路径.
///
/// 1. 若环境变量 `$LUNA16_CANDIDATES` 非空, 则返回其值;
/// 2. 否则, 返回 `{数据集根目录}/candidates.csv`.
pub fn candidates_path_from_env_or_home() -> Option<PathBuf> {
    match env::var("LUNA16_CANDIDATES") {
        Ok(p) if !p.is_empty() => Some(PathBuf::from(p)),
        _ => luna_dir_from_env_or_home().map(|d| d.join("candidates.csv")),
    }
}

/// 获取 `root` 下全部子集的 nii 扫描定位器.
#[inline]
pub fn nifti_partitions<P: AsRef<Path>>(root: P) -> Partitions {
    Partitions::full(root, NiftiLoader::new().extension())
}

/// 获取 LUNA16 立方体数据集. 扫描为 `<root>/subset<N>/<seriesuid>.nii`.
pub fn cube_dataset<P, Q>(manifest: P, root: Q, phase: Phase) -> CubeResult<CubeDataset<NiftiLoader>>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let partitions = nifti_partitions(root);
    let index = DatasetIndex::build(manifest, &partitions, phase)?;
    Ok(CubeDataset::new(index, partitions, NiftiLoader::new()))
}

/// 从 `$LUNA16_CANDIDATES` 与 `$LUNA16_DIR` (或者 `$HOME/dataset/luna16`) 加载数据集.
///
/// 无法确定路径时返回 `None`.
pub fn dataset_from_env_or_home(phase: Phase) -> Option<CubeResult<CubeDataset<NiftiLoader>>> {
    let root = luna_dir_from_env_or_home()?;
    let manifest = candidates_path_from_env_or_home()?;
    Some(cube_dataset(manifest, root, phase))
}
