//! 数据集操作.

use std::path::{Path, PathBuf};

use rand::Rng;

use crate::extract::extract_cube;
use crate::{Compose, CubeError, CubeResult, Sample, ScanLoader};

mod index;
pub mod manifest;
mod partition;

pub use index::{DatasetIndex, LocatedCandidate, Phase};
pub use manifest::{read_manifest, read_manifest_from, Candidate};
pub use partition::Partitions;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rand::SeedableRng;
        use rand_chacha::ChaCha8Rng;
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 获取 `{用户主目录}/dataset` 目录.
pub fn home_dataset_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.push("dataset");
    Some(ans)
}

/// 获取 `{用户主目录}/dataset` 目录下给定继续项组成的全路径.
pub fn home_dataset_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_dataset_dir()?;
    ans.extend(it);
    Some(ans)
}

/// 候选点立方体数据集.
///
/// 每次访问都会重新加载对应扫描、提取立方体并 (可选地) 执行增强, 不做任何缓存.
/// 构建后不可变, 当 `L: Sync` 时可以在多个线程中同时访问.
///
/// # 示例
///
/// ```no_run
/// use luna_cube::prelude::*;
/// use rand::SeedableRng;
///
/// let ds = CubeDataset::open(
///     "candidates.csv",
///     "/data/luna16",
///     0..10,
///     Phase::Train,
///     NiftiLoader::new(),
/// )?
/// .with_transform(Compose::standard());
///
/// let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
/// let sample = ds.get(0, &mut rng)?;
/// assert_eq!(sample.shape(), &[1, 20, 36, 36]);
/// # Ok::<(), CubeError>(())
/// ```
pub struct CubeDataset<L> {
    index: DatasetIndex,
    partitions: Partitions,
    loader: L,
    transform: Option<Compose>,
}

impl<L: ScanLoader> CubeDataset<L> {
    /// 由已有的索引构建. 不执行增强.
    pub fn new(index: DatasetIndex, partitions: Partitions, loader: L) -> Self {
        Self {
            index,
            partitions,
            loader,
            transform: None,
        }
    }

    /// 读取清单 `manifest`, 在 `root` 下按 `subsets` 顺序定位扫描文件并构建数据集.
    /// 扫描文件扩展名取自 `loader`.
    pub fn open<P, Q, I>(
        manifest: P,
        root: Q,
        subsets: I,
        phase: Phase,
        loader: L,
    ) -> CubeResult<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
        I: IntoIterator<Item = u32>,
    {
        let partitions = Partitions::new(root, subsets, loader.extension());
        let index = DatasetIndex::build(manifest, &partitions, phase)?;
        Ok(Self::new(index, partitions, loader))
    }

    /// 设置增强流水线.
    pub fn with_transform(mut self, transform: Compose) -> Self {
        self.transform = Some(transform);
        self
    }

    /// 样本数, 含过采样副本.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// 底层索引.
    #[inline]
    pub fn index(&self) -> &DatasetIndex {
        &self.index
    }

    /// 子集定位器.
    #[inline]
    pub fn partitions(&self) -> &Partitions {
        &self.partitions
    }

    /// 增强流水线.
    #[inline]
    pub fn transform(&self) -> Option<&Compose> {
        self.transform.as_ref()
    }

    /// 加载第 `i` 个样本并提取归一化后的 `24 × 40 × 40` 立方体, 不执行增强.
    pub fn extract(&self, i: usize) -> CubeResult<Sample> {
        let entry = self.index.get(i).ok_or(CubeError::IndexOutOfRange {
            index: i,
            len: self.len(),
        })?;
        let c = entry.candidate();
        let path = self.partitions.scan_path(c.scan_id(), entry.partition());
        let volume = self.loader.load(&path).map_err(|e| CubeError::LoadScan {
            path,
            source: Box::new(e),
        })?;

        let cube = extract_cube(&volume, c.world_zyx())?;
        Ok(Sample::new(cube, c.label()))
    }

    /// 获取第 `i` 个样本, 并用 `rng` 执行增强流水线 (若已设置).
    pub fn get<R: Rng + ?Sized>(&self, i: usize, rng: &mut R) -> CubeResult<Sample> {
        let sample = self.extract(i)?;
        match &self.transform {
            Some(t) => t.apply(sample, rng),
            None => Ok(sample),
        }
    }
}

/// 并发操作部分
#[cfg(feature = "rayon")]
impl<L: ScanLoader + Sync> CubeDataset<L> {
    /// 并行获取 `indices` 对应的样本, 结果顺序与 `indices` 一致.
    ///
    /// 每个样本使用独立的 `ChaCha8Rng`, 种子为 `seed`, 流编号为样本索引,
    /// 因此结果与线程调度无关.
    pub fn par_batch(&self, indices: &[usize], seed: u64) -> Vec<CubeResult<Sample>> {
        indices
            .par_iter()
            .map(|&i| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                rng.set_stream(i as u64);
                self.get(i, &mut rng)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FnLoader, ScanVolume};
    use ndarray::Array3;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::{fs, io};

    const CSV: &str = "seriesuid,coordX,coordY,coordZ,class\n\
                       good,20.0,25.0,15.0,1\n\
                       gone,20.0,25.0,15.0,0\n\
                       broken,20.0,25.0,15.0,0\n\
                       good,300.0,25.0,15.0,0\n";

    fn volume() -> ScanVolume {
        let data = Array3::from_shape_fn((30, 50, 50), |(z, y, x)| {
            -900.0 + (z * 3 + y * 5 + x * 7) as f32
        });
        ScanVolume::new(data, [0.0; 3], [1.0; 3])
    }

    fn load(p: &Path) -> Result<ScanVolume, io::Error> {
        if p.ends_with("good.mhd") {
            Ok(volume())
        } else {
            Err(io::Error::new(io::ErrorKind::InvalidData, "corrupt scan"))
        }
    }

    /// 清单 + `subset0/{good,broken}.mhd`.
    fn tree() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("subset0");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("good.mhd"), b"").unwrap();
        fs::write(dir.join("broken.mhd"), b"").unwrap();
        fs::write(tmp.path().join("candidates.csv"), CSV).unwrap();
        tmp
    }

    type LoadFn = fn(&Path) -> Result<ScanVolume, io::Error>;

    fn open(tmp: &tempfile::TempDir, phase: Phase) -> CubeDataset<FnLoader<LoadFn, io::Error>> {
        let loader = FnLoader::new(load as LoadFn);
        CubeDataset::open(
            tmp.path().join("candidates.csv"),
            tmp.path(),
            [0, 1],
            phase,
            loader,
        )
        .unwrap()
    }

    #[test]
    fn test_home_dataset_dir_with() {
        if let Some(home) = home_dataset_dir() {
            let p = home_dataset_dir_with(["luna16", "subset0"]).unwrap();
            assert_eq!(p, home.join("luna16").join("subset0"));
        }
    }

    #[test]
    fn test_extract_without_transform() {
        let tmp = tree();
        let ds = open(&tmp, Phase::Test);
        assert_eq!(ds.len(), 3);
        assert!(ds.transform().is_none());

        let s = ds.extract(0).unwrap();
        assert_eq!(s.shape(), &[24, 40, 40]);
        assert_eq!(s.label, 1);
        assert!(s.cube.iter().all(|v| (0.0..=1.0).contains(v)));

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(ds.get(0, &mut rng).unwrap(), s);
    }

    #[test]
    fn test_get_with_flip_and_crop() {
        let tmp = tree();
        let ds = open(&tmp, Phase::Train)
            .with_transform(Compose::builder().random_flip().random_crop().build());
        // 3 个基础条目 + 1 个正样本的 7 份副本.
        assert_eq!(ds.len(), 10);

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for i in [0, 3, 9] {
            let s = ds.get(i, &mut rng).unwrap();
            assert_eq!(s.shape(), &[20, 36, 36]);
            assert!(s.is_positive());
        }
    }

    #[test]
    fn test_get_standard_pipeline() {
        let tmp = tree();
        let ds = open(&tmp, Phase::Val).with_transform(Compose::standard());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let s = ds.get(0, &mut rng).unwrap();
        assert_eq!(s.shape(), &[1, 20, 36, 36]);

        let mut a = ChaCha8Rng::seed_from_u64(99);
        let mut b = ChaCha8Rng::seed_from_u64(99);
        assert_eq!(ds.get(0, &mut a).unwrap(), ds.get(0, &mut b).unwrap());
    }

    #[test]
    fn test_index_out_of_range() {
        let tmp = tree();
        let ds = open(&tmp, Phase::Test);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            ds.get(3, &mut rng),
            Err(CubeError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_loader_error_kept_as_source() {
        let tmp = tree();
        let ds = open(&tmp, Phase::Test);
        match ds.extract(1) {
            Err(CubeError::LoadScan { path, source }) => {
                assert!(path.ends_with("subset0/broken.mhd"));
                let err = source.downcast_ref::<io::Error>().unwrap();
                assert_eq!(err.kind(), io::ErrorKind::InvalidData);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_patch_out_of_bounds() {
        let tmp = tree();
        let ds = open(&tmp, Phase::Test);
        // 第 4 行 x = 300, 超出填充后的范围.
        assert!(matches!(
            ds.extract(2),
            Err(CubeError::PatchOutOfBounds { .. })
        ));
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_batch_reproducible() {
        let tmp = tree();
        let ds = open(&tmp, Phase::Train).with_transform(Compose::standard());
        let indices = [0, 4, 9, 2, 42];

        let a = ds.par_batch(&indices, 2024);
        let b = ds.par_batch(&indices, 2024);
        assert_eq!(a.len(), 5);
        for (x, y) in a.iter().take(3).zip(&b) {
            let (x, y) = (x.as_ref().unwrap(), y.as_ref().unwrap());
            assert_eq!(x, y);
            assert_eq!(x.shape(), &[1, 20, 36, 36]);
        }
        assert!(matches!(a[3], Err(CubeError::PatchOutOfBounds { .. })));
        assert!(matches!(a[4], Err(CubeError::IndexOutOfRange { index: 42, .. })));

        // 与串行访问一致.
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        rng.set_stream(4);
        assert_eq!(&ds.get(4, &mut rng).unwrap(), a[1].as_ref().unwrap());
    }
}
