//! 数据集索引: 候选点过滤、子集标注与正样本过采样.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use csv::StringRecord;
use itertools::repeat_n;
use log::{debug, info};

use super::manifest::{read_manifest, Candidate};
use super::Partitions;
use crate::consts::POSITIVE_EXTRA_COPIES;
use crate::{CubeError, CubeResult};

cfg_if::cfg_if! {
    if #[cfg(feature = "serde")] {
        use std::fs::File;
        use std::io::{BufReader, BufWriter, Write};

        use flate2::read::ZlibDecoder;
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use serde::{Deserialize, Serialize};
    }
}

/// 数据集阶段. 只有训练阶段会对正样本过采样.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// 训练.
    Train,
    /// 验证.
    Val,
    /// 测试.
    Test,
}

impl Phase {
    /// 是否为训练阶段.
    #[inline]
    pub fn is_train(self) -> bool {
        self == Phase::Train
    }
}

impl FromStr for Phase {
    type Err = CubeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "train" => Ok(Phase::Train),
            "val" | "validation" => Ok(Phase::Val),
            "test" => Ok(Phase::Test),
            _ => Err(CubeError::UnknownPhase(s.to_owned())),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Train => "train",
            Phase::Val => "val",
            Phase::Test => "test",
        })
    }
}

/// 已定位的候选点: 候选点及其扫描文件所在的子集编号.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedCandidate {
    candidate: Candidate,
    partition: u32,
}

impl LocatedCandidate {
    /// 构建.
    #[inline]
    pub fn new(candidate: Candidate, partition: u32) -> Self {
        Self {
            candidate,
            partition,
        }
    }

    /// 候选点.
    #[inline]
    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    /// 扫描文件所在的子集编号.
    #[inline]
    pub fn partition(&self) -> u32 {
        self.partition
    }
}

/// 数据集索引. 构建后不可变.
///
/// 条目顺序: 先是清单中所有能找到扫描文件的候选点 (保持清单顺序);
/// 训练阶段下, 随后按同样顺序为每个正样本追加 [`POSITIVE_EXTRA_COPIES`] 份副本.
/// 因此训练阶段每个正样本共出现 8 次, 其它阶段只出现 1 次.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetIndex {
    entries: Vec<LocatedCandidate>,
    phase: Phase,
    positives: usize,
    base: usize,
    base_positives: usize,
}

impl DatasetIndex {
    /// 读取清单 `manifest`, 丢弃表头后按 [`DatasetIndex::from_rows`] 构建.
    pub fn build<P: AsRef<Path>>(
        manifest: P,
        partitions: &Partitions,
        phase: Phase,
    ) -> CubeResult<Self> {
        let rows = read_manifest(manifest)?;
        Self::from_rows(&rows, partitions, phase)
    }

    /// 由清单的全部行 (含表头) 构建.
    ///
    /// 先按第 0 列 (扫描标识) 定位扫描文件, 找不到的行直接丢弃, 不检查其余字段;
    /// 保留下来的行转换为 [`Candidate`], 任一行不合法即返回 [`CubeError::InvalidRecord`].
    pub fn from_rows(
        rows: &[StringRecord],
        partitions: &Partitions,
        phase: Phase,
    ) -> CubeResult<Self> {
        let n = rows.len().saturating_sub(1);
        let located = rows
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(row, r)| {
                let scan_id = r.get(0).map(str::trim).filter(|s| !s.is_empty())?;
                let p = partitions.locate(scan_id)?;
                Some(Candidate::from_record(row, r).map(|c| LocatedCandidate::new(c, p)))
            })
            .collect::<CubeResult<Vec<_>>>()?;
        debug!(
            "{phase}: {} of {n} candidates skipped, scan not found under {}",
            n - located.len(),
            partitions.root().display()
        );

        Ok(Self::from_located(located, phase))
    }

    /// 由已定位的候选点构建, 训练阶段会对正样本过采样.
    pub fn from_located(mut entries: Vec<LocatedCandidate>, phase: Phase) -> Self {
        let base = entries.len();
        let base_positives = entries.iter().filter(|e| e.candidate.is_positive()).count();
        if phase.is_train() {
            info!("{phase}: {base_positives}/{base} positive candidates");
            let extra: Vec<_> = entries
                .iter()
                .filter(|e| e.candidate.is_positive())
                .flat_map(|e| repeat_n(e.clone(), POSITIVE_EXTRA_COPIES))
                .collect();
            entries.extend(extra);
        }
        let positives = entries.iter().filter(|e| e.candidate.is_positive()).count();

        Self {
            entries,
            phase,
            positives,
            base,
            base_positives,
        }
    }

    /// 条目数, 含过采样副本.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 第 `i` 个条目.
    #[inline]
    pub fn get(&self, i: usize) -> Option<&LocatedCandidate> {
        self.entries.get(i)
    }

    /// 按顺序遍历所有条目.
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, LocatedCandidate> {
        self.entries.iter()
    }

    /// 正样本条目数, 含过采样副本.
    #[inline]
    pub fn positives(&self) -> usize {
        self.positives
    }

    /// 条目总数. 与 [`DatasetIndex::len`] 相同.
    #[inline]
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// 过采样前的条目数, 即能找到扫描文件的候选点个数.
    #[inline]
    pub fn base_len(&self) -> usize {
        self.base
    }

    /// 过采样前的正样本条目数.
    #[inline]
    pub fn base_positives(&self) -> usize {
        self.base_positives
    }

    /// 构建时的阶段.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

impl<'a> IntoIterator for &'a DatasetIndex {
    type Item = &'a LocatedCandidate;
    type IntoIter = std::slice::Iter<'a, LocatedCandidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// 索引缓存.
#[cfg(feature = "serde")]
impl DatasetIndex {
    /// 以 zlib 压缩的 bincode 格式保存到 `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> CubeResult<()> {
        let file = BufWriter::new(File::create(path)?);
        let mut e = ZlibEncoder::new(file, Compression::default());
        bincode::serialize_into(&mut e, self)?;
        e.finish()?.flush()?;
        Ok(())
    }

    /// 从 [`DatasetIndex::save`] 保存的文件读取.
    pub fn load<P: AsRef<Path>>(path: P) -> CubeResult<Self> {
        let d = ZlibDecoder::new(BufReader::new(File::open(path)?));
        let index = bincode::deserialize_from(d)?;
        Ok(index)
    }
}
