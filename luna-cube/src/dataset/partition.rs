//! 子集 (subset) 定位.

use std::path::{Path, PathBuf};

use crate::consts::{LUNA16_SUBSET_LEN, PARTITION_PREFIX};

/// 数据集根目录下的一组子集目录 `<root>/subset<N>/`.
///
/// 每个子集目录中存放 `<scan_id>.<extension>` 形式的扫描文件 (以及可能的附属文件).
/// 子集按给定顺序探测, 结果确定.
#[derive(Debug, Clone)]
pub struct Partitions {
    root: PathBuf,
    ids: Vec<u32>,
    extension: String,
}

impl Partitions {
    /// 以 `root` 为根目录, 按 `ids` 的顺序探测子集, 扫描文件扩展名为 `extension` (不含 `.`).
    pub fn new<P, I>(root: P, ids: I, extension: impl Into<String>) -> Self
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = u32>,
    {
        Self {
            root: root.as_ref().to_owned(),
            ids: ids.into_iter().collect(),
            extension: extension.into(),
        }
    }

    /// 探测 LUNA16 的全部子集 `subset0` 至 `subset9`.
    pub fn full<P: AsRef<Path>>(root: P, extension: impl Into<String>) -> Self {
        Self::new(root, 0..LUNA16_SUBSET_LEN, extension)
    }

    /// 数据集根目录.
    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 子集编号, 按探测顺序.
    #[inline]
    pub fn ids(&self) -> &[u32] {
        &self.ids
    }

    /// 扫描文件扩展名.
    #[inline]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// 子集 `id` 的目录.
    pub fn partition_dir(&self, id: u32) -> PathBuf {
        self.root.join(format!("{PARTITION_PREFIX}{id}"))
    }

    /// 子集 `id` 中扫描 `scan_id` 的文件路径. 不检查文件是否存在.
    pub fn scan_path(&self, scan_id: &str, id: u32) -> PathBuf {
        let mut p = self.partition_dir(id);
        p.push(format!("{scan_id}.{}", self.extension));
        p
    }

    /// 按顺序探测各子集, 返回第一个包含 `scan_id` 扫描文件的子集编号.
    /// 所有子集都没有时返回 `None`.
    pub fn locate(&self, scan_id: &str) -> Option<u32> {
        self.ids
            .iter()
            .copied()
            .find(|&id| self.scan_path(scan_id, id).exists())
    }

    /// 是否有子集包含 `scan_id` 的扫描文件.
    #[inline]
    pub fn exists(&self, scan_id: &str) -> bool {
        self.locate(scan_id).is_some()
    }
}
