//! 候选点清单 (`candidates.csv`) 读取.

use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::{LABEL_NEGATIVE, LABEL_POSITIVE};
use crate::{CubeError, CubeResult, Vec3};

/// 从 `path` 读取逗号分隔的清单, 按原顺序返回 **全部** 行, 包括表头.
///
/// 表头由调用者丢弃. 各行字段数不一致时返回 [`CubeError::Parse`];
/// 该函数不检查字段含义.
pub fn read_manifest<P: AsRef<Path>>(path: P) -> CubeResult<Vec<StringRecord>> {
    read_manifest_from(File::open(path.as_ref())?)
}

/// 从任意输入流读取清单. 参见 [`read_manifest`].
pub fn read_manifest_from<R: io::Read>(rdr: R) -> CubeResult<Vec<StringRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(false).from_reader(rdr);
    let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 候选点: 扫描标识、世界坐标 (毫米) 和标签.
///
/// 由清单中的一行 `[seriesuid, x, y, z, class]` 构建, 构建后不可变.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    scan_id: String,
    /// `(x, y, z)` 顺序, 与清单列顺序一致.
    world: Vec3,
    label: u8,
}

impl Candidate {
    /// 直接构建. `world_xyz` 按清单的 `(x, y, z)` 顺序给出.
    pub fn new(scan_id: impl Into<String>, world_xyz: Vec3, label: u8) -> Self {
        Self {
            scan_id: scan_id.into(),
            world: world_xyz,
            label,
        }
    }

    /// 从清单第 `row` 行 (从 0 开始, 含表头) 构建.
    ///
    /// 缺少字段、坐标无法解析或标签不是 0/1 时返回 [`CubeError::InvalidRecord`].
    pub fn from_record(row: usize, record: &StringRecord) -> CubeResult<Self> {
        let invalid = |reason: String| CubeError::InvalidRecord { row, reason };
        let field = |i: usize| {
            record
                .get(i)
                .map(str::trim)
                .ok_or_else(|| invalid(format!("missing column {i}")))
        };

        let scan_id = field(0)?;
        if scan_id.is_empty() {
            return Err(invalid("empty scan id".into()));
        }

        let mut world = [0.0; 3];
        for (i, w) in world.iter_mut().enumerate() {
            let s = field(i + 1)?;
            *w = s
                .parse::<f64>()
                .map_err(|e| invalid(format!("column {}: '{s}': {e}", i + 1)))?;
        }

        let s = field(4)?;
        let label = match s.parse::<u8>() {
            Ok(l @ (LABEL_NEGATIVE | LABEL_POSITIVE)) => l,
            _ => return Err(invalid(format!("label must be 0 or 1, got '{s}'"))),
        };

        Ok(Self::new(scan_id, world, label))
    }

    /// 扫描标识 (LUNA16 的 `seriesuid`).
    #[inline]
    pub fn scan_id(&self) -> &str {
        &self.scan_id
    }

    /// `(x, y, z)` 顺序的世界坐标.
    #[inline]
    pub fn world_xyz(&self) -> Vec3 {
        self.world
    }

    /// `(z, y, x)` 顺序的世界坐标, 与扫描数据的轴序一致.
    #[inline]
    pub fn world_zyx(&self) -> Vec3 {
        let [x, y, z] = self.world;
        [z, y, x]
    }

    /// 标签.
    #[inline]
    pub fn label(&self) -> u8 {
        self.label
    }

    /// 是否为正样本.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.label == LABEL_POSITIVE
    }
}
