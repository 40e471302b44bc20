//! 运行时错误.

use std::path::PathBuf;

use thiserror::Error;

use crate::{Idx3d, Vec3};

/// 数据集构建、立方体提取与数据增强过程中的错误.
#[derive(Debug, Error)]
pub enum CubeError {
    /// 底层 I/O 错误.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 清单文件的分隔结构不合法 (例如行长度不一致).
    #[error("malformed manifest: {0}")]
    Parse(#[from] csv::Error),

    /// 清单中某行的字段无法转换为候选点.
    #[error("invalid manifest row {row}: {reason}")]
    InvalidRecord {
        /// 行号, 从 0 开始, 包含表头.
        row: usize,
        /// 原因.
        reason: String,
    },

    /// 未知的数据集阶段名.
    #[error("unknown phase: {0}")]
    UnknownPhase(String),

    /// 索引越界.
    #[error("index {index} out of range for dataset of length {len}")]
    IndexOutOfRange {
        /// 请求的索引.
        index: usize,
        /// 数据集长度.
        len: usize,
    },

    /// 提取区域超出了填充后体数据的范围.
    #[error("patch {start:?}..{end:?} exceeds padded volume {padded:?}")]
    PatchOutOfBounds {
        /// 区域起点 (含).
        start: Idx3d,
        /// 区域终点 (不含).
        end: Idx3d,
        /// 填充后体数据的形状.
        padded: Idx3d,
    },

    /// 数组形状与期望不符.
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    Shape {
        /// 期望形状 (或最小形状).
        expected: Vec<usize>,
        /// 实际形状.
        found: Vec<usize>,
    },

    /// 体素坐标不是有限的非负数.
    #[error("invalid voxel coordinate {0:?}")]
    InvalidCoordinate(Vec3),

    /// 扫描加载失败. `source` 为加载器返回的原始错误.
    #[error("failed to load scan {}", path.display())]
    LoadScan {
        /// 扫描文件路径.
        path: PathBuf,
        /// 加载器的原始错误.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// 索引缓存编解码错误.
    #[cfg(feature = "serde")]
    #[error("index cache error: {0}")]
    Cache(#[from] bincode::Error),
}

impl CubeError {
    /// 构造形状错误.
    pub(crate) fn shape(expected: &[usize], found: &[usize]) -> Self {
        Self::Shape {
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

/// 本 crate 的通用结果类型.
pub type CubeResult<T> = Result<T, CubeError>;

#[cfg(test)]
mod tests {
    use super::CubeError;

    #[test]
    fn test_error_messages() {
        let e = CubeError::IndexOutOfRange { index: 9, len: 3 };
        assert!(e.to_string().contains('9'));
        assert!(e.to_string().contains('3'));

        let e = CubeError::shape(&[20, 36, 36], &[24, 30, 40]);
        assert!(e.to_string().contains("[20, 36, 36]"));

        let e = CubeError::InvalidRecord {
            row: 4,
            reason: "missing label".into(),
        };
        assert!(e.to_string().contains("missing label"));
    }

    #[test]
    fn test_load_scan_keeps_source() {
        use std::error::Error;

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let e = CubeError::LoadScan {
            path: "subset0/a.mhd".into(),
            source: Box::new(io),
        };
        assert!(e.to_string().contains("subset0/a.mhd"));
        assert_eq!(e.source().unwrap().to_string(), "gone");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let e: CubeError = io.into();
        assert!(matches!(e, CubeError::Io(_)));
    }
}
