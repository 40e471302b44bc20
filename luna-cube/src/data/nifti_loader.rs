//! 基于 `nifti` crate 的扫描加载器.

use std::path::Path;

use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use thiserror::Error;

use super::{ScanLoader, ScanVolume};
use crate::Vec3;

/// 加载 nii 文件错误.
#[derive(Debug, Error)]
pub enum LoadNiftiError {
    /// 底层 nifti 解码错误.
    #[error(transparent)]
    Nifti(#[from] nifti::NiftiError),

    /// 数据不是三维体数据. 参数为 (逆序后的) 实际形状.
    #[error("not a 3D volume: {0:?}")]
    NotVolume(Vec<usize>),

    /// 重整数据形状失败.
    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

/// 读取 `.nii` / `.nii.gz` 格式 3D CT 扫描的加载器.
///
/// 数据从 `[W, H, z]` 转换为 `[z, H, W]`; 原点取自 sform
/// (`sform_code > 0` 时) 或 qform 偏移, 分辨率取自 `pixdim`, 两者均逆序为 `(z, y, x)`.
///
/// # 注意
///
/// nifti header 的世界坐标为 RAS+, 而 LUNA16 清单中的候选点坐标为 LPS
/// (与 ITK 一致). 加载时原点的 x 和 y 分量会取反, 使其与候选点处于同一坐标系.
#[derive(Debug, Clone)]
pub struct NiftiLoader {
    extension: String,
}

impl Default for NiftiLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl NiftiLoader {
    /// 创建加载器, 扩展名为 `nii`.
    pub fn new() -> Self {
        Self {
            extension: "nii".to_owned(),
        }
    }

    /// 指定扫描文件扩展名 (不含 `.`), 例如 `nii.gz`.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// 从 header 获取 `(z, y, x)` 顺序、LPS 坐标系下的原点.
fn origin_from_header(h: &NiftiHeader) -> Vec3 {
    let (x, y, z) = if h.sform_code > 0 {
        (h.srow_x[3], h.srow_y[3], h.srow_z[3])
    } else {
        (h.quatern_x, h.quatern_y, h.quatern_z)
    };
    // RAS -> LPS
    [z as f64, -(y as f64), -(x as f64)]
}

/// 从 header 获取 `(z, y, x)` 顺序的分辨率.
#[inline]
fn spacing_from_header(h: &NiftiHeader) -> Vec3 {
    // [_, W, H, z, ..]
    let [_, w, h, z, ..] = h.pixdim;
    [z as f64, h as f64, w as f64]
}

impl ScanLoader for NiftiLoader {
    type Error = LoadNiftiError;

    fn load(&self, path: &Path) -> Result<ScanVolume, LoadNiftiError> {
        let obj = ReaderOptions::new().read_file(path)?;
        let origin = origin_from_header(obj.header());
        let spacing = spacing_from_header(obj.header());

        // [W, H, z, ..] -> [.., z, H, W].
        // hint: 原第一维向下增长, 原第二维向右增长.
        let data = obj.into_volume().into_ndarray::<f32>()?.reversed_axes();
        let data = if data.is_standard_layout() {
            data
        } else {
            data.as_standard_layout().into_owned()
        };

        let sh = data.shape().to_vec();
        let n = sh.len();
        if n < 3 || sh[..n - 3].iter().product::<usize>() != 1 {
            return Err(LoadNiftiError::NotVolume(sh));
        }
        let data = data.into_shape((sh[n - 3], sh[n - 2], sh[n - 1]))?;

        Ok(ScanVolume::new(data, origin, spacing))
    }

    #[inline]
    fn extension(&self) -> &str {
        &self.extension
    }
}
