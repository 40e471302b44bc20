use std::marker::PhantomData;
use std::path::Path;

use ndarray::{Array, Array3, ArrayD, ArrayView3, Dimension, Ix3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_SCAN_EXTENSION, LABEL_POSITIVE};
use crate::coord::world_to_voxel;
use crate::{Idx3d, Vec3};

mod nifti_loader;

pub use nifti_loader::{LoadNiftiError, NiftiLoader};

/// 一次加载得到的 3D CT 扫描, 包括体素数据 (HU, 以 `f32` 保存)、原点和分辨率.
///
/// 体素数据、`origin` 和 `spacing` 都按 `(z, y, x)` 顺序组织,
/// 即原生容器 `(x, y, z)` 顺序的逆序. 下游的坐标计算依赖该约定.
#[derive(Debug, Clone)]
pub struct ScanVolume {
    data: Array3<f32>,
    origin: Vec3,
    spacing: Vec3,
}

impl ScanVolume {
    /// 由 `(z, y, x)` 顺序的数据、原点和分辨率直接构建.
    #[inline]
    pub fn new(data: Array3<f32>, origin: Vec3, spacing: Vec3) -> Self {
        Self {
            data,
            origin,
            spacing,
        }
    }

    /// 获取数据形状大小.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 世界坐标原点, `(z, y, x)` 顺序, 单位为毫米.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// 单个体素分辨率, `(z, y, x)` 顺序, 单位为毫米.
    #[inline]
    pub fn spacing(&self) -> Vec3 {
        self.spacing
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// 将 `(z, y, x)` 顺序的世界坐标转换为本扫描的体素坐标.
    #[inline]
    pub fn world_to_voxel(&self, world_zyx: Vec3) -> Vec3 {
        world_to_voxel(world_zyx, self.origin, self.spacing)
    }

    /// 直接获得底层数据.
    #[inline]
    pub fn into_raw(self) -> Array3<f32> {
        self.data
    }
}

/// 一个训练样本: 立方体数据和标签.
///
/// 空间轴总是 `cube` 的最后三个轴. 经 [`Transform::ToTensor`](crate::Transform::ToTensor)
/// 处理后, 最前面会多出一个长度为 1 的通道轴.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// 立方体数据.
    pub cube: ArrayD<f32>,

    /// 标签, 0 或 1.
    pub label: u8,
}

impl Sample {
    /// 构建样本.
    #[inline]
    pub fn new<D: Dimension>(cube: Array<f32, D>, label: u8) -> Self {
        Self {
            cube: cube.into_dyn(),
            label,
        }
    }

    /// 数据形状.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.cube.shape()
    }

    /// 是否为正样本.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.label == LABEL_POSITIVE
    }

    /// 若数据恰为三维, 获取其视图.
    pub fn volume(&self) -> Option<ArrayView3<'_, f32>> {
        self.cube.view().into_dimensionality::<Ix3>().ok()
    }
}

/// 扫描加载器. 负责把某个扫描文件解码为 [`ScanVolume`].
///
/// 实现者必须按 `(z, y, x)` 顺序给出数据、原点和分辨率.
/// 加载器的错误会原样作为 [`CubeError::LoadScan`](crate::CubeError::LoadScan) 的 `source` 传出.
pub trait ScanLoader {
    /// 加载失败时的错误类型.
    type Error: std::error::Error + Send + Sync + 'static;

    /// 从 `path` 加载扫描.
    fn load(&self, path: &Path) -> Result<ScanVolume, Self::Error>;

    /// 扫描文件扩展名 (不含 `.`). 子集定位依据该扩展名查找文件.
    fn extension(&self) -> &str {
        DEFAULT_SCAN_EXTENSION
    }
}

/// 把任意函数 `Fn(&Path) -> Result<ScanVolume, E>` 包装成 [`ScanLoader`].
///
/// 适用于接入外部解码库 (例如 MetaImage `.mhd`/`.raw` 读取器) 或在测试中使用内存数据.
pub struct FnLoader<F, E> {
    f: F,
    extension: String,
    _error: PhantomData<fn() -> E>,
}

impl<F, E> FnLoader<F, E>
where
    F: Fn(&Path) -> Result<ScanVolume, E>,
{
    /// 包装 `f`, 扩展名为默认的 `mhd`.
    pub fn new(f: F) -> Self {
        Self {
            f,
            extension: DEFAULT_SCAN_EXTENSION.to_owned(),
            _error: PhantomData,
        }
    }

    /// 指定扫描文件扩展名 (不含 `.`).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

impl<F, E> ScanLoader for FnLoader<F, E>
where
    F: Fn(&Path) -> Result<ScanVolume, E>,
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    #[inline]
    fn load(&self, path: &Path) -> Result<ScanVolume, E> {
        (self.f)(path)
    }

    #[inline]
    fn extension(&self) -> &str {
        &self.extension
    }
}
