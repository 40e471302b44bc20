//! 数据增强.
//!
//! 每个增强步骤都是 [`Transform`] 的一个变体, 通过 [`Transform::apply`] 把一个
//! [`Sample`] 变换为新的 [`Sample`]; [`Compose`] 按配置顺序依次执行各步骤.
//!
//! 所有随机操作都从调用者传入的 `rand::Rng` 取随机数. 使用相同种子的
//! `rand_chacha::ChaCha8Rng` 即可复现同一增强序列.

use ndarray::{ArrayD, Axis, Slice};
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::consts::{CROP_DEPTH, CROP_JITTER, CROP_WIDTH};
use crate::{CubeError, CubeResult, Sample};

/// 单个增强步骤.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Transform {
    /// 对三个空间轴分别以 1/2 的概率独立翻转. 标签不变.
    RandomFlip,

    /// 在每个空间轴上从 `[0, jitter)` 中均匀抽取起点,
    /// 裁剪出 `depth × width × width` 的子立方体.
    ///
    /// 输入至少需要 `(depth + jitter - 1) × (width + jitter - 1) × (width + jitter - 1)`,
    /// 否则返回 [`CubeError::Shape`].
    RandomCrop {
        /// 裁剪后 z 方向长度.
        depth: usize,
        /// 裁剪后 y, x 方向长度.
        width: usize,
        /// 起点取值个数.
        jitter: usize,
    },

    /// 在最前面增加长度为 1 的通道轴, 并复制为新的标准布局缓冲区.
    ToTensor,
}

impl Transform {
    /// 默认的随机裁剪: 从 `24 × 40 × 40` 裁剪为 `20 × 36 × 36`.
    pub const fn random_crop() -> Self {
        Self::RandomCrop {
            depth: CROP_DEPTH,
            width: CROP_WIDTH,
            jitter: CROP_JITTER,
        }
    }

    /// 执行该步骤.
    pub fn apply<R: Rng + ?Sized>(&self, sample: Sample, rng: &mut R) -> CubeResult<Sample> {
        let Sample { cube, label } = sample;
        let cube = match *self {
            Self::RandomFlip => {
                let flips = std::array::from_fn(|_| rng.gen_bool(0.5));
                flip_axes(cube, flips)?
            }
            Self::RandomCrop {
                depth,
                width,
                jitter,
            } => {
                let jitter = jitter.max(1);
                let size = [depth, width, width];
                check_min_spatial(&cube, size.map(|s| s + jitter - 1))?;
                let z = rng.gen_range(0..jitter);
                let x = rng.gen_range(0..jitter);
                let y = rng.gen_range(0..jitter);
                crop(cube, [z, x, y], size)?
            }
            Self::ToTensor => cube
                .insert_axis(Axis(0))
                .as_standard_layout()
                .into_owned(),
        };
        Ok(Sample { cube, label })
    }
}

/// 最后三个轴 (空间轴) 的编号. 维数不足 3 时返回 [`CubeError::Shape`].
fn spatial_axes(cube: &ArrayD<f32>) -> CubeResult<[usize; 3]> {
    let n = cube.ndim();
    if n < 3 {
        return Err(CubeError::shape(&[0, 0, 0], cube.shape()));
    }
    Ok([n - 3, n - 2, n - 1])
}

/// 检查空间轴长度不小于 `min`.
fn check_min_spatial(cube: &ArrayD<f32>, min: [usize; 3]) -> CubeResult<()> {
    let axes = spatial_axes(cube)?;
    if axes.iter().zip(min).any(|(&ax, m)| cube.len_of(Axis(ax)) < m) {
        return Err(CubeError::shape(&min, cube.shape()));
    }
    Ok(())
}

/// 按 `flips` 翻转三个空间轴 (`(z, y, x)` 顺序). 对同一 `flips` 执行两次即还原.
pub fn flip_axes(mut cube: ArrayD<f32>, flips: [bool; 3]) -> CubeResult<ArrayD<f32>> {
    let axes = spatial_axes(&cube)?;
    for (ax, flip) in axes.into_iter().zip(flips) {
        if flip {
            cube.invert_axis(Axis(ax));
        }
    }
    Ok(cube)
}

/// 以 `offset` 为起点在三个空间轴上裁剪出 `size` 大小的区域.
///
/// 区域越界时返回 [`CubeError::Shape`].
pub fn crop(mut cube: ArrayD<f32>, offset: [usize; 3], size: [usize; 3]) -> CubeResult<ArrayD<f32>> {
    let axes = spatial_axes(&cube)?;
    check_min_spatial(&cube, std::array::from_fn(|i| offset[i] + size[i]))?;
    for ((ax, off), len) in axes.into_iter().zip(offset).zip(size) {
        cube.slice_axis_inplace(Axis(ax), Slice::from(off..off + len));
    }
    Ok(cube)
}

/// 按顺序组合的增强流水线.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Compose {
    stages: Vec<Transform>,
}

impl Compose {
    /// 创建构建器.
    #[inline]
    pub fn builder() -> ComposeBuilder {
        ComposeBuilder::default()
    }

    /// 训练时使用的流水线: 随机翻转, 随机裁剪, 张量化.
    pub fn standard() -> Self {
        Self::builder()
            .random_flip()
            .random_crop()
            .to_tensor()
            .build()
    }

    /// 各步骤.
    #[inline]
    pub fn stages(&self) -> &[Transform] {
        &self.stages
    }

    /// 按配置顺序依次执行各步骤, 前一步的输出是后一步的输入.
    pub fn apply<R: Rng + ?Sized>(&self, sample: Sample, rng: &mut R) -> CubeResult<Sample> {
        self.stages
            .iter()
            .try_fold(sample, |s, t| t.apply(s, &mut *rng))
    }
}

/// [`Compose`] 构建器.
#[derive(Clone, Debug, Default)]
pub struct ComposeBuilder {
    stages: Vec<Transform>,
}

impl ComposeBuilder {
    /// 追加任意步骤.
    #[inline]
    pub fn then(mut self, t: Transform) -> Self {
        self.stages.push(t);
        self
    }

    /// 追加 [`Transform::RandomFlip`].
    #[inline]
    pub fn random_flip(self) -> Self {
        self.then(Transform::RandomFlip)
    }

    /// 追加默认参数的 [`Transform::RandomCrop`].
    #[inline]
    pub fn random_crop(self) -> Self {
        self.then(Transform::random_crop())
    }

    /// 追加给定参数的 [`Transform::RandomCrop`].
    #[inline]
    pub fn random_crop_with(self, depth: usize, width: usize, jitter: usize) -> Self {
        self.then(Transform::RandomCrop {
            depth,
            width,
            jitter,
        })
    }

    /// 追加 [`Transform::ToTensor`].
    #[inline]
    pub fn to_tensor(self) -> Self {
        self.then(Transform::ToTensor)
    }

    /// 完成构建.
    #[inline]
    pub fn build(self) -> Compose {
        Compose {
            stages: self.stages,
        }
    }
}
