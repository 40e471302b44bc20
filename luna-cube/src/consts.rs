//! 通用常量.

/// 强度归一化使用的固定常量. 归一化公式为 `(hu + NORM_OFFSET) / NORM_SCALE`.
pub mod hu {
    /// 归一化偏移量.
    pub const NORM_OFFSET: f32 = 600.0;

    /// 归一化缩放量.
    pub const NORM_SCALE: f32 = 300.0;
}

/// 提取立方体 (patch) 的深度, 即 z 方向体素个数.
pub const VOXEL_DEPTH: usize = 24;

/// 提取立方体 (patch) 的宽度, 即 y 和 x 方向体素个数.
pub const VOXEL_WIDTH: usize = 40;

/// 随机裁剪后的立方体深度.
pub const CROP_DEPTH: usize = 20;

/// 随机裁剪后的立方体宽度.
pub const CROP_WIDTH: usize = 36;

/// 随机裁剪起点在每个轴上的取值个数, 起点取自 `[0, CROP_JITTER)`.
pub const CROP_JITTER: usize = 5;

/// 训练阶段每个正样本 **额外** 复制的份数. 加上原样本共 8 份.
pub const POSITIVE_EXTRA_COPIES: usize = 7;

/// 子集目录名前缀. 子集目录形如 `subset0`.
pub const PARTITION_PREFIX: &str = "subset";

/// LUNA16 数据集的子集个数 (`subset0` 至 `subset9`).
pub const LUNA16_SUBSET_LEN: u32 = 10;

/// LUNA16 原始扫描文件的扩展名 (MetaImage).
pub const DEFAULT_SCAN_EXTENSION: &str = "mhd";

/// 正样本标签.
pub const LABEL_POSITIVE: u8 = 1;

/// 负样本标签.
pub const LABEL_NEGATIVE: u8 = 0;
