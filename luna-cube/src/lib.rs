#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 从 LUNA16 格式的肺部 CT 扫描中, 围绕候选结节坐标提取固定大小的 3D 立方体
//! (cube), 供结节分类模型训练使用.
//!
//! 该 crate 目前仅提供 `safe` 接口.
//!
//! # 注意
//!
//! 1. 该 crate 不负责解码医学图像容器. 扫描的读取由 [`ScanLoader`] 完成,
//!   它只需给出体素数组、原点 (origin) 和分辨率 (spacing).
//!   crate 自带基于 `nifti` 的 [`NiftiLoader`].
//! 2. 体素数组、origin 和 spacing 一律按照 `(z, y, x)` 顺序存储,
//!   即原生容器 `(x, y, z)` 顺序的逆序.
//!
//! # 功能
//!
//! ### 候选点清单读取 ✅
//!
//! 读取 `candidates.csv` 格式的清单, 每行为 `[seriesuid, x, y, z, class]`.
//!
//! 实现位于 `luna-cube/src/dataset/manifest.rs`.
//!
//! ### 子集 (subset) 定位 ✅
//!
//! 在 `<root>/subset<N>/` 下按给定顺序查找扫描文件.
//!
//! 实现位于 `luna-cube/src/dataset/partition.rs`.
//!
//! ### 数据集索引与正样本过采样 ✅
//!
//! 过滤找不到扫描文件的候选点; 训练阶段每个正样本额外复制 7 份.
//!
//! 实现位于 `luna-cube/src/dataset/index.rs`.
//!
//! ### 世界坐标与体素坐标转换 ✅
//!
//! 实现位于 `luna-cube/src/coord.rs`.
//!
//! ### 环绕填充与立方体提取 ✅
//!
//! 实现位于 `luna-cube/src/extract.rs`.
//!
//! ### 强度归一化与 CT 窗口 ✅
//!
//! 实现位于 `luna-cube/src/window.rs`.
//!
//! ### 随机翻转 / 随机裁剪 / 张量化 ✅
//!
//! 所有随机操作都显式接受 `rand::Rng`, 以便复现.
//!
//! 实现位于 `luna-cube/src/transform.rs`.
//!
//! ### 索引缓存 ✅
//!
//! 开启 `serde` feature 后, 可以将 [`DatasetIndex`] 以 zlib 压缩的 bincode
//! 格式保存到硬盘, 避免重复探测子集目录.

/// 三维索引, 按 `(z, y, x)` 顺序.
pub type Idx3d = (usize, usize, usize);

/// 三维浮点向量. 用于世界坐标、体素坐标、origin 和 spacing.
pub type Vec3 = [f64; 3];

pub mod consts;
pub mod coord;
mod data;
pub mod dataset;
mod error;
pub mod extract;
pub mod prelude;
pub mod transform;
pub mod window;

pub use data::{FnLoader, NiftiLoader, Sample, ScanLoader, ScanVolume};
pub use dataset::{Candidate, CubeDataset, DatasetIndex, LocatedCandidate, Partitions, Phase};
pub use error::{CubeError, CubeResult};
pub use transform::{Compose, Transform};
pub use window::CtWindow;
