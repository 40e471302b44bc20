//! 世界坐标系 (单位: 毫米) 与体素坐标系之间的转换.
//!
//! 所有向量都按 `(z, y, x)` 顺序组织, 与 [`ScanVolume`](crate::ScanVolume) 一致.

use crate::{Idx3d, Vec3};

/// 将世界坐标 `world` 转换为 (浮点) 体素坐标: `|world - origin| / spacing`, 逐轴计算.
///
/// `world` 与 `origin` 必须处于同一坐标系 (LUNA16 为 LPS). 由于取了绝对值, 该变换不可逆:
/// 只有当 `world >= origin` 逐轴成立时, [`voxel_to_world`] 才是它的逆变换.
#[inline]
pub fn world_to_voxel(world: Vec3, origin: Vec3, spacing: Vec3) -> Vec3 {
    std::array::from_fn(|i| (world[i] - origin[i]).abs() / spacing[i])
}

/// 将 (浮点) 体素坐标 `voxel` 转换为世界坐标: `voxel * spacing + origin`, 逐轴计算.
///
/// 参见 [`world_to_voxel`] 关于可逆性的说明.
#[inline]
pub fn voxel_to_world(voxel: Vec3, origin: Vec3, spacing: Vec3) -> Vec3 {
    std::array::from_fn(|i| voxel[i] * spacing[i] + origin[i])
}

/// 将浮点体素坐标向零截断为整数索引.
///
/// 若某一分量不是有限值或为负, 则返回 `None`.
pub fn voxel_to_index(voxel: Vec3) -> Option<Idx3d> {
    if voxel.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return None;
    }
    let [z, y, x] = voxel;
    Some((z as usize, y as usize, x as usize))
}
