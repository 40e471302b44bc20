//! 围绕候选点提取固定大小立方体.
//!
//! 体数据先按 numpy `wrap` 的方式做环绕填充: z 轴两侧各填充 `VOXEL_DEPTH / 2`,
//! y 和 x 轴两侧各填充 `VOXEL_WIDTH / 2`. 随后以截断体素坐标 `v` 为起点, 直接在
//! **填充后** 的数组上取出 `VOXEL_DEPTH × VOXEL_WIDTH × VOXEL_WIDTH` 的区域.
//! 填充后的索引 `v` 对应原数据的 `v - pad`, 所以该区域覆盖原数据 `[v - pad, v + pad)`,
//! 候选点位于立方体的 `(12, 20, 20)` 处, 即中心.
//!
//! 提取时不会真正生成填充后的数组, 而是直接按环绕规则读取原数据,
//! 结果与 [`pad_wrap`] 后再切片完全一致.

use ndarray::{Array3, ArrayBase, ArrayView3, Data, Ix3};

use crate::consts::{VOXEL_DEPTH, VOXEL_WIDTH};
use crate::coord::voxel_to_index;
use crate::window::normalize_in_place;
use crate::{CubeError, CubeResult, Idx3d, ScanVolume, Vec3};

/// 提取立方体的形状.
pub const PATCH_SHAPE: Idx3d = (VOXEL_DEPTH, VOXEL_WIDTH, VOXEL_WIDTH);

/// 环绕填充量.
pub const PATCH_PAD: Idx3d = (VOXEL_DEPTH / 2, VOXEL_WIDTH / 2, VOXEL_WIDTH / 2);

/// 填充后第 `i` 个元素在原轴 (长度 `n`) 上的位置.
#[inline]
const fn wrap(i: usize, pad: usize, n: usize) -> usize {
    (i + n - pad % n) % n
}

/// 从环绕填充 `pad` 后的 (虚拟) 数组中, 取出起点为 `start`、形状为 `size` 的区域.
/// 调用者保证 `data` 非空且区域不越界.
fn wrapped_region(data: &ArrayView3<f32>, start: Idx3d, size: Idx3d, pad: Idx3d) -> Array3<f32> {
    let (d, h, w) = data.dim();
    Array3::from_shape_fn(size, |(z, y, x)| {
        data[(
            wrap(start.0 + z, pad.0, d),
            wrap(start.1 + y, pad.1, h),
            wrap(start.2 + x, pad.2, w),
        )]
    })
}

/// 检查体数据非空.
fn check_non_empty(shape: Idx3d) -> CubeResult<()> {
    let (d, h, w) = shape;
    if d == 0 || h == 0 || w == 0 {
        let (pd, ph, pw) = PATCH_SHAPE;
        return Err(CubeError::shape(&[pd, ph, pw], &[d, h, w]));
    }
    Ok(())
}

/// 对三维数组做环绕填充, 每个轴两侧分别填充 `pad` 中对应的个数.
///
/// 与 numpy 的 `np.pad(a, ..., 'wrap')` 结果一致, 填充量可以超过轴长.
/// 若数组为空, 返回 [`CubeError::Shape`].
pub fn pad_wrap<S>(data: &ArrayBase<S, Ix3>, pad: Idx3d) -> CubeResult<Array3<f32>>
where
    S: Data<Elem = f32>,
{
    let (d, h, w) = data.dim();
    check_non_empty((d, h, w))?;
    let padded = (d + 2 * pad.0, h + 2 * pad.1, w + 2 * pad.2);
    Ok(wrapped_region(&data.view(), (0, 0, 0), padded, pad))
}

/// 从环绕填充后的体数据中, 以 `start` 为起点取出 [`PATCH_SHAPE`] 大小的原始 (未归一化) 立方体.
///
/// 区域超出填充后体数据的范围时返回 [`CubeError::PatchOutOfBounds`],
/// 而不是返回被截断的数组.
pub fn crop_padded(data: &ArrayView3<f32>, start: Idx3d) -> CubeResult<Array3<f32>> {
    let (d, h, w) = data.dim();
    check_non_empty((d, h, w))?;

    let padded = (d + 2 * PATCH_PAD.0, h + 2 * PATCH_PAD.1, w + 2 * PATCH_PAD.2);
    let end = (
        start.0.saturating_add(PATCH_SHAPE.0),
        start.1.saturating_add(PATCH_SHAPE.1),
        start.2.saturating_add(PATCH_SHAPE.2),
    );
    if end.0 > padded.0 || end.1 > padded.1 || end.2 > padded.2 {
        return Err(CubeError::PatchOutOfBounds { start, end, padded });
    }

    Ok(wrapped_region(data, start, PATCH_SHAPE, PATCH_PAD))
}

/// 在扫描 `volume` 中, 提取 `(z, y, x)` 顺序的世界坐标 `world_zyx` 处的立方体并归一化.
///
/// 返回数组形状总是 [`PATCH_SHAPE`], 取值总在 `[0, 1]` 内.
pub fn extract_cube(volume: &ScanVolume, world_zyx: Vec3) -> CubeResult<Array3<f32>> {
    let voxel = volume.world_to_voxel(world_zyx);
    let start = voxel_to_index(voxel).ok_or(CubeError::InvalidCoordinate(voxel))?;
    let mut patch = crop_padded(&volume.data(), start)?;
    debug_assert_eq!(patch.dim(), PATCH_SHAPE);
    normalize_in_place(&mut patch);
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::normalize;
    use ndarray::s;

    fn ramp(shape: Idx3d) -> Array3<f32> {
        Array3::from_shape_fn(shape, |(z, y, x)| (z * 10_000 + y * 100 + x) as f32)
    }

    #[test]
    fn test_pad_wrap_like_numpy() {
        let a = ramp((2, 3, 4));
        let p = pad_wrap(&a, (1, 2, 3)).unwrap();
        assert_eq!(p.dim(), (4, 7, 10));

        // 中心区域就是原数组.
        assert_eq!(p.slice(s![1..3, 2..5, 3..7]), a);
        // padded[i] = a[(i - pad) mod n]
        assert_eq!(p[(0, 0, 0)], a[(1, 1, 1)]);
        assert_eq!(p[(3, 6, 9)], a[(0, 1, 2)]);
    }

    #[test]
    fn test_pad_wrap_larger_than_axis() {
        let a = ramp((2, 2, 3));
        let p = pad_wrap(&a, (3, 5, 4)).unwrap();
        assert_eq!(p.dim(), (8, 12, 11));
        for ((z, y, x), v) in p.indexed_iter() {
            if z + 2 < 8 {
                assert_eq!(*v, p[(z + 2, y, x)]);
            }
            if x + 3 < 11 {
                assert_eq!(*v, p[(z, y, x + 3)]);
            }
        }
        assert_eq!(p.slice(s![3..5, 5..7, 4..7]), a);
    }

    #[test]
    fn test_pad_wrap_empty() {
        let a = Array3::<f32>::zeros((0, 3, 3));
        assert!(matches!(pad_wrap(&a, (1, 1, 1)), Err(CubeError::Shape { .. })));
    }

    #[test]
    fn test_crop_padded_matches_materialized_padding() {
        let a = ramp((30, 50, 45));
        let p = pad_wrap(&a, PATCH_PAD).unwrap();
        for start in [(0, 0, 0), (12, 20, 20), (29, 49, 44), (30, 50, 45), (7, 33, 1)] {
            let c = crop_padded(&a.view(), start).unwrap();
            let (z, y, x) = start;
            let expected = p.slice(s![z..z + VOXEL_DEPTH, y..y + VOXEL_WIDTH, x..x + VOXEL_WIDTH]);
            assert_eq!(c, expected, "start {start:?}");
        }
    }

    #[test]
    fn test_crop_padded_out_of_bounds() {
        let a = ramp((30, 50, 45));
        // 填充后为 (54, 90, 85).
        for start in [(31, 0, 0), (0, 51, 0), (0, 0, 46), (usize::MAX, 0, 0)] {
            match crop_padded(&a.view(), start) {
                Err(CubeError::PatchOutOfBounds { padded, .. }) => {
                    assert_eq!(padded, (54, 90, 85))
                }
                other => panic!("start {start:?}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn test_extract_cube_offset_convention() {
        // 取值保持在 [-600, -300] 内, 使归一化可区分各体素.
        let raw = Array3::from_shape_fn((26, 42, 42), |(z, y, x)| {
            -600.0 + (z * 5) as f32 + (y * 2) as f32 + (x * 2) as f32 / 3.0
        });
        let volume = ScanVolume::new(raw.clone(), [-100.0, -50.0, -50.0], [2.0, 0.5, 0.5]);

        // 体素坐标 (12.7, 20.2, 20.9) -> 起点 (12, 20, 20), 恰好抵消填充量.
        let world = [-100.0 + 12.7 * 2.0, -50.0 + 20.2 * 0.5, -50.0 + 20.9 * 0.5];
        let cube = extract_cube(&volume, world).unwrap();
        assert_eq!(cube.dim(), PATCH_SHAPE);

        let expected = normalize(&Array3::from_shape_fn(PATCH_SHAPE, |(z, y, x)| {
            raw[(z % 26, y % 42, x % 42)]
        }));
        assert_eq!(cube, expected);
    }

    #[test]
    fn test_extract_cube_candidate_at_center() {
        let mut raw = Array3::from_elem((30, 50, 50), -1000.0f32);
        raw[(17, 31, 8)] = -450.0;
        let volume = ScanVolume::new(raw, [0.0; 3], [1.0; 3]);

        let cube = extract_cube(&volume, [17.4, 31.0, 8.9]).unwrap();
        assert_eq!(cube[PATCH_PAD], 0.5);
        assert_eq!(cube.iter().filter(|&&v| v != 0.0).count(), 1);
    }

    #[test]
    fn test_extract_cube_normalized() {
        let raw = Array3::from_shape_fn((40, 64, 64), |(z, y, x)| {
            ((z * 131 + y * 17 + x * 7) % 4000) as f32 - 2000.0
        });
        let volume = ScanVolume::new(raw, [0.0; 3], [1.0; 3]);
        let cube = extract_cube(&volume, [39.0, 63.0, 0.0]).unwrap();
        assert_eq!(cube.dim(), (24, 40, 40));
        assert!(cube.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_extract_cube_invalid_geometry() {
        let volume = ScanVolume::new(Array3::zeros((30, 50, 50)), [0.0; 3], [0.0, 1.0, 1.0]);
        // spacing 为 0 时 z 体素坐标为 inf 或 NaN.
        assert!(matches!(
            extract_cube(&volume, [3.0, 1.0, 1.0]),
            Err(CubeError::InvalidCoordinate(_))
        ));
        assert!(matches!(
            extract_cube(&volume, [0.0, 1.0, 1.0]),
            Err(CubeError::InvalidCoordinate(_))
        ));

        let volume = ScanVolume::new(Array3::zeros((30, 50, 50)), [0.0; 3], [1.0; 3]);
        assert!(matches!(
            extract_cube(&volume, [200.0, 1.0, 1.0]),
            Err(CubeError::PatchOutOfBounds { .. })
        ));
    }
}
