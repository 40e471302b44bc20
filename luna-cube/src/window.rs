//! CT 强度 (HU) 归一化.

use ndarray::{Array, ArrayBase, Data, Dimension};

use crate::consts::hu::{NORM_OFFSET, NORM_SCALE};

/// 将单个 HU 值归一化到 `[0, 1]`: `(hu + 600) / 300` 后截断.
///
/// `NaN` 映射为 `0.0`, 因此返回值总满足 `0 <= value <= 1`.
#[inline]
pub fn normalize_hu(hu: f32) -> f32 {
    let v = (hu + NORM_OFFSET) / NORM_SCALE;
    if v > 1.0 {
        1.0
    } else if v >= 0.0 {
        v
    } else {
        0.0
    }
}

/// 逐元素归一化, 返回新数组. 常量固定, 不可配置;
/// 需要其它窗口的调用者请使用 [`CtWindow`].
pub fn normalize<S, D>(raw: &ArrayBase<S, D>) -> Array<f32, D>
where
    S: Data<Elem = f32>,
    D: Dimension,
{
    raw.mapv(normalize_hu)
}

/// 逐元素原地归一化.
#[inline]
pub fn normalize_in_place<D: Dimension>(raw: &mut Array<f32, D>) {
    raw.mapv_inplace(normalize_hu);
}

/// CT 窗口, 包含窗位 (window level) 和窗宽 (window width).
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug)]
pub struct CtWindow {
    level: f32,
    width: f32,
}

impl CtWindow {
    /// 与 [`normalize`] 等价的窗口: 窗位 -450, 窗宽 300, 即 `[-600, -300]`.
    pub const LUNG_NODULE: CtWindow = CtWindow {
        level: -450.0,
        width: 300.0,
    };

    /// 构建 CT 窗.
    ///
    /// `level` 和 `width` 必须在合理范围内, 否则返回 `None`.
    pub fn new(level: f32, width: f32) -> Option<CtWindow> {
        if (-1e5..=1e5).contains(&level) && 0.0 < width && width <= 1e5 {
            Some(Self { level, width })
        } else {
            None
        }
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f32 {
        self.level - self.width / 2.0
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f32 {
        self.level + self.width / 2.0
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f32 {
        self.width
    }

    /// 求在当前 CT 窗设置下, `ct` HU 值在 `[0, 1]` 上的位置.
    ///
    /// 如果 `ct` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval_unit(&self, ct: f32) -> Option<f32> {
        if !ct.is_finite() {
            return None;
        }
        let lb = self.lower_bound();
        if ct <= lb {
            Some(0.0)
        } else if ct >= self.upper_bound() {
            Some(1.0)
        } else {
            Some((ct - lb) / self.width)
        }
    }

    /// 以当前窗口逐元素归一化到 `[0, 1]`. 无意义的值映射为 `0.0`.
    pub fn apply<S, D>(&self, raw: &ArrayBase<S, D>) -> Array<f32, D>
    where
        S: Data<Elem = f32>,
        D: Dimension,
    {
        raw.mapv(|v| self.eval_unit(v).unwrap_or(0.0))
    }
}
