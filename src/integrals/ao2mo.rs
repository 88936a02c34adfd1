use crate::error::Result;
use crate::utils::dot_axes;
use ndarray::prelude::*;

/// One-electron integrals in the MO basis, C1^T h C2.
pub fn transform_one(h: ArrayView2<f64>, c1: ArrayView2<f64>, c2: ArrayView2<f64>) -> Array2<f64> {
    c1.t().dot(&h.dot(&c2))
}

/// Four-index transformation (pq|rs) = Σ C1_μp C2_νq C3_λr C4_σs (μν|λσ).
/// The transformation is done one index at a time, the first contracted axis
/// always moves to the end, so after four steps the order is restored.
pub fn transform_eri(
    eri: ArrayView4<f64>,
    c1: ArrayView2<f64>,
    c2: ArrayView2<f64>,
    c3: ArrayView2<f64>,
    c4: ArrayView2<f64>,
) -> Result<Array4<f64>> {
    // (μν|λσ) -> [ν,λ,σ,p]
    let step: Array4<f64> = dot_axes(&eri, &c1, &[Axis(0)], &[Axis(0)])?;
    // -> [λ,σ,p,q]
    let step: Array4<f64> = dot_axes(&step, &c2, &[Axis(0)], &[Axis(0)])?;
    // -> [σ,p,q,r]
    let step: Array4<f64> = dot_axes(&step, &c3, &[Axis(0)], &[Axis(0)])?;
    // -> [p,q,r,s]
    dot_axes(&step, &c4, &[Axis(0)], &[Axis(0)])
}
