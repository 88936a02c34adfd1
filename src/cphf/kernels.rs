use crate::cphf::ResponseKernel;
use crate::error::Result;
use crate::initialization::{SpinPair, UhfReference};
use crate::integrals::{get_jk, get_jk_spin};
use ndarray::prelude::*;

/// Two-electron response to an imaginary (antisymmetric) perturbation such as the
/// spin-orbit operator. Only exchange contributes: v = -K[D - D^T].
pub struct ImaginaryKernel<'a> {
    eri: ArrayView4<'a, f64>,
    orbo: SpinPair<ArrayView2<'a, f64>>,
    orbv: SpinPair<ArrayView2<'a, f64>>,
}

impl<'a> ImaginaryKernel<'a> {
    pub fn new(eri: ArrayView4<'a, f64>, reference: &'a UhfReference) -> Self {
        ImaginaryKernel {
            eri,
            orbo: reference.orbo(),
            orbv: reference.orbv(),
        }
    }

    fn apply_spin(&self, x: &Array3<f64>, orbo: ArrayView2<f64>, orbv: ArrayView2<f64>) -> Result<Array3<f64>> {
        let mut v1: Array3<f64> = Array3::zeros(x.raw_dim());
        for (xc, mut vc) in x.outer_iter().zip(v1.outer_iter_mut()) {
            let dm: Array2<f64> = orbv.dot(&xc).dot(&orbo.t());
            let dm: Array2<f64> = &dm - &dm.t();
            let (_, vk) = get_jk(self.eri, dm.view())?;
            vc.assign(&(-orbv.t().dot(&vk).dot(&orbo)));
        }
        Ok(v1)
    }
}

impl<'a> ResponseKernel for ImaginaryKernel<'a> {
    fn apply(&self, x: &SpinPair<Array3<f64>>) -> Result<SpinPair<Array3<f64>>> {
        Ok(SpinPair::new(
            self.apply_spin(&x.alpha, self.orbo.alpha, self.orbv.alpha)?,
            self.apply_spin(&x.beta, self.orbo.beta, self.orbv.beta)?,
        ))
    }
}

/// Two-electron response to a real (symmetric) perturbation, used for the orbital
/// relaxation of the gradient: v_σ = J[D_α + D_β] - K[D_σ] with D_σ = C_v x C_o^T + h.c.
pub struct RealKernel<'a> {
    eri: ArrayView4<'a, f64>,
    orbo: SpinPair<ArrayView2<'a, f64>>,
    orbv: SpinPair<ArrayView2<'a, f64>>,
}

impl<'a> RealKernel<'a> {
    pub fn new(eri: ArrayView4<'a, f64>, reference: &'a UhfReference) -> Self {
        RealKernel {
            eri,
            orbo: reference.orbo(),
            orbv: reference.orbv(),
        }
    }
}

impl<'a> ResponseKernel for RealKernel<'a> {
    fn apply(&self, x: &SpinPair<Array3<f64>>) -> Result<SpinPair<Array3<f64>>> {
        let mut va: Array3<f64> = Array3::zeros(x.alpha.raw_dim());
        let mut vb: Array3<f64> = Array3::zeros(x.beta.raw_dim());
        for (c, (xa, xb)) in x.alpha.outer_iter().zip(x.beta.outer_iter()).enumerate() {
            let dma: Array2<f64> = self.orbv.alpha.dot(&xa).dot(&self.orbo.alpha.t());
            let dmb: Array2<f64> = self.orbv.beta.dot(&xb).dot(&self.orbo.beta.t());
            let dma: Array2<f64> = &dma + &dma.t();
            let dmb: Array2<f64> = &dmb + &dmb.t();
            let v: SpinPair<Array2<f64>> = get_jk_spin(self.eri, &SpinPair::new(dma.view(), dmb.view()))?;
            va.slice_mut(s![c, .., ..])
                .assign(&self.orbv.alpha.t().dot(&v.alpha).dot(&self.orbo.alpha));
            vb.slice_mut(s![c, .., ..])
                .assign(&self.orbv.beta.t().dot(&v.beta).dot(&self.orbo.beta));
        }
        Ok(SpinPair::new(va, vb))
    }
}
