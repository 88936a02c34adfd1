use crate::cc::{SpinOrbitalAmplitudes, Triples};
use crate::error::Result;
use crate::utils::contract;
use ndarray::prelude::*;

/// Blocks of the unsymmetrized one-particle density in the spin-orbital basis.
#[derive(Clone, Debug)]
pub struct Gamma1 {
    pub doo: Array2<f64>,
    pub dov: Array2<f64>,
    pub dvo: Array2<f64>,
    pub dvv: Array2<f64>,
}

/// One-particle density intermediates of CCSD, with the (T) corrections if `triples` is given.
///
/// For the gradient (`for_grad`) the (T) part also contains the response of the
/// triples energy to the occupied-virtual Fock block, which enters the vo block.
pub fn gamma1_intermediates(
    amp: &SpinOrbitalAmplitudes,
    triples: Option<&Triples>,
    for_grad: bool,
) -> Result<Gamma1> {
    let (t1, t2, l1, l2) = (&amp.t1, &amp.t2, &amp.l1, &amp.l2);

    let mut doo: Array2<f64> =
        -contract::<Ix2>("ie,je->ij", &[l1, t1])? - 0.5 * contract::<Ix2>("imef,jmef->ij", &[l2, t2])?;
    let mut dvv: Array2<f64> =
        contract::<Ix2>("ma,mb->ab", &[t1, l1])? + 0.5 * contract::<Ix2>("mnea,mneb->ab", &[t2, l2])?;

    let xt1: Array2<f64> = 0.5 * contract::<Ix2>("mnef,inef->mi", &[l2, t2])?;
    let xt2: Array2<f64> =
        0.5 * contract::<Ix2>("mnaf,mnef->ae", &[t2, l2])? + contract::<Ix2>("ma,me->ae", &[t1, l1])?;
    let mut dvo: Array2<f64> = contract::<Ix2>("imae,me->ai", &[t2, l1])?
        - contract::<Ix2>("mi,ma->ai", &[&xt1, t1])?
        - contract::<Ix2>("ie,ae->ai", &[t1, &xt2])?
        + &t1.t();
    let dov: Array2<f64> = l1.clone();

    if let Some(t3) = triples {
        let tc: &Array6<f64> = &t3.connected;
        let total: Array6<f64> = t3.total();
        // only the diagonal of the (T) contributions to the oo and vv blocks is kept
        let goo: Array1<f64> = contract::<Ix1>("iklabc,iklabc->i", &[tc, &total])? / 12.0;
        let gvv: Array1<f64> = contract::<Ix1>("ijkacd,ijkacd->a", &[&total, tc])? / 12.0;
        doo.diag_mut().zip_mut_with(&goo, |d, g| *d -= g);
        dvv.diag_mut().zip_mut_with(&gvv, |d, g| *d += g);
        if for_grad {
            dvo = dvo + 0.25 * contract::<Ix2>("ijab,ijkabc->ck", &[t2, tc])?;
        }
    }

    Ok(Gamma1 { doo, dov, dvo, dvv })
}
