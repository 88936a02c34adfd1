use crate::cc::{SpinOrbitalAmplitudes, Triples};
use crate::error::Result;
use crate::rdm::scratch::{Rdm2Block, ScratchStore};
use crate::utils::contract;
use log::debug;
use ndarray::prelude::*;

/// Antisymmetrized blocks of the two-particle density in the spin-orbital basis.
#[derive(Clone, Debug)]
pub struct Gamma2 {
    pub dovov: Array4<f64>,
    pub dvvvv: Array4<f64>,
    pub doooo: Array4<f64>,
    pub dovvo: Array4<f64>,
    pub dovvv: Array4<f64>,
    pub dooov: Array4<f64>,
}

/// The (T) corrections to the ovov, ovvv and ooov blocks.
#[derive(Clone, Debug)]
pub struct TriplesGamma2 {
    pub dovov: Array4<f64>,
    pub dovvv: Array4<f64>,
    pub dooov: Array4<f64>,
}

fn tr(x: &Array4<f64>, axes: [usize; 4]) -> ArrayView4<f64> {
    x.view().permuted_axes(axes)
}

/// x[0,2,1,3] - x[0,3,1,2]
fn antisym_ov(x: &Array4<f64>) -> Array4<f64> {
    &tr(x, [0, 2, 1, 3]) - &tr(x, [0, 3, 1, 2])
}

pub fn gamma2_intermediates(amp: &SpinOrbitalAmplitudes) -> Result<Gamma2> {
    let (t1, t2, l1, l2) = (&amp.t1, &amp.t2, &amp.l1, &amp.l2);

    let tau: Array4<f64> = t2 + &(2.0 * contract::<Ix4>("ia,jb->ijab", &[t1, t1])?);
    let miajb: Array4<f64> = contract::<Ix4>("ikac,kjcb->iajb", &[l2, t2])?;

    let mut goovv: Array4<f64> = 0.25 * (l2 + &tau);
    let tmp: Array2<f64> = contract::<Ix2>("kc,kica->ia", &[l1, t2])?;
    goovv += &contract::<Ix4>("ia,jb->ijab", &[&tmp, t1])?;
    let tmp: Array2<f64> = contract::<Ix2>("kc,kb->cb", &[l1, t1])?;
    goovv += &(0.5 * contract::<Ix4>("cb,ijca->ijab", &[&tmp, t2])?);
    let tmp: Array2<f64> = contract::<Ix2>("kc,jc->kj", &[l1, t1])?;
    goovv += &(0.5 * contract::<Ix4>("kj,kiab->ijab", &[&tmp, &tau])?);
    let tmp: Array2<f64> = contract::<Ix2>("ldjd->lj", &[&miajb])?;
    goovv -= &(0.25 * contract::<Ix4>("lj,liba->ijab", &[&tmp, &tau])?);
    let tmp: Array2<f64> = contract::<Ix2>("ldlb->db", &[&miajb])?;
    goovv -= &(0.25 * contract::<Ix4>("db,jida->ijab", &[&tmp, &tau])?);
    goovv -= &(0.5 * contract::<Ix4>("ldia,ljbd->ijab", &[&miajb, &tau])?);
    let tmp: Array4<f64> = contract::<Ix4>("klcd,ijcd->ijkl", &[l2, &tau])? / 16.0;
    goovv += &contract::<Ix4>("ijkl,klab->ijab", &[&tmp, &tau])?;

    let gvvvv: Array4<f64> = 0.125 * contract::<Ix4>("ijab,ijcd->abcd", &[&tau, l2])?;
    let goooo: Array4<f64> = 0.125 * contract::<Ix4>("klab,ijab->klij", &[l2, &tau])?;

    let mut gooov: Array4<f64> = -0.25 * contract::<Ix4>("jkba,ib->jkia", &[&tau, l1])?;
    gooov += &contract::<Ix4>("iljk,la->jkia", &[&goooo, t1])?;
    let tmp: Array2<f64> = 0.25 * contract::<Ix2>("icjc->ij", &[&miajb])?;
    gooov -= &contract::<Ix4>("ij,ka->jkia", &[&tmp, t1])?;
    gooov += &(0.5 * contract::<Ix4>("icja,kc->jkia", &[&miajb, t1])?);
    gooov += &(0.25 * contract::<Ix4>("jkab,ib->jkia", &[l2, t1])?);

    let mut govvo: Array4<f64> = contract::<Ix4>("ia,jb->ibaj", &[l1, t1])?;
    govvo += &miajb.view().permuted_axes([0, 3, 1, 2]);
    govvo -= &contract::<Ix4>("ikac,jc,kb->ibaj", &[l2, t1, t1])?;

    let mut govvv: Array4<f64> = 0.25 * contract::<Ix4>("ja,ijcb->iacb", &[l1, &tau])?;
    govvv += &contract::<Ix4>("bcad,id->iabc", &[&gvvvv, t1])?;
    let tmp: Array2<f64> = 0.25 * contract::<Ix2>("kakb->ab", &[&miajb])?;
    govvv += &contract::<Ix4>("ab,ic->iacb", &[&tmp, t1])?;
    govvv += &(0.5 * contract::<Ix4>("kaib,kc->iabc", &[&miajb, t1])?);
    govvv += &(0.25 * contract::<Ix4>("ijbc,ja->iabc", &[l2, t1])?);

    let dovov: Array4<f64> = antisym_ov(&goovv);
    let dovov: Array4<f64> = 0.5 * (&dovov + &tr(&dovov, [2, 3, 0, 1]));
    let dvvvv: Array4<f64> = antisym_ov(&gvvvv);
    let dvvvv: Array4<f64> = &dvvvv + &tr(&dvvvv, [1, 0, 3, 2]);
    let doooo: Array4<f64> = antisym_ov(&goooo);
    let doooo: Array4<f64> = &doooo + &tr(&doooo, [1, 0, 3, 2]);
    let dovvv: Array4<f64> = antisym_ov(&govvv);
    let dooov: Array4<f64> = &tr(&gooov, [0, 2, 1, 3]) - &tr(&gooov, [1, 2, 0, 3]);
    let dovvo: Array4<f64> = tr(&govvo, [0, 2, 1, 3]).to_owned();
    let dovvo: Array4<f64> = 0.5 * (&dovvo + &tr(&dovvo, [3, 2, 1, 0]));

    Ok(Gamma2 {
        dovov,
        dvvvv,
        doooo,
        dovvo,
        dovvv,
        dooov,
    })
}

/// (T) corrections to the two-particle density. The disconnected triples only
/// enter through m3 = 2 tc + td.
pub fn triples_intermediates(amp: &SpinOrbitalAmplitudes, triples: &Triples) -> Result<TriplesGamma2> {
    let (t1, t2) = (&amp.t1, &amp.t2);
    let tc: &Array6<f64> = &triples.connected;

    let goovv: Array4<f64> = 0.25 * contract::<Ix4>("kc,ijkabc->ijab", &[t1, tc])?;
    let dovov: Array4<f64> = antisym_ov(&goovv);

    let m3: Array6<f64> = 2.0 * tc + &triples.disconnected;
    let gooov: Array4<f64> = 0.125 * contract::<Ix4>("imbc,ijkabc->jkma", &[t2, &m3])?;
    let dooov: Array4<f64> = -(&tr(&gooov, [0, 2, 1, 3]) - &tr(&gooov, [1, 2, 0, 3]));
    let govvv: Array4<f64> = 0.125 * contract::<Ix4>("jkae,ijkabc->iceb", &[t2, &m3])?;
    let dovvv: Array4<f64> = antisym_ov(&govvv);

    Ok(TriplesGamma2 { dovov, dovvv, dooov })
}

/// Build the two-particle density blocks and write them to `store`. Each block is
/// released as soon as it is written. The (T) corrections are stored separately.
pub fn gamma2_outcore(
    amp: &SpinOrbitalAmplitudes,
    triples: Option<&Triples>,
    store: &mut ScratchStore,
) -> Result<()> {
    let d2: Gamma2 = gamma2_intermediates(amp)?;
    let Gamma2 {
        dovov,
        dvvvv,
        doooo,
        dovvo,
        dovvv,
        dooov,
    } = d2;
    store.put(Rdm2Block::Ovov, &dovov)?;
    drop(dovov);
    store.put(Rdm2Block::Vvvv, &dvvvv)?;
    drop(dvvvv);
    store.put(Rdm2Block::Oooo, &doooo)?;
    drop(doooo);
    store.put(Rdm2Block::Ovvo, &dovvo)?;
    drop(dovvo);
    store.put(Rdm2Block::Ovvv, &dovvv)?;
    drop(dovvv);
    store.put(Rdm2Block::Ooov, &dooov)?;
    drop(dooov);

    if let Some(t3) = triples {
        let d2t: TriplesGamma2 = triples_intermediates(amp, t3)?;
        store.put(Rdm2Block::TriplesOvov, &d2t.dovov)?;
        store.put(Rdm2Block::TriplesOvvv, &d2t.dovvv)?;
        store.put(Rdm2Block::TriplesOoov, &d2t.dooov)?;
    }
    store.seal()?;
    debug!("two-particle density intermediates written to the scratch file");
    Ok(())
}

/// Read the blocks written by `gamma2_outcore` back and add the (T) corrections
/// if they were stored. Every block is read once.
pub fn load_gamma2(store: &mut ScratchStore) -> Result<Gamma2> {
    let mut d2: Gamma2 = Gamma2 {
        dovov: store.take_array(Rdm2Block::Ovov)?,
        dvvvv: store.take_array(Rdm2Block::Vvvv)?,
        doooo: store.take_array(Rdm2Block::Oooo)?,
        dovvo: store.take_array(Rdm2Block::Ovvo)?,
        dovvv: store.take_array(Rdm2Block::Ovvv)?,
        dooov: store.take_array(Rdm2Block::Ooov)?,
    };
    if store.contains(Rdm2Block::TriplesOvov) {
        d2.dovov += &store.take_array::<Ix4>(Rdm2Block::TriplesOvov)?;
        d2.dovvv += &store.take_array::<Ix4>(Rdm2Block::TriplesOvvv)?;
        d2.dooov += &store.take_array::<Ix4>(Rdm2Block::TriplesOoov)?;
    }
    Ok(d2)
}
