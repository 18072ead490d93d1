//! Reader of the Enhanced Magnetic Model, distributed as two `.COF` files:
//! a high-degree static field and a low-degree secular variation.
//!
//! Both files use the WMM layout. The static field is read from columns 3–4; the rates
//! from columns 5–6 of the secular-variation file, or from columns 3–4 when the file has
//! only four columns.
use std::sync::Arc;

use camino::Utf8Path;
use tracing::{debug, warn};

use super::wmm::parse_cof;
use crate::{
    coefficients::{
        CombinedSHCoefficients, SHCoefficients, SparseSHCoefficientsConstant,
        SparseSHCoefficientsTimeDependent,
    },
    constants::WMM_VALIDITY_SPAN,
    magmod_errors::MagModError,
};

/// Parse the contents of the EMM static and secular-variation files.
///
/// Return
/// ------
/// * the combination of a constant static source and a secular-variation source
///   vanishing at the epoch; the combination is valid over `[epoch, epoch + 5y]`
pub fn parse_emm(
    static_contents: &str,
    secvar_contents: &str,
) -> Result<CombinedSHCoefficients, MagModError> {
    let (static_header, static_records) = parse_cof(static_contents)?;
    let (secvar_header, secvar_records) = parse_cof(secvar_contents)?;

    if static_header.epoch != secvar_header.epoch {
        warn!(
            static_epoch = static_header.epoch,
            secvar_epoch = secvar_header.epoch,
            "EMM static and secular-variation epochs differ, using the static one"
        );
    }

    let static_coeff = SparseSHCoefficientsConstant::new(
        static_records
            .into_iter()
            .map(|rec| ((rec.n, rec.m), (rec.values[0], rec.values[1]))),
        true,
    )?;

    let secvar_coeff = SparseSHCoefficientsTimeDependent::from_secular_variation(
        static_header.epoch,
        WMM_VALIDITY_SPAN,
        secvar_records.into_iter().map(|rec| {
            let rates = &rec.values[rec.values.len() - 2..];
            ((rec.n, rec.m), (0.0, 0.0, rates[0], rates[1]))
        }),
        true,
    )?;

    debug!(
        model = %static_header.name,
        epoch = static_header.epoch,
        static_degree = static_coeff.degree(),
        secvar_degree = secvar_coeff.degree(),
        "parsed EMM coefficients"
    );

    CombinedSHCoefficients::new(vec![Arc::new(static_coeff), Arc::new(secvar_coeff)])
}

/// Load the EMM static (`EMM2010.COF`) and secular-variation (`EMM2010SV.COF`) files.
pub fn load_emm(
    static_path: &Utf8Path,
    secvar_path: &Utf8Path,
) -> Result<CombinedSHCoefficients, MagModError> {
    debug!(%static_path, %secvar_path, "loading EMM model");
    parse_emm(
        &std::fs::read_to_string(static_path)?,
        &std::fs::read_to_string(secvar_path)?,
    )
}
