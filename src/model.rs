//! One model run over a LST field.

use log::info;

use crate::{
    engine::{ClampMode, DerivedRasters, EnergyBalance},
    error::Result,
    params::ModelParameters,
    raster::RasterField,
    resolve::{resolve, ResolvedParameters},
    stats::{summarize, Summary, SummaryStats},
};

/// Everything a run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRun {
    pub parameters: ResolvedParameters,
    pub rasters: DerivedRasters,
    pub summary: SummaryStats,
    pub lst: Summary,
}

/// Resolve `raw` against `lst`, compute every derived field and
/// summarize them. Either everything succeeds or nothing is
/// returned; `raw` and `lst` are left untouched.
pub fn run(raw: &ModelParameters, lst: &RasterField, clamp: ClampMode) -> Result<ModelRun> {
    let parameters = resolve(raw, lst)?;
    let rasters = EnergyBalance::new(clamp).run(lst, &parameters)?;
    let summary = summarize(&rasters);
    let lst = Summary::of_field("lst", lst)?;

    info!(
        "mean latent heat flux {:.2} W/m², mean water {:.4} mm",
        summary.latent_heat_flux.mean, summary.water_flux.mean
    );

    Ok(ModelRun {
        parameters,
        rasters,
        summary,
        lst,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::Error, params::ParameterName};
    use ndarray::array;

    #[test]
    fn leaves_inputs_untouched() -> Result<()> {
        let raw = ModelParameters::default()
            .with(ParameterName::Tmin, "290")?
            .with(ParameterName::Tmax, "305")?
            .with(ParameterName::SurfaceEmissivity, "0.98")?
            .with(ParameterName::AtmosphericTransmissivity, "0.75")?
            .with(ParameterName::ShortwaveIrradiance, "800")?;
        let lst = RasterField::new(array![[290., 295.], [300., 305.]]);
        let (raw_before, lst_before) = (raw.clone(), lst.clone());

        let first = run(&raw, &lst, ClampMode::default())?;
        assert_eq!(raw, raw_before);
        assert_eq!(lst, lst_before);
        assert_eq!(first.lst.min, 290.);
        assert_eq!(first.lst.max, 305.);
        Ok(())
    }

    #[test]
    fn fails_without_partial_output() -> Result<()> {
        let raw = ModelParameters::default()
            .with(ParameterName::TminThreshold, "0.5")?
            .with(ParameterName::TmaxThreshold, "99.5")?;
        let lst = RasterField::new(array![[f64::NAN, f64::NAN]]);
        assert_eq!(
            run(&raw, &lst, ClampMode::default()),
            Err(Error::EmptyField { name: "lst" })
        );
        Ok(())
    }
}
