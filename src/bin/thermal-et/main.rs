mod args;

use std::fs;

use anyhow::{Context, Result};
use args::Args;

use thermal_et::{io, model, report::Report};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::from_cmd_line()?;
    let Args {
        input,
        output,
        report,
        is_json,
        clamp,
        params,
    } = args;

    let lst = io::read_lst(&input)?;
    let (rows, cols) = lst.shape();
    eprintln!("Read {}x{} pixels from {}", cols, rows, input.display());

    let run = model::run(&params, &lst, clamp)?;
    io::write_flux_raster(&output, &run.rasters)?;
    eprintln!("Wrote fluxes to {}", output.display());

    let summary = Report::new(input.display().to_string(), &run);
    if let Some(path) = report {
        fs::write(&path, summary.to_string())
            .with_context(|| format!("writing report {}", path.display()))?;
        eprintln!("Wrote report to {}", path.display());
    }
    if is_json {
        serde_json::to_writer(std::io::stdout().lock(), &summary)?;
    } else {
        eprintln!(
            "Mean latent heat flux: {} W/m², mean water: {} mm",
            run.summary.latent_heat_flux.mean, run.summary.water_flux.mean
        );
    }

    Ok(())
}
