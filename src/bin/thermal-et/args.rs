use anyhow::Result;
use clap::value_t_or_exit;
use std::path::PathBuf;
use thermal_et::{
    arg, args_parser,
    cli::{parameter_args, parameters_from_matches},
    opt, ClampMode, ModelParameters,
};

pub struct Args {
    pub input: PathBuf,
    pub output: PathBuf,
    pub report: Option<PathBuf>,
    pub is_json: bool,
    pub clamp: ClampMode,
    pub params: ModelParameters,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let matches = args_parser!("thermal-et")
            .setting(clap::AppSettings::AllowLeadingHyphen)
            .about("Estimate evapotranspiration from a land surface temperature raster.")
            .arg(
                opt!("output")
                    .short("o")
                    .required(true)
                    .help("Output GeoTIFF with the six flux bands"),
            )
            .arg(
                opt!("report")
                    .short("r")
                    .help("Write the text report to this path"),
            )
            .arg(
                opt!("json")
                    .short("j")
                    .takes_value(false)
                    .help("Print the report as json on stdout"),
            )
            .arg(
                opt!("params")
                    .short("p")
                    .help("Json file with model parameters (overridden by options)"),
            )
            .arg(
                opt!("clamp all")
                    .takes_value(false)
                    .help("Clamp valid pixels even when the field holds no-data"),
            )
            .args(&parameter_args())
            .arg(
                arg!("input")
                    .required(true)
                    .help("Land surface temperature GeoTIFF (K, 0 = no-data)"),
            )
            .get_matches();

        let input = value_t_or_exit!(matches, "input", PathBuf);
        let output = value_t_or_exit!(matches, "output", PathBuf);
        let report = matches.value_of("report").map(PathBuf::from);
        let params_file = matches.value_of("params").map(PathBuf::from);
        let params = parameters_from_matches(&matches, params_file.as_deref())?;

        let clamp = if matches.is_present("clamp all") {
            ClampMode::Always
        } else {
            ClampMode::SkipOnNoData
        };
        let is_json = matches.is_present("json");

        Ok(Args {
            input,
            output,
            report,
            is_json,
            clamp,
            params,
        })
    }
}
