//! Helpers to parse CLI arguments in the accompanying
//! binary.
//!
//! APIs here shouldn't be considered stable / used as a
//! library.

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
pub use clap::{App, Arg, ArgMatches};
pub use inflector::Inflector;

use crate::params::{ModelParameters, ParameterName};

#[macro_export]
macro_rules! args_parser {
    ($name:expr) => {{
        $crate::cli::App::new($name)
            .version(clap::crate_version!())
            .author(clap::crate_authors!())
    }};
}

#[macro_export]
macro_rules! arg {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name).value_name(&$name.to_screaming_snake_case())
    }};
}

#[macro_export]
macro_rules! opt {
    ($name:expr) => {{
        use $crate::cli::Inflector;
        $crate::cli::Arg::with_name($name)
            .long(&$name.to_kebab_case())
            .value_name(&$name.to_screaming_snake_case())
    }};
}

/// One `--kebab-case VALUE` option per model parameter, named
/// after the parameter.
pub fn parameter_args() -> Vec<Arg<'static, 'static>> {
    ParameterName::ALL
        .iter()
        .map(|name| {
            Arg::with_name(name.as_str())
                .long(name.flag())
                .value_name("VALUE")
                .help(name.help())
        })
        .collect()
}

/// Model parameters from an optional JSON parameter file,
/// overridden by the options from [`parameter_args`].
pub fn parameters_from_matches(
    matches: &ArgMatches,
    params_file: Option<&Path>,
) -> Result<ModelParameters> {
    let mut params = ModelParameters::default();
    if let Some(path) = params_file {
        let file = File::open(path)
            .with_context(|| format!("opening parameter file {}", path.display()))?;
        params
            .apply_json(BufReader::new(file))
            .with_context(|| format!("reading parameter file {}", path.display()))?;
    }
    for name in ParameterName::ALL {
        if let Some(value) = matches.value_of(name.as_str()) {
            params.set(*name, value)?;
        }
    }
    Ok(params)
}
