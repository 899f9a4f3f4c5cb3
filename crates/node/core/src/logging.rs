//! Logging setup for tally binaries.

use eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::args::LogArgs;

/// Build the filter from command line arguments.
///
/// Precedence:
/// 1. If `--quiet` is set, only errors are shown
/// 2. Otherwise, start with `RUST_LOG` if set, or the level implied by `-v` counts
/// 3. Apply any custom directives from `--log.filter`
pub fn build_filter(args: &LogArgs) -> EnvFilter {
    if args.quiet {
        return EnvFilter::new("error");
    }

    let mut filter = if args.verbosity > 0 {
        EnvFilter::new(args.level())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.level()))
    };

    if let Some(custom) = &args.filter {
        for directive in custom.split(',').filter(|d| !d.trim().is_empty()) {
            match directive.trim().parse() {
                Ok(d) => filter = filter.add_directive(d),
                Err(err) => eprintln!("ignoring invalid log directive {directive:?}: {err}"),
            }
        }
    }

    filter
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(args: &LogArgs) -> Result<()> {
    let filter = build_filter(args);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if args.json {
        builder
            .json()
            .try_init()
            .map_err(|err| eyre::eyre!("failed to install logger: {err}"))
    } else {
        builder
            .without_time()
            .try_init()
            .map_err(|err| eyre::eyre!("failed to install logger: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_ignores_directives() {
        let args = LogArgs {
            quiet: true,
            filter: Some("tally_ledger=trace".into()),
            ..Default::default()
        };
        assert_eq!(build_filter(&args).to_string(), "error");
    }

    #[test]
    fn test_custom_directives_added() {
        let args = LogArgs {
            verbosity: 1,
            filter: Some("tally_view=trace, ,".into()),
            ..Default::default()
        };
        let filter = build_filter(&args).to_string();
        assert!(filter.contains("tally_view=trace"));
        assert!(filter.contains("debug"));
    }
}
