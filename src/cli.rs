use std::path::PathBuf;

use clap::Parser;

/// Viewer for one-dimensional labeled arrays.
///
/// Without `--file`, runs a self test on a generated array.
#[derive(Debug, Parser)]
#[command(name = "xrviz", version, about)]
pub struct Cli {
    /// Path to a netCDF (.nc) or JSON array file
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    #[test]
    fn parses_file_flag() {
        let cli = Cli::try_parse_from(["xrviz", "--file", "data.nc"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("data.nc")));
        let cli = Cli::try_parse_from(["xrviz", "-f", "a.json"]).unwrap();
        assert_eq!(cli.file, Some(PathBuf::from("a.json")));
    }

    #[test]
    fn no_arguments_means_self_test() {
        let cli = Cli::try_parse_from(["xrviz"]).unwrap();
        assert!(cli.file.is_none());
    }

    #[test]
    fn version_flag_exits_early() {
        let err = Cli::try_parse_from(["xrviz", "--version"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
        let err = Cli::try_parse_from(["xrviz", "-V"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayVersion);
    }

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
