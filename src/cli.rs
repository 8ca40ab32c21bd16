//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Archive course files and pages from a Canvas-style LMS.
///
/// Coursedump walks every course visible on the dashboard, downloads file
/// attachments, and converts content pages to Markdown with embedded file
/// references rewritten to the local copies.
#[derive(Parser, Debug)]
#[command(name = "coursedump")]
#[command(author, version, about)]
pub struct Args {
    /// Base URL of the LMS instance (e.g. https://school.instructure.com)
    #[arg(short, long)]
    pub base_url: String,

    /// JSON cookie export of an authenticated browser session
    #[arg(short, long, default_value = "canvas_cookies.json")]
    pub cookies: PathBuf,

    /// Directory to archive courses into
    #[arg(short, long, default_value = "CanvasDownloads")]
    pub output: PathBuf,

    /// Fixed pause after each file download in milliseconds (0 to disable, max 60000)
    #[arg(short = 'd', long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub delay_ms: u64,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let args = Args::try_parse_from(["coursedump", "-b", "https://school.edu"]).unwrap();
        assert_eq!(args.base_url, "https://school.edu");
        assert_eq!(args.cookies, PathBuf::from("canvas_cookies.json"));
        assert_eq!(args.output, PathBuf::from("CanvasDownloads"));
        assert_eq!(args.delay_ms, 500);
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
    }

    #[test]
    fn test_cli_base_url_is_required() {
        let result = Args::try_parse_from(["coursedump"]);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args =
            Args::try_parse_from(["coursedump", "-b", "https://school.edu", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag() {
        let args =
            Args::try_parse_from(["coursedump", "-b", "https://school.edu", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_delay_bounds() {
        let args = Args::try_parse_from([
            "coursedump",
            "-b",
            "https://school.edu",
            "--delay-ms",
            "0",
        ])
        .unwrap();
        assert_eq!(args.delay_ms, 0);

        let result = Args::try_parse_from([
            "coursedump",
            "-b",
            "https://school.edu",
            "--delay-ms",
            "60001",
        ]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_custom_paths() {
        let args = Args::try_parse_from([
            "coursedump",
            "-b",
            "https://school.edu",
            "-c",
            "session.json",
            "-o",
            "archive",
        ])
        .unwrap();
        assert_eq!(args.cookies, PathBuf::from("session.json"));
        assert_eq!(args.output, PathBuf::from("archive"));
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["coursedump", "--help"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }
}
