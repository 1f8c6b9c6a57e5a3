//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use tutor_common::LogFormat;

#[derive(Parser, Debug, Default)]
#[command(name = "tutor-offline", version)]
#[command(about = "Run the Math Tutor offline worker against a live or simulated network")]
pub struct Args {
    /// Config file (default: platform config dir)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Simulate an unreachable network
    #[arg(long)]
    pub offline: bool,

    /// Resolve a subresource request (repeatable)
    #[arg(long, value_name = "URL")]
    pub fetch: Vec<String>,

    /// Resolve a navigation request (repeatable)
    #[arg(long, value_name = "URL")]
    pub navigate: Vec<String>,

    /// Deliver a push message, optionally with a text payload
    #[arg(long, value_name = "TEXT", num_args = 0..=1)]
    pub push: Option<Option<String>>,

    /// Click the last notification (explore, close)
    #[arg(long, value_name = "ACTION", requires = "push")]
    pub click: Option<String>,

    /// Fire a background sync event
    #[arg(long, value_name = "TAG")]
    pub sync: Option<String>,

    /// Do not save the cache snapshot
    #[arg(long)]
    pub no_persist: bool,

    /// pretty, compact or json
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("tutor-offline").chain(args.iter().copied()))
    }

    #[test]
    fn test_repeatable_and_flags() {
        let args = parse(&[
            "--offline",
            "--fetch",
            "https://tutor.example/static/js/app.js",
            "--fetch",
            "https://tutor.example/api/progress",
            "--navigate",
            "https://tutor.example/",
            "--no-persist",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert!(args.offline);
        assert!(args.no_persist);
        assert_eq!(args.fetch.len(), 2);
        assert_eq!(args.navigate, vec!["https://tutor.example/".to_string()]);
        assert_eq!(args.log_format, LogFormat::Json);
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.log_format, LogFormat::Pretty);
        assert!(args.push.is_none());
        assert!(args.fetch.is_empty());
        assert!(!args.verbose);
    }

    #[test]
    fn test_push_payload_is_optional() {
        let args = parse(&["--push", "--click", "explore"]).unwrap();
        assert_eq!(args.push, Some(None));
        assert_eq!(args.click.as_deref(), Some("explore"));

        let args = parse(&["--push", "Quiz graded"]).unwrap();
        assert_eq!(args.push, Some(Some("Quiz graded".to_string())));
    }

    #[test]
    fn test_errors() {
        assert!(parse(&["--fetch"]).is_err());
        assert!(parse(&["--log-format", "xml"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
        assert!(parse(&["--click", "explore"]).is_err());
    }
}
