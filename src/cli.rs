use bindery_config::Config;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;

/// Binds the documents of a source into one bookmarked PDF e-book.
///
/// Fetched documents and rendered pages are cached between runs, so only new
/// or changed documents cost a download and a render.
#[derive(Debug, Parser)]
#[command(name = "bindery", version)]
pub struct Cli {
    /// Configuration file (defaults to `bindery.toml` in the user configuration directory).
    #[arg(long, env = "BINDERY_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory caching fetched documents and rendered pages.
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Where to write the finished book.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Maximum number of documents rendered at once.
    #[arg(short = 'j', long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,

    /// Do not download the source's stylesheets, scripts and images.
    #[arg(long)]
    pub no_assets: bool,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors.
    #[arg(short, long)]
    pub quiet: bool,

    /// Log JSON lines instead of human-readable output.
    #[arg(long)]
    pub log_json: bool,
}
impl Cli {
    pub fn level(&self) -> LevelFilter {
        match (self.quiet, self.verbose) {
            (true, _) => LevelFilter::WARN,
            (false, 0) => LevelFilter::INFO,
            (false, 1) => LevelFilter::DEBUG,
            (false, _) => LevelFilter::TRACE,
        }
    }

    /// Applies command line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut Config) {
        if let Some(cache_dir) = &self.cache_dir {
            config.cache_dir = cache_dir.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = usize::from(concurrency);
        }
        if self.no_assets {
            config.assets = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    #[test]
    fn test_command_is_consistent() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case(&[], LevelFilter::INFO)]
    #[case(&["-v"], LevelFilter::DEBUG)]
    #[case(&["-vvv"], LevelFilter::TRACE)]
    #[case(&["--quiet"], LevelFilter::WARN)]
    fn test_level(#[case] args: &[&str], #[case] expected: LevelFilter) {
        let cli = Cli::try_parse_from(std::iter::once("bindery").chain(args.iter().copied())).unwrap();
        assert_eq!(cli.level(), expected);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["bindery", "-q", "-v"]).is_err());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from(["bindery", "--cache-dir", "/tmp/cache", "-o", "book.pdf", "-j", "3", "--no-assets"])
            .unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/cache"));
        assert_eq!(config.output, PathBuf::from("book.pdf"));
        assert_eq!(config.concurrency, 3);
        assert!(!config.assets);
    }

    #[test]
    fn test_no_overrides_keep_configuration() {
        let cli = Cli::try_parse_from(["bindery"]).unwrap();
        let mut config = Config::default();
        cli.apply(&mut config);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(Cli::try_parse_from(["bindery", "-j", "0"]).is_err());
    }
}
