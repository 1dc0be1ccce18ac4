//! Command-line argument definitions for the Weft CLI.
//!
//! [`Args`] is parsed from the command line with [`clap`]. Flags given here
//! override the `[generate]` section of the configuration file.

use clap::Parser;

use weft::{CrossingPolicy, RenderStyle};

/// Command-line arguments for the Weft diagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input file (`.weft` source or a `.toml` composition table)
    #[arg(help = "Path to the input file", required_unless_present = "meta")]
    pub input: Option<String>,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Also write the per-rank summary as TOML to this path
    #[arg(long)]
    pub summary: Option<String>,

    /// Leave the cost footer and legend out of the SVG
    #[arg(long)]
    pub no_cost: bool,

    /// Wire crossing policy (minimize, ignore)
    #[arg(long)]
    pub crossing_policy: Option<CrossingPolicy>,

    /// Maximum nesting depth of the composition
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// How bricks are drawn (box, compact)
    #[arg(long)]
    pub render_style: Option<RenderStyle>,

    /// Validate the input and print the result without writing an SVG
    #[arg(long)]
    pub check: bool,

    /// Draw the engine's own pipeline instead of an input file
    #[arg(long)]
    pub meta: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["weft", "pipeline.weft"]).unwrap();

        assert_eq!(args.input.as_deref(), Some("pipeline.weft"));
        assert_eq!(args.output, "out.svg");
        assert_eq!(args.crossing_policy, None);
        assert!(!args.no_cost);
        assert!(!args.meta);
        assert!(!args.check);
        assert_eq!(args.render_style, None);
    }

    #[test]
    fn test_generate_flags() {
        let args = Args::try_parse_from([
            "weft",
            "pipeline.weft",
            "--crossing-policy",
            "ignore",
            "--max-depth",
            "12",
            "--no-cost",
        ])
        .unwrap();

        assert_eq!(args.crossing_policy, Some(CrossingPolicy::Ignore));
        assert_eq!(args.max_depth, Some(12));
        assert!(args.no_cost);
    }

    #[test]
    fn test_input_required_without_meta() {
        assert!(Args::try_parse_from(["weft"]).is_err());
        assert!(Args::try_parse_from(["weft", "--meta"]).is_ok());
    }

    #[test]
    fn test_check_and_render_style() {
        let args =
            Args::try_parse_from(["weft", "a.weft", "--check", "--render-style", "compact"])
                .unwrap();

        assert!(args.check);
        assert_eq!(args.render_style, Some(RenderStyle::Compact));
        assert!(Args::try_parse_from(["weft", "a.weft", "--render-style", "round"]).is_err());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        assert!(Args::try_parse_from(["weft", "a.weft", "--crossing-policy", "shuffle"]).is_err());
    }
}
