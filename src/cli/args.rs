//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::content::SourceMode;

/// Blog writing service: Markdown editor backend, publisher and converters
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: blog.toml)
    #[arg(short = 'C', long, global = true, default_value = "blog.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the editor backend (HTTP API + static files)
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Render Markdown to an HTML body
    #[command(visible_alias = "r")]
    Render {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Print the headings, outline or TOC markup of a document
    #[command(visible_alias = "t")]
    Toc {
        #[command(flatten)]
        io: IoArgs,

        /// Source format (default: from file extension, else markdown)
        #[arg(short, long, value_enum)]
        mode: Option<SourceMode>,

        /// Print the TOC markup instead of the heading list
        #[arg(long, conflicts_with = "json")]
        html: bool,

        /// Print headings and outline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Reduce an HTML page back to Markdown
    Reduce {
        #[command(flatten)]
        io: IoArgs,
    },

    /// Publish a Markdown file as a blog post
    #[command(visible_alias = "p")]
    Publish {
        #[command(flatten)]
        args: PublishArgs,
    },

    /// Generate an SVG cover image
    Cover {
        /// Title printed on the cover
        title: String,

        /// Template id (default, tech, share, tutorial); chosen by title when omitted
        #[arg(short, long)]
        template: Option<String>,
    },
}

/// Input/output arguments shared by the converter commands.
#[derive(clap::Args, Debug, Clone)]
pub struct IoArgs {
    /// Input file (`-` or omitted reads stdin)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

/// Publish command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct PublishArgs {
    /// Markdown file to publish
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Post title (default: first `#` heading, else the file stem)
    #[arg(short, long)]
    pub title: Option<String>,

    /// Tag attached to the post (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,

    /// Cover template id
    #[arg(long)]
    pub cover_template: Option<String>,

    /// Overwrite an existing post instead of creating a new file
    #[arg(long, value_name = "FILENAME")]
    pub update: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["blogsmith", "serve", "-p", "8080"]).unwrap();
        match cli.command {
            Commands::Serve { port, interface } => {
                assert_eq!(port, Some(8080));
                assert!(interface.is_none());
            }
            _ => panic!("expected serve"),
        }
        assert_eq!(cli.config, PathBuf::from("blog.toml"));
    }

    #[test]
    fn test_parse_toc_flags() {
        let cli = Cli::try_parse_from(["blogsmith", "toc", "post.html", "--mode", "html", "--json"]).unwrap();
        match cli.command {
            Commands::Toc { io, mode, html, json } => {
                assert_eq!(io.input, Some(PathBuf::from("post.html")));
                assert_eq!(mode, Some(SourceMode::Html));
                assert!(!html);
                assert!(json);
            }
            _ => panic!("expected toc"),
        }
    }

    #[test]
    fn test_toc_html_conflicts_with_json() {
        assert!(Cli::try_parse_from(["blogsmith", "toc", "--html", "--json"]).is_err());
    }

    #[test]
    fn test_parse_publish_tags() {
        let cli = Cli::try_parse_from([
            "blogsmith", "-v", "publish", "post.md", "--title", "Hello", "--tag", "a", "--tag", "b",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Publish { args } => {
                assert_eq!(args.title.as_deref(), Some("Hello"));
                assert_eq!(args.tags, vec!["a", "b"]);
                assert!(args.update.is_none());
            }
            _ => panic!("expected publish"),
        }
    }

    #[test]
    fn test_verbose_and_version_flags() {
        use clap::CommandFactory;
        Cli::command().debug_assert();

        let cli = Cli::try_parse_from(["blogsmith", "render", "in.md", "-v"]).unwrap();
        assert!(cli.verbose);
        let cli = Cli::try_parse_from(["blogsmith", "--verbose", "cover", "Hi"]).unwrap();
        assert!(cli.verbose);

        let err = Cli::try_parse_from(["blogsmith", "-V"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }
}
