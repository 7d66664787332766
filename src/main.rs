//! Blogsmith - Markdown editor backend and publisher for a static blog.

mod cli;
mod config;
mod content;
mod core;
mod embed;
mod logger;
mod post;
mod store;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::BlogConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = BlogConfig::load(&cli)?;
    logger::set_utc_offset(config.site.utc_offset);

    match &cli.command {
        Commands::Serve { .. } => cli::serve::serve(config),
        Commands::Render { io } => cli::convert::render(io, &config),
        Commands::Toc { io, mode, html, json } => cli::convert::toc(io, *mode, *html, *json, &config),
        Commands::Reduce { io } => cli::convert::reduce(io, &config),
        Commands::Publish { args } => cli::publish::publish(args, &config),
        Commands::Cover { title, template } => cli::publish::cover(title, template.as_deref(), &config),
    }
}
