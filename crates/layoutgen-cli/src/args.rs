//! Command-line surface for `layoutgen-cli`.

#![deny(clippy::all, clippy::pedantic)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "layoutgen-cli",
    version,
    about = "Browse catalogs and request renders from a layoutgen server",
    long_about = None
)]
pub struct Cli {
    /// Server base URL, e.g. <http://localhost:3000>
    #[arg(long, env = "LAYOUTGEN_SITE_URL")]
    pub site: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Slide catalog
    Slides(CatalogArgs),
    /// Infographic catalog
    Infographics(CatalogArgs),
    /// Submit a layout file for rendering
    Generate(GenerateArgs),
}

#[derive(Parser, Debug)]
pub struct CatalogArgs {
    #[command(subcommand)]
    pub action: CatalogCmd,
}

#[derive(Subcommand, Debug)]
pub enum CatalogCmd {
    /// List every entry with its image URLs
    List,
    /// Show one entry with its full layout document
    Show { index: String },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// JSON file holding an array of layout documents
    pub file: PathBuf,

    /// Download the rendered image and overlay into this directory
    #[arg(long)]
    pub download: Option<PathBuf>,
}
