use clap::{Parser, Subcommand, ValueEnum};

use sitekeeper::client::models::UpdateKind;

#[derive(Parser, Debug)]
#[command(name = "sitekeeper")]
#[command(about = "Remote maintenance client for managed WordPress sites", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate the Remote Manager API key against the site
    ValidateKey(SiteArgs),
    /// Show the site's status report
    Status(SiteArgs),
    /// List pending plugin/theme/core updates
    Updates(SiteArgs),
    /// Update a single plugin, theme, or WordPress core
    Update(UpdateArgs),
}

#[derive(clap::Args, Debug)]
pub struct SiteArgs {
    /// Site base URL (falls back to site.base_url in the config file)
    #[arg(long)]
    pub site: Option<String>,

    /// Remote Manager API key (falls back to the SITEKEEPER_API_KEY
    /// environment variable)
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub site: SiteArgs,

    /// Kind of item to update
    #[arg(long, value_enum)]
    pub kind: KindArg,

    /// Item identifier: plugin `directory/file.php` path or theme
    /// stylesheet. Not required for core updates.
    #[arg(long, default_value = "")]
    pub item: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KindArg {
    Plugin,
    Theme,
    Core,
}

impl From<KindArg> for UpdateKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Plugin => UpdateKind::Plugin,
            KindArg::Theme => UpdateKind::Theme,
            KindArg::Core => UpdateKind::Core,
        }
    }
}
