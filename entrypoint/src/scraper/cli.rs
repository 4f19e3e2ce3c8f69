use std::time::Duration;

use clap::Parser;
use common::{
    constants::{BROWSER_ENDPOINT, IMPORT_ENDPOINT, SITE_ORIGIN, TARGET_URL},
    modes::{RunMode, Strategy},
};
use crawler::unprotected::FetchOptions;

/// Scrapes the product listing and hands the records to the ingestion API
#[derive(Debug, Parser)]
#[command(name = "scraper", version)]
pub(crate) struct Args {
    /// How listing cards are read
    #[arg(long, value_enum, default_value_t = Strategy::EmbeddedData)]
    pub(crate) strategy: Strategy,

    /// `replace` deletes every stored product before the run
    #[arg(long, value_enum, default_value_t = RunMode::Append)]
    pub(crate) mode: RunMode,

    #[arg(long, default_value = TARGET_URL)]
    pub(crate) url: String,

    /// Base for relative links and image paths
    #[arg(long, default_value = SITE_ORIGIN)]
    pub(crate) origin: String,

    #[arg(long, default_value = IMPORT_ENDPOINT)]
    pub(crate) import_endpoint: String,

    /// Remote browser used by the rendered-dom strategy
    #[arg(long, default_value = BROWSER_ENDPOINT)]
    pub(crate) browser_endpoint: String,

    #[arg(long, default_value_t = 20)]
    pub(crate) timeout_secs: u64,

    /// How long to wait for listing cards to appear in the browser
    #[arg(long, default_value_t = 30)]
    pub(crate) render_timeout_secs: u64,

    /// Verify TLS certificates, the sandbox target uses test certificates
    #[arg(long)]
    pub(crate) verify_tls: bool,

    /// Detail pages fetched at once by the static-selector strategy
    #[arg(long, default_value_t = 4)]
    pub(crate) detail_concurrency: usize,
}

impl Args {
    pub(crate) fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.timeout_secs),
            accept_invalid_certs: !self.verify_tls,
        }
    }

    pub(crate) fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}
