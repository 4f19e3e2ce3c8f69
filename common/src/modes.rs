use clap::ValueEnum;
use strum_macros::{Display, EnumString};

/// What happens to already stored products before a scrape run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum RunMode {
    /// Upsert on top of whatever is stored
    #[default]
    Append,
    /// Delete every product (and its images) first
    Replace,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum Strategy {
    StaticSelector,
    #[default]
    EmbeddedData,
    RenderedDom,
}
