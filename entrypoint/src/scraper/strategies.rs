use std::sync::Arc;

use common::modes::Strategy;
use crawler::{
    errors::CrawlerError,
    protected::{ProtectedCrawler, RenderOptions},
    traits::PageFetcher,
    unprotected::UnprotectedCrawler,
};
use extractors::{
    errors::ExtractorError,
    strategies::{EmbeddedDataExtractor, RenderedDomExtractor, StaticSelectorExtractor},
    structures::{CardSelectors, Extractor},
};
use thiserror::Error;

use crate::cli::Args;

#[derive(Error, Debug)]
pub(crate) enum SetupError {
    #[error(transparent)]
    Crawler(#[from] CrawlerError),
    #[error(transparent)]
    Extractor(#[from] ExtractorError),
}

/// The page fetcher and extractor that belong to one strategy
pub(crate) struct StrategyParts {
    pub(crate) fetcher: Arc<dyn PageFetcher>,
    pub(crate) extractor: Box<dyn Extractor>,
}

pub(crate) fn build_strategy(args: &Args) -> Result<StrategyParts, SetupError> {
    let selectors = CardSelectors::default();
    let http: Arc<dyn PageFetcher> = Arc::new(UnprotectedCrawler::new(args.fetch_options())?);

    let parts = match args.strategy {
        Strategy::StaticSelector => StrategyParts {
            extractor: Box::new(
                StaticSelectorExtractor::new(&selectors, &args.origin, http.clone())?
                    .with_detail_concurrency(args.detail_concurrency),
            ),
            fetcher: http,
        },
        Strategy::EmbeddedData => StrategyParts {
            extractor: Box::new(EmbeddedDataExtractor::new(&selectors, &args.origin)?),
            fetcher: http,
        },
        Strategy::RenderedDom => {
            let render_options =
                RenderOptions::new(selectors.ready_selector()).with_timeout(args.render_timeout());

            StrategyParts {
                extractor: Box::new(RenderedDomExtractor::new(&selectors, &args.origin)?),
                fetcher: Arc::new(ProtectedCrawler::new(&args.browser_endpoint, render_options)),
            }
        }
    };

    Ok(parts)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn every_strategy_builds_its_matching_extractor() {
        for name in ["static-selector", "embedded-data", "rendered-dom"] {
            let args = Args::parse_from(["scraper", "--strategy", name]);
            let parts = build_strategy(&args).unwrap();

            assert_eq!(parts.extractor.strategy(), args.strategy);
        }
    }
}
