pub(crate) mod cards;
pub mod embedded_data;
pub mod rendered_dom;
pub mod static_selector;

pub use embedded_data::EmbeddedDataExtractor;
pub use rendered_dom::RenderedDomExtractor;
pub use static_selector::StaticSelectorExtractor;
