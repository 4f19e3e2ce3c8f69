use scraper::{ElementRef, Selector};

use crate::errors::ExtractorError;

pub(crate) fn parse_selector(query_string: &str) -> Result<Selector, ExtractorError> {
    Selector::parse(query_string).map_err(|_| ExtractorError::InvalidSelector(query_string.into()))
}

pub(crate) fn element_to_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().into()
}

pub(crate) fn element_extract_attr(element: ElementRef, attr_name: &str) -> Option<String> {
    element
        .attr(attr_name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(crate) fn extract_element_from_element<'a>(
    element: ElementRef<'a>,
    selector: &Selector,
) -> Option<ElementRef<'a>> {
    element.select(selector).next()
}

/// `src` of the first matched image that is a real address. Inline
/// `data:` images are placeholders and never count.
pub(crate) fn first_real_image_src(element: ElementRef, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .filter_map(|image| element_extract_attr(image, "src"))
        .find(|src| !src.starts_with("data:"))
}
