pub const TARGET_URL: &str = "https://sandbox.oxylabs.io/products";
pub const SITE_ORIGIN: &str = "https://sandbox.oxylabs.io";
pub const IMPORT_ENDPOINT: &str = "http://laravel.test/api/import";
pub const BROWSER_ENDPOINT: &str = "http://localhost:9222";

/// Storage column width for categories
pub const CATEGORY_MAX_CHARS: usize = 255;

/// Used by the worker when a unit arrives without any category
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Only the rendered DOM strategy falls back to this
pub const RENDERED_FALLBACK_CATEGORY: &str = "General";

pub const DESCRIPTION_ATTRIBUTE: &str = "description";

pub const MAX_IMPORT_ATTEMPTS: u32 = 3;
