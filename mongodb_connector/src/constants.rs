pub(crate) const DATABASE_NAME: &str = "product-catalog";

pub(crate) const COLLECTION_PRODUCTS_NAME: &str = "products";
pub(crate) const COLLECTION_PRODUCTS_NAME_INDEX: &str = "products_name_unique";

pub(crate) const COLLECTION_IMAGES_NAME: &str = "images";
pub(crate) const COLLECTION_IMAGES_URL_INDEX: &str = "images_product_url_unique";
