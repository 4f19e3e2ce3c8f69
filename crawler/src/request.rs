use serde_json::Value;

use crate::traits::HttpMethod;

#[derive(Debug)]
pub struct Request {
    pub(crate) method: HttpMethod,
    pub(crate) url: String,
    pub(crate) json: Option<Value>,
    pub(crate) headers: Vec<(String, String)>,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            method: HttpMethod::GET,
            url: String::new(),
            json: None,
            headers: Vec::new(),
        }
    }
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::new()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Default)]
pub struct RequestBuilder {
    request: Request,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_method(mut self, method: HttpMethod) -> Self {
        self.request.method = method;

        self
    }

    pub fn set_url(mut self, url: impl Into<String>) -> Self {
        self.request.url = url.into();

        self
    }

    /// Sets a JSON body, and switches the method to POST
    pub fn set_json_body(mut self, json: Value) -> Self {
        self.request.method = HttpMethod::POST;
        self.request.json = Some(json);

        self
    }

    pub fn add_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.request.headers.push((key.into(), value.into()));

        self
    }

    pub fn build(self) -> Request {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn json_body_switches_to_post() {
        let request = RequestBuilder::new()
            .set_url("http://ingest.test/api/import")
            .set_json_body(json!({"products": []}))
            .add_header("Accept", "application/json")
            .build();

        assert!(matches!(request.method, HttpMethod::POST));
        assert_eq!(request.url(), "http://ingest.test/api/import");
        assert_eq!(request.headers.len(), 1);
    }

    #[test]
    fn defaults_to_get() {
        let request = Request::builder().set_url("https://sandbox.test").build();

        assert!(matches!(request.method, HttpMethod::GET));
        assert!(request.json.is_none());
    }
}
