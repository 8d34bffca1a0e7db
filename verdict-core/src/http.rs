// HTTP request and response types

use crate::Error;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

/// HTTP request as seen by a handler.
#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
    pub query_params: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Set a URL-encoded body from key/value pairs.
    pub fn with_form<K, V>(mut self, fields: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let pairs: Vec<(&str, &str)> = fields
            .iter()
            .map(|(key, value)| (key.as_ref(), value.as_ref()))
            .collect();
        // string pairs always encode
        self.body = serde_urlencoded::to_string(&pairs)
            .unwrap_or_default()
            .into_bytes();
        self.with_header("Content-Type", "application/x-www-form-urlencoded")
    }

    /// Set a JSON body.
    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, Error> {
        self.body =
            serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(self.with_header("Content-Type", "application/json"))
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Media type without parameters, lowercased.
    pub fn content_type(&self) -> Option<String> {
        self.header("Content-Type")
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase())
    }

    /// Whether the client asked for a JSON response.
    pub fn wants_json(&self) -> bool {
        self.header("Accept")
            .is_some_and(|accept| accept.contains("/json") || accept.contains("+json"))
    }

    /// Parse the request body as JSON
    pub fn json<T: for<'de> serde::Deserialize<'de>>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Deserialization(e.to_string()))
    }

    /// Decode the body into a data tree according to its content type.
    ///
    /// An empty body yields an empty mapping. Query parameters are merged
    /// underneath body fields.
    pub fn data_tree(&self) -> Result<Value, Error> {
        let mut tree = if self.body.is_empty() {
            Value::Object(serde_json::Map::new())
        } else {
            match self.content_type().as_deref() {
                Some("application/json") => self.json()?,
                Some("application/x-www-form-urlencoded") | None => {
                    crate::parse_form_tree(&self.body)?
                }
                Some(other) => return Err(Error::UnsupportedMediaType(other.to_string())),
            }
        };

        if let Value::Object(map) = &mut tree {
            for (key, value) in &self.query_params {
                map.entry(key.clone())
                    .or_insert_with(|| Value::String(value.clone()));
            }
        }

        Ok(tree)
    }
}

/// HTTP response produced by a handler.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn unprocessable_entity() -> Self {
        Self::new(422)
    }

    /// 302 Found pointing at `location`.
    pub fn redirect(location: impl Into<String>) -> Self {
        Self::new(302).with_header("Location", location)
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn with_json<T: Serialize>(mut self, value: &T) -> Result<Self, Error> {
        self.body =
            serde_json::to_vec(value).map_err(|e| Error::Serialization(e.to_string()))?;
        Ok(self.with_header("Content-Type", "application/json"))
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

impl From<Error> for HttpResponse {
    fn from(error: Error) -> Self {
        let status = error.status_code();
        let body = serde_json::json!({ "message": error.to_string() });
        HttpResponse::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(body.to_string().into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_form_request_data_tree() {
        let req = HttpRequest::post("/form/login")
            .with_form(&[("username", "rahmat"), ("password", "rahmat")]);

        assert_eq!(
            req.content_type().as_deref(),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(
            req.data_tree().unwrap(),
            json!({"username": "rahmat", "password": "rahmat"})
        );
    }

    #[test]
    fn test_json_request_data_tree() {
        let req = HttpRequest::post("/form")
            .with_json(&json!({"address": [{"city": "Jakarta"}]}))
            .unwrap()
            .with_header("Accept", "application/json");

        assert!(req.wants_json());
        assert_eq!(req.data_tree().unwrap()["address"][0]["city"], "Jakarta");
    }

    #[test]
    fn test_query_params_do_not_override_body() {
        let mut req = HttpRequest::post("/form").with_form(&[("username", "body")]);
        req.query_params.insert("username".into(), "query".into());
        req.query_params.insert("page".into(), "2".into());

        let tree = req.data_tree().unwrap();
        assert_eq!(tree["username"], "body");
        assert_eq!(tree["page"], "2");
    }

    #[test]
    fn test_unsupported_media_type() {
        let req = HttpRequest::post("/upload")
            .with_header("content-type", "text/csv")
            .with_body(b"a,b".to_vec());

        let err = req.data_tree().unwrap_err();
        assert_eq!(err.status_code(), 415);
    }

    #[test]
    fn test_redirect_response() {
        let res = HttpResponse::redirect("/form");
        assert_eq!(res.status, 302);
        assert_eq!(res.header("location"), Some("/form"));
        assert!(res.is_redirect());
        assert!(!res.is_success());
    }

    #[test]
    fn test_error_into_response() {
        let res: HttpResponse = Error::BadRequest("broken".into()).into();
        assert_eq!(res.status, 400);
        assert_eq!(res.header("Content-Type"), Some("application/json"));
    }
}
