//! A sample host model: an HTTP request/response pair scripts can inspect and
//! rewrite. Field names follow the usual wire vocabulary and are matched
//! case-insensitively, so `request.url.path` and `request.URL.Path` are the
//! same field.

use std::collections::BTreeMap;

use crate::value::{Access, Record, Slot};

/// Header names to their values, in arrival order per name.
pub type Header = BTreeMap<String, Vec<String>>;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Request {
    pub method: String,
    pub url: Option<Url>,
    pub proto: String,
    pub close: bool,
    pub content_length: i64,
    pub host: String,
    pub remote_addr: String,
    pub request_uri: String,
    pub header: Header,
    pub trailer: Option<Header>,
    pub tls: Option<TlsState>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn new(method: &str, url: &str) -> Self {
        let url = Url::parse(url);
        Request {
            method: method.to_string(),
            proto: "HTTP/1.1".to_string(),
            host: url.host.clone(),
            request_uri: url.request_uri(),
            url: Some(url),
            ..Default::default()
        }
    }
}

impl Access for Request {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Record(self)
    }
}

impl Record for Request {
    fn field_names(&self) -> &'static [&'static str] {
        &[
            "Method",
            "URL",
            "Proto",
            "Close",
            "ContentLength",
            "Host",
            "RemoteAddr",
            "RequestURI",
            "Header",
            "Trailer",
            "TLS",
            "Body",
        ]
    }

    fn field(&mut self, name: &str) -> Option<Slot<'_>> {
        Some(match name {
            "Method" => self.method.slot(),
            "URL" => self.url.slot(),
            "Proto" => self.proto.slot(),
            "Close" => self.close.slot(),
            "ContentLength" => self.content_length.slot(),
            "Host" => self.host.slot(),
            "RemoteAddr" => self.remote_addr.slot(),
            "RequestURI" => self.request_uri.slot(),
            "Header" => self.header.slot(),
            "Trailer" => self.trailer.slot(),
            "TLS" => self.tls.slot(),
            "Body" => Slot::Bytes(&mut self.body),
            _ => return None,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Response {
    pub status: String,
    pub status_code: i64,
    pub proto: String,
    pub header: Header,
    pub content_length: i64,
    pub close: bool,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status_code: i64) -> Self {
        Response {
            status: status_code.to_string(),
            status_code,
            proto: "HTTP/1.1".to_string(),
            ..Default::default()
        }
    }
}

impl Access for Response {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Record(self)
    }
}

impl Record for Response {
    fn field_names(&self) -> &'static [&'static str] {
        &[
            "Status",
            "StatusCode",
            "Proto",
            "Header",
            "ContentLength",
            "Close",
            "Body",
        ]
    }

    fn field(&mut self, name: &str) -> Option<Slot<'_>> {
        Some(match name {
            "Status" => self.status.slot(),
            "StatusCode" => self.status_code.slot(),
            "Proto" => self.proto.slot(),
            "Header" => self.header.slot(),
            "ContentLength" => self.content_length.slot(),
            "Close" => self.close.slot(),
            "Body" => Slot::Bytes(&mut self.body),
            _ => return None,
        })
    }
}

/// The parts of a URL a rule usually cares about.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Url {
    pub scheme: String,
    pub host: String,
    pub path: String,
    pub raw_query: String,
    pub fragment: String,
}

impl Url {
    /// Split `scheme://host/path?query#fragment`. Every part is optional and
    /// nothing is validated or decoded.
    pub fn parse(input: &str) -> Self {
        let mut url = Url::default();
        let mut rest = input;

        if let Some((before, fragment)) = rest.split_once('#') {
            url.fragment = fragment.to_string();
            rest = before;
        }
        if let Some((before, query)) = rest.split_once('?') {
            url.raw_query = query.to_string();
            rest = before;
        }
        if let Some((scheme, after)) = rest.split_once("://") {
            url.scheme = scheme.to_string();
            let (host, path) = match after.find('/') {
                Some(slash) => after.split_at(slash),
                None => (after, ""),
            };
            url.host = host.to_string();
            rest = path;
        }
        url.path = rest.to_string();
        url
    }

    /// Path and query as sent on the request line.
    pub fn request_uri(&self) -> String {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        if self.raw_query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{}", self.raw_query)
        }
    }
}

impl Access for Url {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Record(self)
    }

    fn empty() -> Option<Self> {
        Some(Url::default())
    }
}

impl Record for Url {
    fn field_names(&self) -> &'static [&'static str] {
        &["Scheme", "Host", "Path", "RawQuery", "Fragment"]
    }

    fn field(&mut self, name: &str) -> Option<Slot<'_>> {
        Some(match name {
            "Scheme" => self.scheme.slot(),
            "Host" => self.host.slot(),
            "Path" => self.path.slot(),
            "RawQuery" => self.raw_query.slot(),
            "Fragment" => self.fragment.slot(),
            _ => return None,
        })
    }
}

/// Negotiated connection security.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TlsState {
    pub version: i64,
    pub server_name: String,
    pub handshake_complete: bool,
    pub peer_certificates: Option<Vec<Certificate>>,
}

impl Access for TlsState {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Record(self)
    }

    fn empty() -> Option<Self> {
        Some(TlsState::default())
    }
}

impl Record for TlsState {
    fn field_names(&self) -> &'static [&'static str] {
        &[
            "Version",
            "ServerName",
            "HandshakeComplete",
            "PeerCertificates",
        ]
    }

    fn field(&mut self, name: &str) -> Option<Slot<'_>> {
        Some(match name {
            "Version" => self.version.slot(),
            "ServerName" => self.server_name.slot(),
            "HandshakeComplete" => self.handshake_complete.slot(),
            "PeerCertificates" => self.peer_certificates.slot(),
            _ => return None,
        })
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Certificate {
    pub subject: String,
    pub serial_number: String,
    pub signature: Vec<u8>,
}

impl Access for Certificate {
    fn slot(&mut self) -> Slot<'_> {
        Slot::Record(self)
    }

    fn empty() -> Option<Self> {
        Some(Certificate::default())
    }
}

impl Record for Certificate {
    fn field_names(&self) -> &'static [&'static str] {
        &["Subject", "SerialNumber", "Signature"]
    }

    fn field(&mut self, name: &str) -> Option<Slot<'_>> {
        Some(match name {
            "Subject" => self.subject.slot(),
            "SerialNumber" => self.serial_number.slot(),
            "Signature" => Slot::Bytes(&mut self.signature),
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::Environment;
    use crate::error::AccessError;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn url_parts() {
        let url = Url::parse("https://example.org/a/b?x=1#top");
        assert_eq!(url.scheme, "https");
        assert_eq!(url.host, "example.org");
        assert_eq!(url.path, "/a/b");
        assert_eq!(url.raw_query, "x=1");
        assert_eq!(url.fragment, "top");
        assert_eq!(url.request_uri(), "/a/b?x=1");

        let bare = Url::parse("http://localhost");
        assert_eq!(bare.path, "");
        assert_eq!(bare.request_uri(), "/");
    }

    #[test]
    fn request_defaults() {
        let request = Request::new("GET", "http://localhost:8080/health?deep=1");
        assert_eq!(request.host, "localhost:8080");
        assert_eq!(request.request_uri, "/health?deep=1");
        assert_eq!(request.proto, "HTTP/1.1");
        assert!(request.tls.is_none());
    }

    #[test]
    fn fields_are_case_insensitive() {
        let mut request = Request::new("GET", "http://localhost/index.html");
        let mut env = Environment::new();
        env.insert("request", &mut request);
        assert_eq!(
            env.read("request.url.path").unwrap(),
            Value::Str("/index.html".into())
        );
        assert_eq!(
            env.read("request.URL.Path").unwrap(),
            env.read("request.Url.PATH").unwrap()
        );
    }

    #[test]
    fn absent_chain_is_built_on_write() {
        let mut request = Request::new("GET", "http://localhost/");
        {
            let mut env = Environment::new();
            env.insert("request", &mut request);
            assert_eq!(
                env.read("request.tls.peercertificates.0.signature")
                    .unwrap_err(),
                AccessError::Absent {
                    type_name: "Option<TlsState>".into()
                }
            );
            env.write("request.tls.peercertificates.0.signature", "c2ln")
                .unwrap();
            assert_eq!(
                env.read("request.tls.peercertificates.0.signature")
                    .unwrap()
                    .to_string(),
                "c2ln"
            );
        }
        let certificates = request.tls.unwrap().peer_certificates.unwrap();
        assert_eq!(certificates.len(), 1);
        assert_eq!(certificates[0].signature, b"c2ln".to_vec());
    }

    #[test]
    fn headers_are_multi_valued() {
        let mut request = Request::new("GET", "http://localhost/");
        request
            .header
            .insert("Accept".into(), vec!["text/html".into(), "*/*".into()]);
        let mut env = Environment::new();
        env.insert("request", &mut request);

        assert_eq!(env.read("request.header.accept").unwrap().to_string(), "text/html");
        assert_eq!(env.read("request.header.accept.1").unwrap().to_string(), "*/*");

        env.write("request.header.x-custom", "yes").unwrap();
        assert_eq!(env.read("request.header.X-Custom").unwrap().to_string(), "yes");

        env.clear("request.header.accept").unwrap();
        assert!(env.read("request.header.accept").is_err());
    }

    #[test]
    fn writing_a_read_value_back_changes_nothing() {
        let mut once = Request::new("GET", "http://localhost/");
        let mut twice = once.clone();
        {
            let mut env = Environment::new();
            env.insert("request", &mut once);
            env.write("request.header.x-custom", "hello world").unwrap();
        }
        {
            let mut env = Environment::new();
            env.insert("request", &mut twice);
            env.write("request.header.x-custom", "hello world").unwrap();
            let read_back = env.read("request.header.x-custom").unwrap().to_string();
            env.write("request.header.x-custom", &read_back).unwrap();
        }
        assert_eq!(twice.header, once.header);
        assert_eq!(twice.header["x-custom"], vec!["hello world".to_string()]);
        assert_eq!(twice, once);
    }

    #[test]
    fn clearing_one_header_leaves_the_rest() {
        let mut response = Response::new(302);
        response.header.insert("Server".into(), vec!["nginx".into()]);
        response.header.insert("Location".into(), vec!["/x".into()]);
        {
            let mut env = Environment::new();
            env.insert("response", &mut response);
            env.clear("response.header.server").unwrap();
            assert!(matches!(
                env.read("response.header.server").unwrap_err(),
                AccessError::SegmentNotFound { .. }
            ));
            assert_eq!(env.read("response.header.location").unwrap().to_string(), "/x");
        }
        assert_eq!(response.header.len(), 1);
        assert_eq!(response.header["Location"], vec!["/x".to_string()]);
    }

    #[test]
    fn response_status_code_is_numeric() {
        let mut response = Response::new(200);
        let mut env = Environment::new();
        env.insert("response", &mut response);
        env.write("response.statuscode", "404").unwrap();
        let err = env.write("response.statuscode", "not-found").unwrap_err();
        assert!(matches!(err, AccessError::Coercion { .. }));
        drop(env);
        assert_eq!(response.status_code, 404);
    }
}
