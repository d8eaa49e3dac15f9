//! Static names for the headers local-proxy adds to mocked responses.

use hyper::header::{HeaderName, HeaderValue};
use hyper::Response;

pub static X_LOCAL_PROXY_MOCKED: HeaderName = HeaderName::from_static("x-local-proxy-mocked");
pub static X_LOCAL_PROXY_SCENARIO: HeaderName = HeaderName::from_static("x-local-proxy-scenario");

pub static VALUE_TRUE: HeaderValue = HeaderValue::from_static("true");

pub trait HeadersExt {
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue);

    /// Insert a dynamic value. Returns false if it is not a valid header value.
    fn set_header_value(&mut self, name: &HeaderName, value: &str) -> bool;
}

impl<B> HeadersExt for Response<B> {
    fn set_header(&mut self, name: &HeaderName, value: &HeaderValue) {
        self.headers_mut().insert(name.clone(), value.clone());
    }

    fn set_header_value(&mut self, name: &HeaderName, value: &str) -> bool {
        match HeaderValue::from_str(value) {
            Ok(header_value) => {
                self.headers_mut().insert(name.clone(), header_value);
                true
            }
            Err(_) => false,
        }
    }
}
