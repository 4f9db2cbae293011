//! HTTP client with shared default headers

use parking_lot::RwLock;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::auth::BearerAuth;
use crate::error::ApiError;
use crate::Result;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    /// Always ends with `/` so relative paths join under it
    base_url: Url,
    /// Applied to every request; shared with the client's `BearerAuth`
    headers: Arc<RwLock<HeaderMap>>,
}

impl ApiClient {
    /// Build a client and the sole write handle for its authorization header
    pub fn new(base_url: Url, timeout: Duration) -> Result<(Self, BearerAuth)> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        let headers = Arc::new(RwLock::new(HeaderMap::new()));

        let client = Self {
            http,
            base_url: with_trailing_slash(base_url),
            headers: Arc::clone(&headers),
        };

        Ok((client, BearerAuth::new(headers)))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Current authorization header, as sent on the next request
    pub fn authorization(&self) -> Option<String> {
        self.headers
            .read()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }

    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let request = self.request(Method::GET, path)?.query(query);
        decode(send(request).await?).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path)?.json(body);
        decode(send(request).await?).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path)?.json(body);
        decode(send(request).await?).await
    }

    /// POST where only the status matters
    pub async fn post<B>(&self, path: &str, body: &B) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let request = self.request(Method::POST, path)?.json(body);
        send(request).await?;
        Ok(())
    }

    pub async fn patch_multipart<T>(&self, path: &str, form: Form) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let request = self.request(Method::PATCH, path)?.multipart(form);
        decode(send(request).await?).await
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.url(path)?;
        let headers = self.headers.read().clone();

        tracing::debug!(method = %method, url = %url, "Sending API request");

        Ok(self.http.request(method, url).headers(headers))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        tracing::debug!(status = %status, url = %response.url(), "API request rejected");
        return Err(ApiError::Status(status));
    }

    Ok(response)
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::bearer_value;
    use mockito::{Matcher, Server};
    use serde_json::{json, Value};

    fn client_for(url: &str) -> (ApiClient, BearerAuth) {
        ApiClient::new(Url::parse(url).unwrap(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_paths_join_under_base() {
        let (client, _auth) = client_for("https://api.example.com/v1");

        assert_eq!(
            client.url("sessions").unwrap().as_str(),
            "https://api.example.com/v1/sessions"
        );
        assert_eq!(
            client.url("/users/avatar").unwrap().as_str(),
            "https://api.example.com/v1/users/avatar"
        );
    }

    #[test]
    fn test_authorization_is_shared_with_handle() {
        let (client, auth) = client_for("https://api.example.com");
        let copy = client.clone();

        assert_eq!(client.authorization(), None);

        auth.set(bearer_value("token-123").unwrap());
        assert_eq!(copy.authorization().as_deref(), Some("Bearer token-123"));

        auth.clear();
        assert_eq!(client.authorization(), None);
    }

    #[tokio::test]
    async fn test_default_headers_are_sent() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/appointments/me")
            .match_header("authorization", "Bearer token-123")
            .match_query(Matcher::UrlEncoded("day".into(), "26".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let (client, auth) = client_for(&server.url());
        auth.set(bearer_value("token-123").unwrap());

        let body: Vec<Value> = client
            .get_json("appointments/me", &[("day", "26")])
            .await
            .unwrap();

        m.assert_async().await;
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_no_authorization_after_clear() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/passwords/forgot")
            .match_header("authorization", Matcher::Missing)
            .with_status(204)
            .create_async()
            .await;

        let (client, auth) = client_for(&server.url());
        auth.set(bearer_value("token-123").unwrap());
        auth.clear();

        client
            .post("passwords/forgot", &json!({ "email": "johndoe@example.com" }))
            .await
            .unwrap();

        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let mut server = Server::new_async().await;
        server
            .mock("PUT", "/profile")
            .with_status(400)
            .with_body(r#"{"status":"error","message":"Old password does not match"}"#)
            .create_async()
            .await;

        let (client, _auth) = client_for(&server.url());

        let result: Result<Value> = client.put_json("profile", &json!({})).await;

        match result {
            Err(ApiError::Status(status)) => assert_eq!(status, reqwest::StatusCode::BAD_REQUEST),
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_body_is_decode_error() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/sessions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let (client, _auth) = client_for(&server.url());

        let result: Result<Value> = client.post_json("sessions", &json!({})).await;
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}
