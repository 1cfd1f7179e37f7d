//! An extractor for the IP address of the client that sent a request.

use std::{convert::Infallible, net::SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};

/// The client's IP address, if it could be determined.
///
/// The peer address of the connection is preferred. When the server is run
/// without connect info, e.g. in tests, the first address in the
/// `X-Forwarded-For` header is used instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ConnectInfo(address)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return Ok(Self(Some(address.ip().to_string())));
        }

        let forwarded_for = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|address| address.trim().to_owned())
            .filter(|address| !address.is_empty());

        Ok(Self(forwarded_for))
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{
        extract::{ConnectInfo, FromRequestParts},
        http::Request,
    };

    use super::ClientIp;

    async fn extract(request: Request<()>) -> ClientIp {
        let (mut parts, _) = request.into_parts();

        ClientIp::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn uses_connect_info() {
        let mut request = Request::new(());
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 10], 4000))));

        assert_eq!(
            extract(request).await,
            ClientIp(Some("192.168.1.10".to_owned()))
        );
    }

    #[tokio::test]
    async fn falls_back_to_first_forwarded_address() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .unwrap();

        assert_eq!(
            extract(request).await,
            ClientIp(Some("203.0.113.7".to_owned()))
        );
    }

    #[tokio::test]
    async fn missing_address_is_none() {
        assert_eq!(extract(Request::new(())).await, ClientIp(None));
    }
}
