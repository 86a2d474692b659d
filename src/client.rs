//! Single-shot client: connect, send one request, read one reply.

use crate::config::{Config, ConfigError};
use crate::net::{self, NetError};
use crate::protocol::{read_frame, write_all, ConversionMode, ExchangeError, Request};
use bytes::BytesMut;
use thiserror::Error;
use tokio::net::TcpStream;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Error opening output: {0}")]
    Net(#[from] NetError),

    #[error(transparent)]
    Exchange(#[from] ExchangeError),

    #[error("request of {len} bytes does not fit the {max}-byte request buffer")]
    RequestTooLarge { len: usize, max: usize },
}

pub struct Client {
    stream: TcpStream,
    buffer_size: usize,
}

impl Client {
    pub async fn connect(address: &str, port: u16, buffer_size: usize) -> Result<Client, ClientError> {
        let stream = net::connect_client(address, port).await?;
        Ok(Client {
            stream,
            buffer_size,
        })
    }

    /// Send `<mode>|<message>` and wait for the converted message.
    ///
    /// Consumes the client: the connection carries exactly one exchange and
    /// is closed when this returns. An empty reply means the server closed
    /// without answering, which is what it does with a malformed request.
    pub async fn convert(mut self, mode: ConversionMode, message: &[u8]) -> Result<BytesMut, ClientError> {
        let frame = Request::encode(mode, message);
        let max = self.buffer_size.saturating_sub(1);
        if frame.len() > max {
            return Err(ClientError::RequestTooLarge {
                len: frame.len(),
                max,
            });
        }

        let written = write_all(&mut self.stream, &frame).await?;
        debug!(bytes = written, "Request sent");

        let response = read_frame(&mut self.stream, max).await?;
        if response.is_empty() {
            warn!("Server closed the connection without a response");
        }
        Ok(response)
    }
}

/// Run the client flow described by `config`.
pub async fn run(config: &Config) -> Result<BytesMut, ClientError> {
    let address = config.connect_address()?;
    let message = config.options.message.as_deref().unwrap_or_default();

    let client = Client::connect(address, config.options.out_port, config.buffer_size).await?;
    client
        .convert(config.options.conversion, message.as_bytes())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Options;
    use crate::server::Server;
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client_config(port: u16, message: &str, conversion: ConversionMode) -> Config {
        Config {
            options: Options {
                message: Some(message.to_string()),
                in_address: Some("127.0.0.1".to_string()),
                out_address: Some("127.0.0.1".to_string()),
                in_port: port,
                out_port: port,
                conversion,
            },
            backlog: 5,
            buffer_size: 128,
            log_level: "warn".to_string(),
        }
    }

    fn start_server() -> SocketAddr {
        let server = Server::bind(&client_config(0, "", ConversionMode::None)).unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(async move { server.run().await });
        addr
    }

    #[tokio::test]
    async fn test_upper_round_trip() {
        let addr = start_server();
        let config = client_config(addr.port(), "hello", ConversionMode::Upper);
        let response = run(&config).await.unwrap();
        assert_eq!(&response[..], b"HELLO");
    }

    #[tokio::test]
    async fn test_lower_round_trip() {
        let addr = start_server();
        let config = client_config(addr.port(), "WORLD", ConversionMode::Lower);
        let response = run(&config).await.unwrap();
        assert_eq!(&response[..], b"world");
    }

    #[tokio::test]
    async fn test_sends_exact_frame() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let peer = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 64];
            let n = stream.read(&mut buf).await.unwrap();
            stream.write_all(b"ok").await.unwrap();
            buf[..n].to_vec()
        });

        let client = Client::connect("127.0.0.1", port, 128).await.unwrap();
        let response = client.convert(ConversionMode::None, b"Hi there").await.unwrap();

        assert_eq!(&response[..], b"ok");
        assert_eq!(peer.await.unwrap(), b"none|Hi there");
    }

    #[tokio::test]
    async fn test_empty_reply_on_malformed() {
        let addr = start_server();
        // "upper|" with an empty message is rejected by the server.
        let client = Client::connect("127.0.0.1", addr.port(), 128).await.unwrap();
        let response = client.convert(ConversionMode::Upper, b"").await.unwrap();
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn test_request_too_large() {
        let addr = start_server();
        let client = Client::connect("127.0.0.1", addr.port(), 16).await.unwrap();
        match client.convert(ConversionMode::Upper, b"this is far too long").await {
            Err(ClientError::RequestTooLarge { len, max }) => {
                assert_eq!(len, 26);
                assert_eq!(max, 15);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let port = {
            let probe = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            probe.local_addr().unwrap().port()
        };
        let config = client_config(port, "hello", ConversionMode::Upper);
        match run(&config).await {
            Err(ClientError::Net(NetError::Connect { .. })) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_address() {
        let mut config = client_config(9999, "hello", ConversionMode::Upper);
        config.options.out_address = Some("not-an-address".to_string());
        match run(&config).await {
            Err(ClientError::Net(NetError::AddressFamily { address })) => {
                assert_eq!(address, "not-an-address")
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
