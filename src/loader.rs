//! Background network requests.
//!
//! Requests run as tasks on the tokio runtime; their results come back over a
//! channel that the UI loop drains between frames, so all state changes
//! happen on the UI thread.

use crate::basemap::{fetch_tile, TileCoord};
use crate::data::{fetch_rows, DataRow};
use crate::error::{DatasetError, TileError};
use image::GrayImage;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// A finished request
#[derive(Debug)]
pub enum LoadEvent {
    Dataset(Result<Vec<DataRow>, DatasetError>),
    Tile(TileCoord, Result<GrayImage, TileError>),
}

pub struct Loader {
    handle: Handle,
    client: reqwest::Client,
    tx: UnboundedSender<LoadEvent>,
    rx: UnboundedReceiver<LoadEvent>,
}

impl Loader {
    pub fn new(handle: Handle, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        let (tx, rx) = mpsc::unbounded_channel();
        Ok(Self { handle, client, tx, rx })
    }

    /// Start the dataset download
    pub fn fetch_dataset(&self, url: &str) {
        let client = self.client.clone();
        let tx = self.tx.clone();
        let url = url.to_string();
        self.handle.spawn(async move {
            let result = fetch_rows(&client, &url).await;
            let _ = tx.send(LoadEvent::Dataset(result));
        });
    }

    /// Start a tile download
    pub fn fetch_tile(&self, coord: TileCoord, url: String) {
        debug!(z = coord.z, x = coord.x, y = coord.y, "requesting tile");
        let client = self.client.clone();
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            let result = fetch_tile(&client, &url).await;
            let _ = tx.send(LoadEvent::Tile(coord, result));
        });
    }

    /// Next finished request, without blocking
    pub fn try_next(&mut self) -> Option<LoadEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait for the next finished request
    #[cfg(test)]
    pub async fn next(&mut self) -> Option<LoadEvent> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_dataset_result_arrives_on_channel() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Institution,Latitud,Longitud\nAcme,59.3,18.0\n"))
            .mount(&server)
            .await;

        let mut loader = Loader::new(Handle::current(), Duration::from_secs(5)).unwrap();
        assert!(loader.try_next().is_none());

        loader.fetch_dataset(&format!("{}/pub", server.uri()));
        match loader.next().await {
            Some(LoadEvent::Dataset(Ok(rows))) => assert_eq!(rows[0].institution, "Acme"),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dataset_timeout_is_a_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let mut loader = Loader::new(Handle::current(), Duration::from_millis(100)).unwrap();
        loader.fetch_dataset(&server.uri());
        match loader.next().await {
            Some(LoadEvent::Dataset(Err(DatasetError::Request(e)))) => assert!(e.is_timeout()),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_tile_result_carries_coord() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let mut loader = Loader::new(Handle::current(), Duration::from_secs(5)).unwrap();
        let coord = TileCoord::new(1, 2, 3);
        loader.fetch_tile(coord, format!("{}/3/1/2.png", server.uri()));
        match loader.next().await {
            Some(LoadEvent::Tile(c, Err(TileError::Status(_)))) => assert_eq!(c, coord),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
