use crate::api;
use crate::client::RecordsClient;
use crate::service::RecordService;
use crate::store::MemoryRecordStore;
use aggregator::Aggregator;
use aggregator::testutils::{TestUpstreamServer, test_client};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Record API served on an ephemeral port, backed by the in-memory store and
/// the mock upstream catalog. Shuts down when dropped.
pub struct TestApp {
    addr: SocketAddr,
    _upstream: TestUpstreamServer,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let upstream = TestUpstreamServer::spawn().await.unwrap();
        let aggregator = Aggregator::new(test_client(), upstream.config());
        let service = RecordService::new(aggregator, Arc::new(MemoryRecordStore::new()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let _ = api::serve(listener, service, async {
                let _ = rx.await;
            })
            .await;
        });

        TestApp {
            addr,
            _upstream: upstream,
            shutdown: Some(tx),
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Plain HTTP client for requests the records client cannot express.
    pub fn http(&self) -> reqwest::Client {
        test_client()
    }

    pub fn client(&self) -> RecordsClient {
        RecordsClient::with_client(test_client(), self.base_url())
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}
