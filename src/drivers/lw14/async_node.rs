use super::error::Lw14Error;
use super::node::Lw14Node;
use super::query::QueryResult;
use crate::utils::dyn_future::DynFuture;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Node wrapper for async callers.
///
/// Bus transfers are blocking, so each trigger runs on the blocking thread
/// pool. Triggers on the same node are handled one at a time.
#[derive(Clone)]
pub struct AsyncLw14Node {
    node: Arc<Mutex<Lw14Node>>,
}

impl AsyncLw14Node {
    pub fn new(node: Lw14Node) -> AsyncLw14Node {
        AsyncLw14Node {
            node: Arc::new(Mutex::new(node)),
        }
    }

    pub fn trigger(&self) -> DynFuture<'static, Result<Option<QueryResult>, Lw14Error>> {
        let node = self.node.clone();
        Box::pin(async move {
            let mut node = node.lock_owned().await;
            match tokio::task::spawn_blocking(move || node.trigger()).await {
                Ok(res) => res,
                Err(e) => Err(Lw14Error::Task(e.to_string())),
            }
        })
    }

    /// Close the node once the running invocation, if any, has finished
    pub async fn close(&self) {
        self.node.lock().await.close();
    }
}
