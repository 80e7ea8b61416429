//! Kapsule pool and node calls on the Kubernetes API.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use super::{ApiFuture, Region, ScalewayClient};

const NODES_PAGE_SIZE: u32 = 100;

/// Pool as returned by `GET /k8s/v1/regions/{region}/pools/{pool_id}`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct PoolRecord {
    /// Pool identifier.
    pub id: String,
    /// Pool name.
    #[serde(default)]
    pub name: String,
    /// Raw status string (`ready`, `scaling`, ...).
    pub status: String,
    /// Requested number of nodes.
    pub size: u32,
}

/// Node as returned by `GET /k8s/v1/regions/{region}/nodes`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct NodeRecord {
    /// Node identifier.
    pub id: String,
    /// Node name.
    #[serde(default)]
    pub name: String,
    /// Raw status string (`creating`, `ready`, ...).
    pub status: String,
}

#[derive(Deserialize)]
struct NodePage {
    nodes: Vec<NodeRecord>,
    total_count: u32,
}

#[derive(Serialize)]
struct UpdatePoolRequest {
    size: u32,
}

/// Kubernetes API calls used by the pool operations.
pub trait PoolApi {
    /// Fetches a pool.
    fn get_pool<'a>(&'a self, region: &'a Region, pool_id: &'a str) -> ApiFuture<'a, PoolRecord>;

    /// Lists every node belonging to a pool.
    fn list_pool_nodes<'a>(
        &'a self,
        region: &'a Region,
        pool_id: &'a str,
    ) -> ApiFuture<'a, Vec<NodeRecord>>;

    /// Requests a new pool size. Returns once the change is accepted.
    fn update_pool_size<'a>(
        &'a self,
        region: &'a Region,
        pool_id: &'a str,
        size: u32,
    ) -> ApiFuture<'a, PoolRecord>;

    /// Requests pool deletion. Returns once the change is accepted.
    fn delete_pool<'a>(&'a self, region: &'a Region, pool_id: &'a str)
    -> ApiFuture<'a, PoolRecord>;
}

fn pool_path(region: &Region, pool_id: &str) -> String {
    format!("/k8s/v1/regions/{region}/pools/{pool_id}")
}

impl PoolApi for ScalewayClient {
    fn get_pool<'a>(&'a self, region: &'a Region, pool_id: &'a str) -> ApiFuture<'a, PoolRecord> {
        Box::pin(async move {
            self.send::<PoolRecord>(self.request(Method::GET, &pool_path(region, pool_id)))
                .await
        })
    }

    fn list_pool_nodes<'a>(
        &'a self,
        region: &'a Region,
        pool_id: &'a str,
    ) -> ApiFuture<'a, Vec<NodeRecord>> {
        Box::pin(async move {
            let path = format!("/k8s/v1/regions/{region}/nodes");
            let mut nodes = Vec::new();
            let mut page: u32 = 1;
            loop {
                let request = self.request(Method::GET, &path).query(&[
                    ("pool_id", pool_id.to_owned()),
                    ("page", page.to_string()),
                    ("page_size", NODES_PAGE_SIZE.to_string()),
                ]);
                let batch: NodePage = self.send(request).await?;
                let fetched = batch.nodes.len();
                let total = usize::try_from(batch.total_count).unwrap_or(usize::MAX);
                nodes.extend(batch.nodes);
                if fetched == 0 || nodes.len() >= total {
                    return Ok(nodes);
                }
                page = page.saturating_add(1);
            }
        })
    }

    fn update_pool_size<'a>(
        &'a self,
        region: &'a Region,
        pool_id: &'a str,
        size: u32,
    ) -> ApiFuture<'a, PoolRecord> {
        Box::pin(async move {
            let request = self
                .request(Method::PATCH, &pool_path(region, pool_id))
                .json(&UpdatePoolRequest { size });
            self.send::<PoolRecord>(request).await
        })
    }

    fn delete_pool<'a>(
        &'a self,
        region: &'a Region,
        pool_id: &'a str,
    ) -> ApiFuture<'a, PoolRecord> {
        Box::pin(async move {
            self.send::<PoolRecord>(self.request(Method::DELETE, &pool_path(region, pool_id)))
                .await
        })
    }
}
