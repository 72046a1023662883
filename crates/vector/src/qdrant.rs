//! [`VectorStore`] over the Qdrant gRPC API.

use std::collections::HashMap;

use async_trait::async_trait;
use dbsage_core::QdrantConfig;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointId, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder, point_id,
};
use qdrant_client::{Payload as QdrantPayload, Qdrant};

use crate::error::VectorError;
use crate::types::{Payload, PayloadFilter, ScoredPayload, VectorPoint};
use crate::VectorStore;

pub struct QdrantStore {
    client: Qdrant,
    url: String,
}

impl std::fmt::Debug for QdrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QdrantStore").field("url", &self.url).finish_non_exhaustive()
    }
}

impl QdrantStore {
    pub fn new(config: &QdrantConfig) -> Result<Self, VectorError> {
        let url = config.url();
        let client = Qdrant::from_url(&url)
            .api_key(config.api_key.clone())
            .build()
            .map_err(|e| VectorError::ClientInit(format!("qdrant client init failed for {url}: {e}")))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn collection_exists(&self, collection: &str) -> Result<bool, VectorError> {
        Ok(self.client.collection_exists(collection).await?)
    }

    async fn create_collection(&self, collection: &str, dimension: usize) -> Result<(), VectorError> {
        let size = u64::try_from(dimension).unwrap_or(u64::MAX);
        self.client
            .create_collection(
                CreateCollectionBuilder::new(collection)
                    .vectors_config(VectorParamsBuilder::new(size, Distance::Cosine)),
            )
            .await?;
        Ok(())
    }

    async fn delete_collection(&self, collection: &str) -> Result<(), VectorError> {
        self.client.delete_collection(collection).await?;
        Ok(())
    }

    async fn upsert_points(
        &self,
        collection: &str,
        points: Vec<VectorPoint>,
    ) -> Result<(), VectorError> {
        let points = points
            .into_iter()
            .map(|p| {
                let payload = QdrantPayload::try_from(serde_json::Value::Object(p.payload))
                    .map_err(|e| VectorError::Payload(e.to_string()))?;
                Ok(PointStruct::new(p.id, p.vector, payload))
            })
            .collect::<Result<Vec<_>, VectorError>>()?;
        let count = points.len();
        self.client.upsert_points(UpsertPointsBuilder::new(collection, points).wait(true)).await?;
        tracing::debug!(collection, count, "points upserted");
        Ok(())
    }

    async fn query_points(
        &self,
        collection: &str,
        vector: Vec<f32>,
        filter: Option<PayloadFilter>,
        limit: usize,
    ) -> Result<Vec<ScoredPayload>, VectorError> {
        let limit = u64::try_from(limit).unwrap_or(u64::MAX);
        let mut request = SearchPointsBuilder::new(collection, vector, limit).with_payload(true);
        if let Some(filter) = filter {
            request = request.filter(Filter::must([Condition::matches(filter.key, filter.value)]));
        }
        let response = self.client.search_points(request).await?;

        Ok(response
            .result
            .into_iter()
            .map(|point| ScoredPayload {
                id: point.id.map(point_id_to_string).unwrap_or_default(),
                score: point.score,
                payload: payload_to_json(point.payload),
            })
            .collect())
    }
}

fn point_id_to_string(id: PointId) -> String {
    match id.point_id_options {
        Some(point_id::PointIdOptions::Uuid(u)) => u,
        Some(point_id::PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

fn payload_to_json(payload: HashMap<String, Value>) -> Payload {
    payload.into_iter().map(|(k, v)| (k, value_to_json(v))).collect()
}

fn value_to_json(v: Value) -> serde_json::Value {
    match v.kind {
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
        Some(Kind::DoubleValue(x)) => serde_json::Value::from(x),
        Some(Kind::IntegerValue(x)) => serde_json::Value::from(x),
        Some(Kind::StringValue(x)) => serde_json::Value::from(x),
        Some(Kind::BoolValue(x)) => serde_json::Value::from(x),
        Some(Kind::StructValue(s)) => serde_json::Value::Object(
            s.fields.into_iter().map(|(k, v)| (k, value_to_json(v))).collect(),
        ),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(value_to_json).collect())
        },
    }
}
