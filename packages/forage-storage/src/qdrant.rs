use qdrant_client::qdrant::{Query, QueryPointsBuilder, point_id::PointIdOptions};

use crate::Result;

/// Nearest-neighbour lookup over two collections: one holding topic vectors
/// keyed by topic id, one holding post vectors keyed by post id. Result
/// order is the index's rank order and callers must preserve it.
pub struct QdrantIndex {
	pub client: qdrant_client::Qdrant,
	pub topic_collection: String,
	pub post_collection: String,
	pub vector_dim: u32,
}
impl QdrantIndex {
	pub fn new(cfg: &forage_config::Qdrant) -> Result<Self> {
		let client = qdrant_client::Qdrant::from_url(&cfg.url).build()?;

		Ok(Self {
			client,
			topic_collection: cfg.topic_collection.clone(),
			post_collection: cfg.post_collection.clone(),
			vector_dim: cfg.vector_dim,
		})
	}

	pub async fn similar_topics(
		&self,
		vector: Vec<f32>,
		limit: u64,
		offset: u64,
	) -> Result<Vec<i64>> {
		self.nearest_ids(&self.topic_collection, vector, limit, offset).await
	}

	pub async fn similar_posts(&self, vector: Vec<f32>, limit: u64) -> Result<Vec<i64>> {
		self.nearest_ids(&self.post_collection, vector, limit, 0).await
	}

	async fn nearest_ids(
		&self,
		collection: &str,
		vector: Vec<f32>,
		limit: u64,
		offset: u64,
	) -> Result<Vec<i64>> {
		let mut search = QueryPointsBuilder::new(collection.to_string())
			.query(Query::new_nearest(vector))
			.limit(limit);

		if offset > 0 {
			search = search.offset(offset);
		}

		let response = self.client.query(search).await?;
		let ids = response
			.result
			.into_iter()
			.filter_map(|point| match point.id.and_then(|id| id.point_id_options) {
				Some(PointIdOptions::Num(num)) => Some(num as i64),
				_ => None,
			})
			.collect();

		Ok(ids)
	}
}
