use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Qdrant, QdrantError,
	qdrant::{
		Condition, Filter, PointId, Query, QueryPointsBuilder, ScoredPoint, Value, VectorInput,
		point_id::PointIdOptions, value::Kind,
	},
};

use crate::{Error, Result, SearchHits, SearchRequest};
use counsel_domain::{
	hit::{DocType, ScoredHit},
	lexical,
	objection::ObjectionType,
	query::FilterExpr,
};

pub const DENSE_VECTOR_NAME: &str = "dense";
pub const BM25_VECTOR_NAME: &str = "bm25";
/// Payload field carrying the corpus document id; point ids are derived from it.
pub const DOC_ID_FIELD: &str = "doc_id";

pub struct QdrantStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &counsel_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url)
			.api_key(cfg.api_key.clone())
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn collection_exists(&self, collection: &str) -> Result<bool> {
		self.client.collection_exists(collection.to_string()).await.map_err(|err| classify(err, collection))
	}

	/// Runs the dense leg and, when sparse terms are supplied, the sparse leg concurrently.
	pub async fn search(&self, req: &SearchRequest) -> Result<SearchHits> {
		if req.dense.len() != self.vector_dim as usize {
			return Err(Error::InvalidArgument(format!(
				"Query vector has {} dimensions, expected {}.",
				req.dense.len(),
				self.vector_dim
			)));
		}

		let filter = req.predicate.as_ref().map(to_qdrant_filter);
		let dense_query = leg_query(
			req,
			Query::new_nearest(req.dense.clone()),
			DENSE_VECTOR_NAME,
			filter.clone(),
		);
		let sparse_query = req.sparse.as_ref().map(|terms| {
			let (indices, values) = lexical::to_sparse_vector(terms);

			leg_query(
				req,
				Query::new_nearest(VectorInput::new_sparse(indices, values)),
				BM25_VECTOR_NAME,
				filter.clone(),
			)
		});
		let (dense, sparse) = tokio::try_join!(self.client.query(dense_query), async {
			match sparse_query {
				Some(query) => self.client.query(query).await.map(Some),
				None => Ok(None),
			}
		})
		.map_err(|err| classify(err, &req.collection))?;

		Ok(SearchHits {
			dense: to_hits(&req.collection, &dense.result),
			sparse: sparse.map(|response| to_hits(&req.collection, &response.result)),
		})
	}
}

pub fn to_qdrant_filter(expr: &FilterExpr) -> Filter {
	Filter::must(
		expr.clauses
			.iter()
			.map(|clause| Condition::matches(clause.field.as_str(), clause.any_of.clone())),
	)
}

fn leg_query(
	req: &SearchRequest,
	query: Query,
	vector_name: &str,
	filter: Option<Filter>,
) -> QueryPointsBuilder {
	let builder = QueryPointsBuilder::new(req.collection.clone())
		.query(query)
		.using(vector_name)
		.with_payload(true)
		.limit(u64::from(req.limit));

	match filter {
		Some(filter) => builder.filter(filter),
		None => builder,
	}
}

fn classify(err: QdrantError, collection: &str) -> Error {
	let message = err.to_string();
	let lowered = message.to_lowercase();

	if lowered.contains("doesn't exist")
		|| lowered.contains("does not exist")
		|| (lowered.contains("not found") && lowered.contains("collection"))
	{
		return Error::CollectionNotFound { collection: collection.to_string() };
	}
	if lowered.contains("transport")
		|| lowered.contains("unavailable")
		|| lowered.contains("timeout")
		|| lowered.contains("timed out")
		|| lowered.contains("connect")
	{
		return Error::Unavailable { message };
	}

	Error::from(err)
}

fn to_hits(collection: &str, points: &[ScoredPoint]) -> Vec<ScoredHit> {
	let mut out = Vec::with_capacity(points.len());

	for point in points {
		let id = payload_string(&point.payload, DOC_ID_FIELD)
			.or_else(|| point.id.as_ref().and_then(point_id_to_string));
		let Some(id) = id else {
			tracing::warn!(collection, "Search hit missing point id.");

			continue;
		};

		out.push(ScoredHit {
			id,
			collection_name: collection.to_string(),
			title: payload_string(&point.payload, "source").unwrap_or_default(),
			snippet: payload_string(&point.payload, "text").unwrap_or_default(),
			doc_type: DocType::parse(
				payload_string(&point.payload, "doc_type").as_deref().unwrap_or_default(),
			),
			objection_type: payload_string(&point.payload, "objection_type")
				.filter(|label| !label.trim().is_empty())
				.map(|label| ObjectionType::parse(&label)),
			score: point.score,
		});
	}

	out
}

fn point_id_to_string(point_id: &PointId) -> Option<String> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Some(id.clone()),
		Some(PointIdOptions::Num(num)) => Some(num.to_string()),
		None => None,
	}
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}
