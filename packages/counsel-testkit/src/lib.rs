mod error;

pub use error::{Error, Result};

use std::{collections::HashMap, env, thread, time::Duration};

use qdrant_client::{
	Payload, Qdrant,
	qdrant::{
		CreateCollectionBuilder, Distance, PointStruct, SparseVectorParamsBuilder,
		SparseVectorsConfigBuilder, UpsertPointsBuilder, Vector, VectorParamsBuilder,
		VectorsConfigBuilder,
	},
};
use tokio::{runtime::Builder, time};
use uuid::Uuid;

use counsel_domain::lexical;
use counsel_storage::{
	memory::CorpusDocument,
	qdrant::{BM25_VECTOR_NAME, DENSE_VECTOR_NAME, DOC_ID_FIELD},
};

const MAX_ATTEMPTS: u32 = 6;
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// A throwaway Qdrant collection with the `dense` and `bm25` named vectors.
///
/// Dropping it without calling [`TestCollection::cleanup`] deletes the collection on a helper
/// thread.
pub struct TestCollection {
	url: String,
	name: String,
	client: Qdrant,
	cleaned: bool,
}
impl TestCollection {
	pub async fn new(qdrant_url: &str, prefix: &str, vector_dim: u32) -> Result<Self> {
		let client = Qdrant::from_url(qdrant_url)
			.build()
			.map_err(|err| Error::Message(format!("Failed to build Qdrant client: {err}.")))?;
		let name = format!("{prefix}_{}", Uuid::new_v4().simple());

		create_collection(&client, &name, vector_dim).await?;

		Ok(Self { url: qdrant_url.to_string(), name, client, cleaned: false })
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	/// Upserts documents with their dense vectors; sparse vectors come from the lexical terms.
	pub async fn seed(&self, docs: &[(CorpusDocument, Vec<f32>)]) -> Result<()> {
		let points: Vec<PointStruct> = docs.iter().map(|(doc, dense)| point(doc, dense)).collect();

		time::timeout(
			CALL_TIMEOUT,
			self.client.upsert_points(UpsertPointsBuilder::new(self.name.clone(), points).wait(true)),
		)
		.await
		.map_err(|_| Error::Message("Qdrant upsert_points timed out.".to_string()))??;

		Ok(())
	}

	pub async fn cleanup(mut self) -> Result<()> {
		delete_collection(&self.client, &self.name).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestCollection {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let url = self.url.clone();
		let name = self.name.clone();
		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test collection cleanup failed: {err}.");

					return;
				},
			};
			let result = runtime.block_on(async {
				let client = Qdrant::from_url(&url)
					.build()
					.map_err(|err| Error::Message(format!("Failed to build Qdrant client: {err}.")))?;

				delete_collection(&client, &name).await
			});

			if let Err(err) = result {
				eprintln!("Test collection cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

pub fn env_qdrant_url() -> Option<String> {
	env::var("COUNSEL_QDRANT_URL").ok()
}

/// Stable point id for a corpus document id.
pub fn point_uuid(doc_id: &str) -> Uuid {
	Uuid::new_v5(&Uuid::NAMESPACE_OID, doc_id.as_bytes())
}

fn point(doc: &CorpusDocument, dense: &[f32]) -> PointStruct {
	let mut payload = Payload::new();

	payload.insert(DOC_ID_FIELD, doc.id.clone());
	payload.insert("text", doc.text.clone());
	payload.insert("source", doc.source.clone());
	payload.insert("doc_type", doc.doc_type.clone());
	payload.insert("case_id", doc.case_id.clone());

	if let Some(objection_type) = doc.objection_type.as_ref() {
		payload.insert("objection_type", objection_type.clone());
	}
	if let Some(keywords) = doc.keywords.as_ref() {
		payload.insert("keywords", keywords.clone());
	}

	let (indices, values) = lexical::to_sparse_vector(&lexical::sparse_terms(&doc.lexical_text()));
	let mut vectors = HashMap::new();

	vectors.insert(DENSE_VECTOR_NAME.to_string(), Vector::from(dense.to_vec()));
	vectors.insert(BM25_VECTOR_NAME.to_string(), Vector::new_sparse(indices, values));

	PointStruct::new(point_uuid(&doc.id).to_string(), vectors, payload)
}

async fn create_collection(client: &Qdrant, name: &str, vector_dim: u32) -> Result<()> {
	let mut backoff = Duration::from_millis(100);
	let mut last_err = None;

	for attempt in 1..=MAX_ATTEMPTS {
		let mut vectors_config = VectorsConfigBuilder::default();

		vectors_config.add_named_vector_params(
			DENSE_VECTOR_NAME,
			VectorParamsBuilder::new(vector_dim.into(), Distance::Cosine),
		);

		let mut sparse_vectors_config = SparseVectorsConfigBuilder::default();

		sparse_vectors_config
			.add_named_vector_params(BM25_VECTOR_NAME, SparseVectorParamsBuilder::default());

		let builder = CreateCollectionBuilder::new(name.to_string())
			.vectors_config(vectors_config)
			.sparse_vectors_config(sparse_vectors_config);

		match time::timeout(CALL_TIMEOUT, client.create_collection(builder)).await {
			Ok(Ok(_)) => return Ok(()),
			Ok(Err(err)) => last_err = Some(err.to_string()),
			Err(_) => last_err = Some("timed out".to_string()),
		}

		if attempt < MAX_ATTEMPTS {
			time::sleep(backoff).await;

			backoff = backoff.saturating_mul(2).min(Duration::from_secs(2));
		}
	}

	Err(Error::Message(format!(
		"Failed to create Qdrant collection {name:?} after {MAX_ATTEMPTS} attempts: {last_err:?}."
	)))
}

async fn delete_collection(client: &Qdrant, name: &str) -> Result<()> {
	let mut backoff = Duration::from_millis(100);

	for attempt in 1..=MAX_ATTEMPTS {
		let exists = time::timeout(CALL_TIMEOUT, client.collection_exists(name.to_string()))
			.await
			.map_err(|_| Error::Message("Qdrant collection_exists timed out.".to_string()))?
			.map_err(|err| Error::Message(format!("Failed to check Qdrant collection: {err}.")))?;

		if !exists {
			return Ok(());
		}

		match time::timeout(CALL_TIMEOUT, client.delete_collection(name.to_string())).await {
			Ok(Ok(_)) => {},
			Ok(Err(err)) =>
				if attempt == MAX_ATTEMPTS {
					return Err(Error::Message(format!(
						"Failed to delete Qdrant collection {name:?} after {attempt} attempts: {err}."
					)));
				},
			Err(_) =>
				if attempt == MAX_ATTEMPTS {
					return Err(Error::Message(format!(
						"Timed out deleting Qdrant collection {name:?} after {attempt} attempts."
					)));
				},
		}

		time::sleep(backoff).await;

		backoff = backoff.saturating_mul(2).min(Duration::from_secs(2));
	}

	Ok(())
}
