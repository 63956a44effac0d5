use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::FirestoreCfg;
use crate::credentials::Credential;
use crate::token::TokenProvider;
use crate::value::Value;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitRequest {
	writes: Vec<Write>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Write {
	update: NewDocument,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	update_transforms: Vec<FieldTransform>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewDocument {
	name: String,
	fields: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldTransform {
	field_path: String,
	set_to_server_value: ServerValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum ServerValue {
	RequestTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitResponse {
	#[serde(default)]
	write_results: Vec<WriteResult>,
	#[serde(default)]
	commit_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WriteResult {
	#[serde(default)]
	update_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
	pub name: String,
	#[serde(default)]
	pub fields: BTreeMap<String, Value>,
	#[serde(default)]
	pub create_time: Option<String>,
	#[serde(default)]
	pub update_time: Option<String>,
}

// Google's standard error envelope.
#[derive(Debug, Deserialize)]
struct ApiError {
	error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
	#[serde(default)]
	code: i64,
	message: String,
	#[serde(default)]
	status: String,
}

#[derive(Debug, Clone)]
pub struct WriteOutcome {
	pub update_time: Option<String>,
}

/// One authenticated handle to the project's Firestore, built once per run
/// and passed into the command functions. No request timeout is set; a
/// hang blocks the whole run.
pub struct FirestoreClient {
	http: reqwest::Client,
	cfg: FirestoreCfg,
	tokens: TokenProvider,
}

impl FirestoreClient {
	pub fn new(cfg: FirestoreCfg, credential: Credential, verbose: bool) -> Result<Self> {
		let http = reqwest::Client::builder()
			.user_agent(concat!("firekit/", env!("CARGO_PKG_VERSION")))
			.build()
			.context("building Firestore client")?;

		Ok(Self {
			http,
			cfg,
			tokens: TokenProvider::new(credential, verbose),
		})
	}

	/// Create-or-replace the document keyed by `doc_id` with `fields`,
	/// letting the server stamp `ts_field` with its own request time.
	/// No precondition is sent, so reseeding overwrites.
	pub async fn upsert_with_server_time(
		&mut self,
		collection: &str,
		doc_id: &str,
		fields: BTreeMap<String, Value>,
		ts_field: &str,
	) -> Result<WriteOutcome> {
		let request = CommitRequest {
			writes: vec![Write {
				update: NewDocument {
					name: self.cfg.doc_name(collection, doc_id),
					fields,
				},
				update_transforms: vec![FieldTransform {
					field_path: ts_field.to_string(),
					set_to_server_value: ServerValue::RequestTime,
				}],
			}],
		};

		let token = self.tokens.bearer_token(&self.http).await?;
		let resp = self
			.http
			.post(self.cfg.commit_url())
			.bearer_auth(token)
			.json(&request)
			.send()
			.await
			.with_context(|| format!("commit of {collection}/{doc_id} failed"))?;

		let status = resp.status();
		let body = resp.text().await.context("reading commit response")?;
		if !status.is_success() {
			return Err(api_error(status, &body));
		}

		let commit: CommitResponse =
			serde_json::from_str(&body).context("decoding commit response")?;
		let update_time = commit
			.write_results
			.into_iter()
			.next()
			.and_then(|w| w.update_time)
			.or(commit.commit_time);

		Ok(WriteOutcome { update_time })
	}

	/// Fetch one document; absent documents come back as None.
	pub async fn get_document(
		&mut self,
		collection: &str,
		doc_id: &str,
	) -> Result<Option<Document>> {
		let token = self.tokens.bearer_token(&self.http).await?;
		let resp = self
			.http
			.get(self.cfg.doc_url(collection, doc_id))
			.bearer_auth(token)
			.send()
			.await
			.with_context(|| format!("fetching {collection}/{doc_id} failed"))?;

		let status = resp.status();
		if status == StatusCode::NOT_FOUND {
			return Ok(None);
		}

		let body = resp.text().await.context("reading document response")?;
		if !status.is_success() {
			return Err(api_error(status, &body));
		}

		let doc: Document = serde_json::from_str(&body).context("decoding document")?;
		Ok(Some(doc))
	}
}

fn api_error(status: StatusCode, body: &str) -> anyhow::Error {
	match serde_json::from_str::<ApiError>(body) {
		Ok(envelope) => anyhow!(
			"Firestore error {} (code {}): {}",
			envelope.error.status,
			envelope.error.code,
			envelope.error.message
		),
		Err(_) => anyhow!("HTTP {status}: {body}"),
	}
}
