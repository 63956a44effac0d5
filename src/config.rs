use anyhow::Result;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use rust_dotenv::dotenv::DotEnv;

/// Firebase project this tool administers. The seed list, collection and
/// role are equally fixed; see records.rs.
pub const PROJECT_ID: &str = "musicdashboard-6fddb";
pub const DATABASE_ID: &str = "(default)";

const LIVE_HOST: &str = "https://firestore.googleapis.com";

// Characters that cannot appear raw in a URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
	.add(b' ')
	.add(b'"')
	.add(b'#')
	.add(b'%')
	.add(b'/')
	.add(b'<')
	.add(b'>')
	.add(b'?')
	.add(b'`')
	.add(b'{')
	.add(b'}');

#[derive(Debug, Clone)]
pub struct FirestoreCfg {
	project_id: String,
	database_id: String,
	host: String,
	emulator: bool,
}

impl FirestoreCfg {
	pub fn from_env(_env: &DotEnv) -> Result<Self> {
		let dotenv = DotEnv::new("");

		// DotEnv has already populated std::env; pull from there.
		// FIRESTORE_EMULATOR_HOST redirects every call to a local
		// emulator, the same way the firebase-admin SDK honors it.
		let emulator_host = dotenv
			.get_var("FIRESTORE_EMULATOR_HOST".to_string())
			.filter(|v| !v.trim().is_empty());

		let (host, emulator) = match emulator_host {
			Some(raw) => (normalize_emulator_host(raw.trim()), true),
			None => (LIVE_HOST.to_string(), false),
		};

		Ok(Self {
			project_id: PROJECT_ID.to_string(),
			database_id: DATABASE_ID.to_string(),
			host,
			emulator,
		})
	}

	pub fn project_id(&self) -> &str {
		&self.project_id
	}

	pub fn host(&self) -> &str {
		&self.host
	}

	pub fn emulator(&self) -> bool {
		self.emulator
	}

	/// Resource prefix shared by every document in the database.
	pub fn documents_path(&self) -> String {
		format!(
			"projects/{}/databases/{}/documents",
			self.project_id, self.database_id
		)
	}

	pub fn commit_url(&self) -> String {
		format!("{}/v1/{}:commit", self.host, self.documents_path())
	}

	/// Full resource name of a document, as used inside request bodies
	/// (no escaping; the REST body carries the raw name).
	pub fn doc_name(&self, collection: &str, id: &str) -> String {
		format!("{}/{}/{}", self.documents_path(), collection, id)
	}

	/// URL of a single document. The id lands in the URL path, so it is
	/// percent-encoded; emails pass through unchanged.
	pub fn doc_url(&self, collection: &str, id: &str) -> String {
		format!(
			"{}/v1/{}/{}/{}",
			self.host,
			self.documents_path(),
			collection,
			utf8_percent_encode(id, SEGMENT)
		)
	}
}

fn normalize_emulator_host(raw: &str) -> String {
	if raw.starts_with("http://") || raw.starts_with("https://") {
		raw.to_string()
	} else {
		format!("http://{raw}")
	}
}
