use anyhow::Result;

use crate::firestore::FirestoreClient;
use crate::records::{self, admin_seed_records};
use crate::value::Value;

/// Read-only report over the fixed seed list: one line per record, present
/// or missing. Missing records are a hint, not a failure.
pub async fn status(client: &mut FirestoreClient) -> Result<()> {
	let mut missing = 0usize;

	for record in admin_seed_records() {
		match client
			.get_document(records::COLLECTION, record.doc_id())
			.await?
		{
			Some(doc) => {
				let role = doc.fields.get("role").and_then(Value::as_str).unwrap_or("-");
				let created = doc
					.fields
					.get(records::CREATED_AT_FIELD)
					.and_then(Value::as_timestamp)
					.unwrap_or("-");
				println!("{} role={} createdAt={}", record.email, role, created);
			}
			None => {
				missing += 1;
				println!("{} missing", record.email);
			}
		}
	}

	if missing > 0 {
		println!("{missing} record(s) missing; run 'firekit seed' to create them");
	}

	Ok(())
}
