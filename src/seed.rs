use anyhow::Result;

use crate::firestore::FirestoreClient;
use crate::records::{self, admin_seed_records};

pub struct SeedOpts {
	pub dry_run: bool,
}

/// Upsert one document per record, in list order, fail-fast: the first
/// failed write aborts the remainder with no rollback of earlier writes.
pub async fn seed(client: &mut FirestoreClient, opts: SeedOpts) -> Result<()> {
	println!("Seeding database users...");

	for record in admin_seed_records() {
		if opts.dry_run {
			println!(
				"DRY RUN: would upsert {}/{}",
				records::COLLECTION,
				record.doc_id()
			);
			continue;
		}

		client
			.upsert_with_server_time(
				records::COLLECTION,
				record.doc_id(),
				record.fields(),
				records::CREATED_AT_FIELD,
			)
			.await?;
		println!("✅ Added/Updated: {}", record.email);
	}

	if opts.dry_run {
		println!("Dry run complete; no documents written.");
	} else {
		println!("Database seeding complete!");
	}

	Ok(())
}
