use std::collections::BTreeMap;

use crate::value::Value;

pub const COLLECTION: &str = "dashboard_users";
pub const ADMIN_ROLE: &str = "admin";
pub const CREATED_AT_FIELD: &str = "createdAt";

// The fixed seed list, in write order.
const ADMIN_EMAILS: [&str; 2] = ["dvmaren@gmail.com", "mike.vanderlans@gmail.com"];

#[derive(Debug, Clone)]
pub struct SeedRecord {
	pub email: String,
	pub role: String,
}

impl SeedRecord {
	pub fn admin(email: &str) -> Self {
		Self {
			email: email.to_string(),
			role: ADMIN_ROLE.to_string(),
		}
	}

	/// The document key is the email itself, so reseeding overwrites
	/// rather than duplicates.
	pub fn doc_id(&self) -> &str {
		&self.email
	}

	/// The written fields. createdAt is deliberately absent: the server
	/// stamps it at write time.
	pub fn fields(&self) -> BTreeMap<String, Value> {
		let mut fields = BTreeMap::new();
		fields.insert("email".to_string(), Value::string(&self.email));
		fields.insert("role".to_string(), Value::string(&self.role));
		fields
	}
}

pub fn admin_seed_records() -> Vec<SeedRecord> {
	ADMIN_EMAILS.iter().map(|email| SeedRecord::admin(email)).collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn seed_list_keeps_its_order() {
		let records = admin_seed_records();
		let emails: Vec<&str> = records.iter().map(|r| r.email.as_str()).collect();
		assert_eq!(emails, vec!["dvmaren@gmail.com", "mike.vanderlans@gmail.com"]);
	}

	#[test]
	fn every_record_is_an_admin_keyed_by_email() {
		for record in admin_seed_records() {
			assert_eq!(record.role, ADMIN_ROLE);
			assert_eq!(record.doc_id(), record.email);
		}
	}

	#[test]
	fn fields_never_carry_the_server_timestamp() {
		let record = SeedRecord::admin("a@x.com");
		let fields = record.fields();
		assert_eq!(fields["email"].as_str(), Some("a@x.com"));
		assert_eq!(fields["role"].as_str(), Some("admin"));
		assert!(!fields.contains_key(CREATED_AT_FIELD));
	}
}
