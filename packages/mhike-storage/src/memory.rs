use std::collections::HashMap;

use crate::{BoxFuture, DocumentStore, Result, models::Document};

/// In-process document tree. Listing follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
	owners: HashMap<String, Vec<MemoryHike>>,
}

#[derive(Debug, Clone)]
struct MemoryHike {
	document: Document,
	/// Set when observations were written under a hike key that has no document of its own.
	/// Such hikes are not listed, matching Firestore's missing-parent behavior.
	missing: bool,
	observations: Vec<Document>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert_hike(&mut self, owner_id: &str, document: Document) {
		let hikes = self.owners.entry(owner_id.to_string()).or_default();

		match hikes.iter_mut().find(|hike| hike.document.key == document.key) {
			Some(hike) => {
				hike.document = document;
				hike.missing = false;
			},
			None => hikes.push(MemoryHike { document, missing: false, observations: Vec::new() }),
		}
	}

	pub fn insert_observation(&mut self, owner_id: &str, hike_key: &str, document: Document) {
		let hikes = self.owners.entry(owner_id.to_string()).or_default();
		let index = match hikes.iter().position(|hike| hike.document.key == hike_key) {
			Some(index) => index,
			None => {
				hikes.push(MemoryHike {
					document: Document::new(hike_key, Default::default()),
					missing: true,
					observations: Vec::new(),
				});

				hikes.len() - 1
			},
		};

		hikes[index].observations.push(document);
	}

	pub fn with_hike(mut self, owner_id: &str, document: Document) -> Self {
		self.insert_hike(owner_id, document);

		self
	}

	pub fn with_observation(mut self, owner_id: &str, hike_key: &str, document: Document) -> Self {
		self.insert_observation(owner_id, hike_key, document);

		self
	}

	fn hikes(&self, owner_id: &str) -> &[MemoryHike] {
		self.owners.get(owner_id).map(Vec::as_slice).unwrap_or_default()
	}
}
impl DocumentStore for MemoryStore {
	fn list_hikes<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Document>>> {
		let documents = self
			.hikes(owner_id)
			.iter()
			.filter(|hike| !hike.missing)
			.map(|hike| hike.document.clone())
			.collect();

		Box::pin(async move { Ok(documents) })
	}

	fn list_observations<'a>(
		&'a self,
		owner_id: &'a str,
		hike_key: &'a str,
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		let documents = self
			.hikes(owner_id)
			.iter()
			.find(|hike| hike.document.key == hike_key)
			.map(|hike| hike.observations.clone())
			.unwrap_or_default();

		Box::pin(async move { Ok(documents) })
	}
}
