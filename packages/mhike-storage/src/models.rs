use serde_json::{Map, Value};

pub const EMBEDDING_FIELD: &str = "embedding_vector";
pub const NAME_FIELD: &str = "name";
pub const LOCATION_FIELD: &str = "location";
pub const DESCRIPTION_FIELD: &str = "description";
pub const OBSERVATION_TEXT_FIELD: &str = "observationText";
pub const COMMENTS_FIELD: &str = "comments";

/// A stored document with its fields decoded to plain JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
	/// Last path segment of the document name, e.g. `"12"` for `.../hikes/12`.
	pub key: String,
	pub fields: Map<String, Value>,
}
impl Document {
	pub fn new(key: impl Into<String>, fields: Map<String, Value>) -> Self {
		Self { key: key.into(), fields }
	}

	pub fn field(&self, name: &str) -> Option<&Value> {
		self.fields.get(name)
	}

	pub fn str_field(&self, name: &str) -> Option<&str> {
		self.field(name).and_then(Value::as_str)
	}
}
