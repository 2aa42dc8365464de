use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::Error;

/// Parsed case-insensitively, both from config and from request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
	#[default]
	Hikes,
	Observations,
	All,
}
impl SearchScope {
	pub fn includes_hikes(self) -> bool {
		matches!(self, Self::Hikes | Self::All)
	}

	pub fn includes_observations(self) -> bool {
		matches!(self, Self::Observations | Self::All)
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Hikes => "hikes",
			Self::Observations => "observations",
			Self::All => "all",
		}
	}
}
impl FromStr for SearchScope {
	type Err = Error;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		match raw.trim().to_ascii_lowercase().as_str() {
			"hikes" => Ok(Self::Hikes),
			"observations" => Ok(Self::Observations),
			"all" => Ok(Self::All),
			_ => Err(Error::InvalidRequest {
				message: format!(
					"Unknown search scope {raw:?}; expected hikes, observations, or all."
				),
			}),
		}
	}
}
impl<'de> Deserialize<'de> for SearchScope {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		raw.parse().map_err(de::Error::custom)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
	Hike,
	Observation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CandidateKind {
	Hike { name: String, location: String, description: String },
	Observation { observation_text: String, comments: String, location: String },
}
impl CandidateKind {
	pub fn item_type(&self) -> ItemType {
		match self {
			Self::Hike { .. } => ItemType::Hike,
			Self::Observation { .. } => ItemType::Observation,
		}
	}
}

/// A stored hike or observation that carries a precomputed embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateItem {
	pub id: String,
	/// Numeric key of the hike itself, or of the owning hike for an observation.
	pub hike_id: Option<i64>,
	/// Never empty.
	pub embedding: Vec<f32>,
	pub kind: CandidateKind,
}
impl CandidateItem {
	pub fn item_type(&self) -> ItemType {
		self.kind.item_type()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
	pub item: CandidateItem,
	pub score: f32,
}
