use std::cmp::Ordering;

use crate::{
	Error, Result,
	candidate::{CandidateItem, ScoredItem},
};

/// Cosine of the angle between `lhs` and `rhs`, clamped to `[-1, 1]`.
///
/// Zero-norm inputs and vectors of different lengths score exactly `0.0`.
pub fn cosine_similarity(lhs: &[f32], rhs: &[f32]) -> f32 {
	if lhs.len() != rhs.len() {
		return 0.0;
	}

	let mut dot = 0.0_f64;
	let mut lhs_norm = 0.0_f64;
	let mut rhs_norm = 0.0_f64;

	for (l, r) in lhs.iter().zip(rhs.iter()) {
		let (l, r) = (f64::from(*l), f64::from(*r));

		dot += l * r;
		lhs_norm += l * l;
		rhs_norm += r * r;
	}

	if lhs_norm == 0.0 || rhs_norm == 0.0 {
		return 0.0;
	}

	let score = dot / (lhs_norm * rhs_norm).sqrt();

	if score.is_nan() {
		return 0.0;
	}

	score.clamp(-1.0, 1.0) as f32
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

/// Scores every candidate against `query` and keeps the best `top_k`.
///
/// The sort is stable, so equal scores keep collection order. `top_k <= 0` yields nothing.
/// A candidate whose embedding length differs from the query fails the whole ranking.
pub fn rank(query: &[f32], candidates: Vec<CandidateItem>, top_k: i64) -> Result<Vec<ScoredItem>> {
	if let Some(item) = candidates.iter().find(|item| item.embedding.len() != query.len()) {
		return Err(Error::DimensionMismatch {
			id: item.id.clone(),
			expected: query.len(),
			actual: item.embedding.len(),
		});
	}

	let Ok(limit) = usize::try_from(top_k) else {
		return Ok(Vec::new());
	};

	if limit == 0 {
		return Ok(Vec::new());
	}

	let mut scored: Vec<ScoredItem> = candidates
		.into_iter()
		.map(|item| {
			let score = cosine_similarity(query, &item.embedding);

			ScoredItem { item, score }
		})
		.collect();

	scored.sort_by(|a, b| cmp_f32_desc(a.score, b.score));
	scored.truncate(limit);

	Ok(scored)
}
