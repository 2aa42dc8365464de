pub mod auth;
pub mod firestore;
pub mod memory;
pub mod models;

mod error;

pub use error::Error;

use std::{future::Future, pin::Pin};

use crate::models::Document;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub const USERS_COLLECTION: &str = "users";
pub const HIKES_COLLECTION: &str = "hikes";
pub const OBSERVATIONS_COLLECTION: &str = "observations";

/// Read-only view of the `users/{owner}/hikes/{hike}/observations/{observation}` tree.
///
/// Listing order is whatever the backing store yields.
pub trait DocumentStore
where
	Self: Send + Sync,
{
	fn list_hikes<'a>(&'a self, owner_id: &'a str) -> BoxFuture<'a, Result<Vec<Document>>>;

	fn list_observations<'a>(
		&'a self,
		owner_id: &'a str,
		hike_key: &'a str,
	) -> BoxFuture<'a, Result<Vec<Document>>>;
}
