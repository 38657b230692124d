//! The remote face registration/recognition service.
//!
//! The session only talks to the service through [`FaceService`], so tests
//! and alternative transports can stand in for [`HttpFaceService`].

mod http;

pub use http::{HttpFaceService, HttpServiceConfig};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{EnrolledPerson, PersonRecord, RecognitionOutcome, Stats, Still};

/// Operations offered by the recognition service.
///
/// Implementations must not retry: every call maps to at most one request.
#[async_trait]
pub trait FaceService: Send + Sync {
    /// Enroll `name` with the face found in `still`.
    async fn register(&self, name: &str, still: Still) -> Result<EnrolledPerson>;

    /// Identify the face in `still`.
    async fn recognize(&self, still: Still) -> Result<RecognitionOutcome>;

    /// Aggregate usage statistics.
    async fn stats(&self) -> Result<Stats>;

    /// All enrolled persons.
    async fn persons(&self) -> Result<Vec<PersonRecord>>;

    /// Remove an enrolled person, returning the service's confirmation message.
    async fn remove_person(&self, name: &str) -> Result<String>;
}
