//! Provider and content type configuration resolution.
//!
//! - [`ProviderResolver`]: provider / content type lookups with uniqueness checks
//! - [`DocumentStore`]: the search backend seen as a document store
//! - [`CredentialChecker`]: password hash verification
//! - [`run_preprocessors`]: ordered content transforms from type configuration

pub mod credentials;
pub mod pipeline;
pub mod resolver;
pub mod store;

pub use credentials::{CredentialChecker, Sha256CredentialChecker, hash_password};
pub use pipeline::{Preprocessor, PreprocessorFactory, PreprocessorRegistry, run_preprocessors};
pub use resolver::{ProviderResolver, generate_dcp_id, get_content_type};
pub use store::memory::MemoryDocumentStore;
pub use store::{DocumentQuery, DocumentStore, FieldFilter, FieldPath, Hit, SearchHits};
