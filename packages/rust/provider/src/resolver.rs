//! Provider and content type configuration lookups.
//!
//! Every lookup re-queries the document store; nothing is cached. The
//! uniqueness of provider names and content type ids is checked on each
//! fetch by inspecting the exact hit count.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, instrument};

use dcp_shared::{
    DcpError, FIELD_DCP_TYPE, FIELD_NAME, FIELD_TYPE, ProviderDefinition, Result, TypeDefinition,
};

use crate::credentials::CredentialChecker;
use crate::store::{DocumentQuery, DocumentStore, FieldPath, SearchHits};

/// Resolves provider and content type configuration from a [`DocumentStore`].
///
/// Collaborators are passed in explicitly; the resolver holds no other state.
#[derive(Clone)]
pub struct ProviderResolver {
    store: Arc<dyn DocumentStore>,
    credentials: Arc<dyn CredentialChecker>,
}

impl ProviderResolver {
    pub fn new(store: Arc<dyn DocumentStore>, credentials: Arc<dyn CredentialChecker>) -> Self {
        Self { store, credentials }
    }

    /// Find a provider by its unique name.
    ///
    /// Zero matches is `Ok(None)`. More than one match is a
    /// configuration-integrity error, never resolved by picking one.
    #[instrument(skip(self))]
    pub async fn find_provider(&self, name: &str) -> Result<Option<ProviderDefinition>> {
        let query = DocumentQuery::match_field(FieldPath::new([FIELD_NAME]), name);
        let hits = self.store.search(&query).await?;

        let Some(source) = unique_source(hits, || {
            format!(
                "More than one configurations found for content provider name '{name}'."
            )
        })?
        else {
            debug!("provider not found");
            return Ok(None);
        };

        ProviderDefinition::from_document(&source).map(Some)
    }

    /// Check a provider's password.
    ///
    /// Returns `false` for absent arguments, unknown providers, and providers
    /// without a stored hash.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, name: Option<&str>, password: Option<&str>) -> Result<bool> {
        let (Some(name), Some(password)) = (name, password) else {
            return Ok(false);
        };

        let Some(provider) = self.find_provider(name).await? else {
            return Ok(false);
        };

        match provider.password_hash.as_deref() {
            Some(hash) => Ok(self.credentials.check_hash(name, password, hash)),
            None => {
                error!(provider = name, "provider doesn't have any password hash defined");
                Ok(false)
            }
        }
    }

    /// Whether `name` is a super provider. Unknown providers are not.
    pub async fn is_super_provider(&self, name: &str) -> Result<bool> {
        Ok(self
            .find_provider(name)
            .await?
            .is_some_and(|p| p.is_super_provider()))
    }

    /// Find a content type by its system-wide unique id, across all providers.
    ///
    /// Same 0 / 1 / many contract as [`find_provider`](Self::find_provider).
    #[instrument(skip(self))]
    pub async fn find_content_type(&self, type_id: &str) -> Result<Option<TypeDefinition>> {
        let query =
            DocumentQuery::field_exists(FieldPath::new([FIELD_TYPE, type_id, FIELD_DCP_TYPE]));
        let hits = self.store.search(&query).await?;

        let Some(source) = unique_source(hits, || {
            format!("More than one configurations found for dcp_content_type={type_id}.")
        })?
        else {
            debug!("content type not found");
            return Ok(None);
        };

        let mut provider = ProviderDefinition::from_document(&source)?;
        Ok(provider.types.remove(type_id))
    }
}

/// Extract the single hit's source, enforcing the 0-or-1 contract.
fn unique_source(hits: SearchHits, duplicate_msg: impl FnOnce() -> String) -> Result<Option<Value>> {
    match hits.total {
        0 => Ok(None),
        1 => hits
            .hits
            .into_iter()
            .next()
            .map(|hit| Some(hit.source))
            .ok_or_else(|| DcpError::Storage("store reported one hit but returned none".into())),
        total => {
            let msg = duplicate_msg();
            error!(total, "{msg}");
            Err(DcpError::integrity(msg))
        }
    }
}

/// Look up one content type in an already fetched provider definition.
pub fn get_content_type<'a>(
    provider: &'a ProviderDefinition,
    type_id: &str,
) -> Option<&'a TypeDefinition> {
    provider.content_type(type_id)
}

/// Build the system-wide unique content id: `<dcp_type>-<content_id>`.
pub fn generate_dcp_id(dcp_type: &str, content_id: &str) -> String {
    format!("{dcp_type}-{content_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Sha256CredentialChecker, hash_password};
    use crate::store::memory::MemoryDocumentStore;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every call and answers with a fixed verdict.
    #[derive(Default)]
    struct RecordingChecker {
        calls: Mutex<Vec<(String, String, String)>>,
    }

    impl CredentialChecker for RecordingChecker {
        fn check_hash(&self, name: &str, plaintext: &str, stored_hash: &str) -> bool {
            self.calls.lock().unwrap().push((
                name.to_string(),
                plaintext.to_string(),
                stored_hash.to_string(),
            ));
            true
        }
    }

    fn provider_doc(name: &str) -> Value {
        json!({
            "name": name,
            "pwd_hash": hash_password(name, "secret"),
            "super_provider": name == "jbossorg",
            "type": {
                format!("{name}_blog"): {
                    "dcp_type": "blogpost",
                    "index": { "name": format!("data_{name}_blog"), "type": "blogpost" },
                    "input_preprocessors": [{ "class": "noop" }]
                }
            }
        })
    }

    fn resolver_with(docs: Vec<Value>) -> ProviderResolver {
        ProviderResolver::new(
            Arc::new(MemoryDocumentStore::with_documents(docs)),
            Arc::new(Sha256CredentialChecker),
        )
    }

    #[tokio::test]
    async fn find_provider_single_match() {
        let resolver = resolver_with(vec![provider_doc("jbossorg"), provider_doc("other")]);
        let provider = resolver
            .find_provider("jbossorg")
            .await
            .expect("lookup")
            .expect("found");
        assert_eq!(provider.name, "jbossorg");
        assert!(provider.types.contains_key("jbossorg_blog"));
    }

    #[tokio::test]
    async fn find_provider_none() {
        let resolver = resolver_with(vec![provider_doc("jbossorg")]);
        assert!(resolver.find_provider("missing").await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn find_provider_duplicates_are_fatal() {
        let resolver = resolver_with(vec![provider_doc("dup"), provider_doc("dup")]);
        let err = resolver.find_provider("dup").await.unwrap_err();
        assert!(matches!(err, DcpError::ConfigurationIntegrity { .. }));
        assert!(err.to_string().contains("'dup'"));
    }

    #[tokio::test]
    async fn find_provider_rejects_malformed_document() {
        let resolver = resolver_with(vec![json!({ "name": "bad", "type": "oops" })]);
        let err = resolver.find_provider("bad").await.unwrap_err();
        assert!(matches!(err, DcpError::ConfigurationIntegrity { .. }));
    }

    #[tokio::test]
    async fn authenticate_with_absent_arguments() {
        let resolver = resolver_with(vec![provider_doc("jbossorg")]);
        assert!(!resolver.authenticate(None, Some("secret")).await.unwrap());
        assert!(!resolver.authenticate(Some("jbossorg"), None).await.unwrap());
        assert!(!resolver.authenticate(Some("missing"), Some("secret")).await.unwrap());
    }

    #[tokio::test]
    async fn authenticate_checks_hash() {
        let resolver = resolver_with(vec![provider_doc("jbossorg")]);
        assert!(resolver.authenticate(Some("jbossorg"), Some("secret")).await.unwrap());
        assert!(!resolver.authenticate(Some("jbossorg"), Some("wrong")).await.unwrap());
    }

    #[tokio::test]
    async fn authenticate_without_hash_is_false_and_skips_checker() {
        let checker = Arc::new(RecordingChecker::default());
        let resolver = ProviderResolver::new(
            Arc::new(MemoryDocumentStore::with_documents([json!({ "name": "nohash" })])),
            checker.clone(),
        );
        assert!(!resolver.authenticate(Some("nohash"), Some("x")).await.unwrap());
        assert!(checker.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn authenticate_delegates_to_checker() {
        let checker = Arc::new(RecordingChecker::default());
        let resolver = ProviderResolver::new(
            Arc::new(MemoryDocumentStore::with_documents([
                json!({ "name": "p", "pwd_hash": "stored" }),
            ])),
            checker.clone(),
        );
        assert!(resolver.authenticate(Some("p"), Some("plain")).await.unwrap());
        let calls = checker.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[("p".to_string(), "plain".to_string(), "stored".to_string())]
        );
    }

    #[tokio::test]
    async fn super_provider_flag() {
        let resolver = resolver_with(vec![
            provider_doc("jbossorg"),
            provider_doc("other"),
            json!({ "name": "flagless" }),
        ]);
        assert!(resolver.is_super_provider("jbossorg").await.unwrap());
        assert!(!resolver.is_super_provider("other").await.unwrap());
        assert!(!resolver.is_super_provider("flagless").await.unwrap());
        assert!(!resolver.is_super_provider("missing").await.unwrap());
    }

    #[tokio::test]
    async fn find_content_type_across_providers() {
        let resolver = resolver_with(vec![provider_doc("jbossorg"), provider_doc("other")]);
        let type_def = resolver
            .find_content_type("other_blog")
            .await
            .expect("lookup")
            .expect("found");
        assert_eq!(type_def.id, "other_blog");
        assert_eq!(type_def.dcp_type().unwrap(), "blogpost");
        assert_eq!(type_def.index_name(), Some("data_other_blog"));
        assert_eq!(type_def.index_type(), Some("blogpost"));
        assert_eq!(type_def.preprocessors().len(), 1);

        assert!(resolver.find_content_type("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_content_type_duplicates_are_fatal() {
        let resolver = resolver_with(vec![
            json!({ "name": "a", "type": { "shared": { "dcp_type": "x" } } }),
            json!({ "name": "b", "type": { "shared": { "dcp_type": "y" } } }),
        ]);
        let err = resolver.find_content_type("shared").await.unwrap_err();
        assert!(matches!(err, DcpError::ConfigurationIntegrity { .. }));
        assert!(err.to_string().contains("dcp_content_type=shared"));
    }

    #[tokio::test]
    async fn find_content_type_ignores_types_without_dcp_type() {
        let resolver = resolver_with(vec![json!({ "name": "a", "type": { "t": { "index": null } } })]);
        assert!(resolver.find_content_type("t").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dotted_type_ids_are_unambiguous() {
        let resolver = resolver_with(vec![
            json!({ "name": "a", "type": { "x.y": { "dcp_type": "dotted" } } }),
            json!({ "name": "b", "type": { "x": { "y": { "dcp_type": "nested" } } } }),
        ]);
        let type_def = resolver.find_content_type("x.y").await.unwrap().expect("found");
        assert_eq!(type_def.dcp_type().unwrap(), "dotted");
    }

    #[test]
    fn get_content_type_is_pure_lookup() {
        let provider = ProviderDefinition::from_document(&provider_doc("jbossorg")).unwrap();
        assert!(get_content_type(&provider, "jbossorg_blog").is_some());
        assert!(get_content_type(&provider, "other_blog").is_none());
    }

    #[test]
    fn dcp_id_is_plain_concatenation() {
        assert_eq!(generate_dcp_id("jira", "ABC-1"), "jira-ABC-1");
        assert_eq!(generate_dcp_id("", ""), "-");
    }
}
