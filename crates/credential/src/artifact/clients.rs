//! Typed access to the client list inside a proxy configuration document
//!
//! All knowledge of where the credentials live (and what a client entry looks
//! like) is kept here, so the rotation engine only ever sees
//! [`CredentialId`]s.

use indexmap::IndexSet;
use serde_json::{Map, Value};
use tracing::debug;

use crate::core::{ConfigError, CredentialId};

/// Default location of the client list: first inbound's `settings.clients`
pub const DEFAULT_CLIENTS_POINTER: &str = "/inbounds/0/settings/clients";

/// Client list accessor
///
/// # Examples
///
/// ```
/// use rotor_credential::artifact::ClientsAdapter;
/// use rotor_credential::CredentialId;
/// use serde_json::json;
///
/// let adapter = ClientsAdapter::default();
/// let mut doc = json!({ "inbounds": [{ "settings": { "clients": [] } }] });
///
/// let id = CredentialId::generate();
/// adapter.add(&mut doc, id).unwrap();
/// assert!(adapter.list(&doc).unwrap().contains(&id));
///
/// assert_eq!(adapter.remove(&mut doc, id), Some(1));
/// assert!(adapter.list(&doc).unwrap().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientsAdapter {
    pointer: String,
    template: Map<String, Value>,
}

impl ClientsAdapter {
    /// Create an adapter for the array at JSON pointer `pointer`
    ///
    /// # Errors
    ///
    /// * `InvalidValue` if `pointer` is not an RFC 6901 pointer to a child
    ///   node (it must start with `/`)
    pub fn new(pointer: impl Into<String>) -> Result<Self, ConfigError> {
        let pointer = pointer.into();
        if !pointer.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "clients_pointer".to_string(),
                reason: format!("'{pointer}' is not a JSON pointer (must start with '/')"),
            });
        }
        Ok(Self {
            pointer,
            template: Map::new(),
        })
    }

    /// Extra fields copied into every client entry this adapter adds
    /// (e.g. `"flow"`); `id` in the template is ignored
    pub fn with_template(mut self, template: Map<String, Value>) -> Self {
        self.template = template;
        self.template.remove("id");
        self
    }

    /// JSON pointer of the client list
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// Live credentials in document order
    ///
    /// Returns `None` if the pointer does not resolve to an array. Entries
    /// without a UUID `id` are skipped; duplicates collapse to their first
    /// position.
    pub fn list(&self, doc: &Value) -> Option<IndexSet<CredentialId>> {
        let clients = doc.pointer(&self.pointer)?.as_array()?;
        Some(
            clients
                .iter()
                .filter_map(|client| {
                    let raw = client.get("id")?.as_str()?;
                    match raw.parse() {
                        Ok(id) => Some(id),
                        Err(_) => {
                            debug!(id = raw, "Skipping client entry with a non-UUID id");
                            None
                        }
                    }
                })
                .collect(),
        )
    }

    /// Append a client entry for `id`
    ///
    /// Append-only: adding the same credential twice yields two entries.
    /// Returns `None` if the client list does not exist.
    pub fn add(&self, doc: &mut Value, id: CredentialId) -> Option<()> {
        let clients = doc.pointer_mut(&self.pointer)?.as_array_mut()?;
        let mut entry = Map::with_capacity(self.template.len() + 1);
        entry.insert("id".to_string(), Value::String(id.to_string()));
        entry.extend(self.template.clone());
        clients.push(Value::Object(entry));
        Some(())
    }

    /// Delete every client entry for `id`
    ///
    /// Returns how many entries were removed, or `None` if the client list
    /// does not exist. Entries whose `id` is not a UUID are never touched.
    pub fn remove(&self, doc: &mut Value, id: CredentialId) -> Option<usize> {
        let clients = doc.pointer_mut(&self.pointer)?.as_array_mut()?;
        let before = clients.len();
        clients.retain(|client| {
            client
                .get("id")
                .and_then(Value::as_str)
                .and_then(|raw| raw.parse::<CredentialId>().ok())
                != Some(id)
        });
        Some(before - clients.len())
    }
}

impl Default for ClientsAdapter {
    fn default() -> Self {
        Self {
            pointer: DEFAULT_CLIENTS_POINTER.to_string(),
            template: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const A: &str = "00000000-0000-4000-8000-00000000000a";
    const B: &str = "00000000-0000-4000-8000-00000000000b";

    fn doc() -> Value {
        json!({
            "log": { "loglevel": "warning" },
            "inbounds": [{
                "port": 443,
                "protocol": "vless",
                "settings": {
                    "clients": [
                        { "id": A, "email": "a@example" },
                        { "email": "no-id" },
                        { "id": "alice" },
                        { "id": B }
                    ],
                    "decryption": "none"
                }
            }]
        })
    }

    fn id(s: &str) -> CredentialId {
        s.parse().unwrap()
    }

    #[test]
    fn test_new_rejects_relative_pointer() {
        assert!(ClientsAdapter::new("inbounds/0/settings/clients").is_err());
        assert!(ClientsAdapter::new("/clients").is_ok());
    }

    #[test]
    fn test_list_keeps_document_order_and_skips_non_uuid() {
        let adapter = ClientsAdapter::default();
        let live: Vec<_> = adapter.list(&doc()).unwrap().into_iter().collect();
        assert_eq!(live, vec![id(A), id(B)]);
    }

    #[test]
    fn test_list_missing_pointer() {
        let adapter = ClientsAdapter::new("/inbounds/1/settings/clients").unwrap();
        assert!(adapter.list(&doc()).is_none());

        let adapter = ClientsAdapter::new("/log").unwrap();
        assert!(adapter.list(&doc()).is_none());
    }

    #[test]
    fn test_add_is_append_only() {
        let adapter = ClientsAdapter::default();
        let mut doc = doc();

        adapter.add(&mut doc, id(A)).unwrap();

        let clients = doc.pointer("/inbounds/0/settings/clients").unwrap();
        assert_eq!(clients.as_array().unwrap().len(), 5);
        assert_eq!(clients[4], json!({ "id": A }));
    }

    #[test]
    fn test_add_applies_template() {
        let template = json!({ "flow": "xtls-rprx-vision", "id": "ignored" });
        let adapter = ClientsAdapter::default()
            .with_template(template.as_object().unwrap().clone());
        let mut doc = doc();

        adapter.add(&mut doc, id(B)).unwrap();

        let last = doc.pointer("/inbounds/0/settings/clients/4").unwrap();
        assert_eq!(last, &json!({ "id": B, "flow": "xtls-rprx-vision" }));
    }

    #[test]
    fn test_remove_deletes_all_matches_only() {
        let adapter = ClientsAdapter::default();
        let mut doc = doc();
        adapter.add(&mut doc, id(A)).unwrap();

        assert_eq!(adapter.remove(&mut doc, id(A)), Some(2));
        assert_eq!(adapter.remove(&mut doc, id(A)), Some(0));

        let clients = doc.pointer("/inbounds/0/settings/clients").unwrap();
        assert_eq!(
            clients,
            &json!([{ "email": "no-id" }, { "id": "alice" }, { "id": B }])
        );
        // untouched siblings
        assert_eq!(doc["inbounds"][0]["settings"]["decryption"], "none");
    }

    #[test]
    fn test_remove_matches_case_insensitively() {
        let adapter = ClientsAdapter::default();
        let mut doc = json!({ "inbounds": [{ "settings": { "clients": [
            { "id": A.to_uppercase() }
        ] } }] });

        assert_eq!(adapter.remove(&mut doc, id(A)), Some(1));
    }
}
