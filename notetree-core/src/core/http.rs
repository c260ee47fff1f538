//! HTTP client for the note backend.

use crate::{
    Ack, AddTreeNodeRequest, ClientConfig, DataSourceItem, Envelope, FolderRequest, NoteAuthority, NoteDetail,
    NoteDraft, NoteSummary, NoteTreeError, Result, SidebarGroups, TreeAuthority,
};
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// [`TreeAuthority`] and [`NoteAuthority`] backed by the backend's JSON API.
///
/// Calls block the current thread until the server answers or the configured
/// timeout elapses. No call is retried.
#[derive(Debug, Clone)]
pub struct HttpAuthority {
    base_url: String,
    client: Client,
}

impl HttpAuthority {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("notetree/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Envelope<T>> {
        log::debug!("GET {path}");
        self.execute(path, self.client.get(self.url(path)).query(query))
    }

    fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<Envelope<T>> {
        log::debug!("POST {path}");
        self.execute(path, self.client.post(self.url(path)).json(body))
    }

    /// Sends the request and decodes the envelope.
    ///
    /// A non-2xx answer whose body is still an envelope is returned as such,
    /// so the server's message reaches the user.
    fn execute<T: DeserializeOwned>(&self, path: &str, request: RequestBuilder) -> Result<Envelope<T>> {
        let response = request.send()?;
        let status = response.status();
        let body = response.text()?;
        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => Ok(envelope),
            Err(e) if status.is_success() => {
                log::warn!("{path}: unreadable response: {e}");
                Err(NoteTreeError::Parse(e.to_string()))
            }
            Err(_) => {
                log::warn!("{path}: HTTP {status}");
                Err(NoteTreeError::Transport(format!("HTTP {status}")))
            }
        }
    }
}

impl TreeAuthority for HttpAuthority {
    fn fetch_tree(&self) -> Result<Envelope<SidebarGroups>> {
        self.get("/vitepress/GetVitePressSidebar", &[])
    }

    fn fetch_data_source(&self) -> Result<Envelope<Vec<DataSourceItem>>> {
        self.get("/notes/getRightDataSource", &[])
    }

    fn add_node(&self, request: &AddTreeNodeRequest) -> Result<Ack> {
        self.post("/notes/add_tree_node", request)
    }

    fn add_folder(&self, request: &FolderRequest) -> Result<Ack> {
        self.post("/notes/add_tree_folder", request)
    }

    fn remove_node(&self, node_id: &str, is_folder: bool) -> Result<Ack> {
        let is_folder = if is_folder { "true" } else { "false" };
        self.get("/notes/remove_tree_node", &[("id", node_id), ("isfolder", is_folder)])
    }

    fn remove_data_source_item(&self, item_id: &str) -> Result<Ack> {
        self.get("/notes/remove_data_source", &[("id", item_id)])
    }

    fn rename_node(&self, node_id: &str, name: &str) -> Result<Ack> {
        self.get("/notes/rename_tree_node", &[("nodeId", node_id), ("name", name)])
    }

    fn rename_folder(&self, request: &FolderRequest) -> Result<Ack> {
        self.post("/notes/rename_tree_folder", request)
    }
}

impl NoteAuthority for HttpAuthority {
    fn list_notes(&self) -> Result<Envelope<Vec<NoteSummary>>> {
        self.get("/notes/getAll", &[])
    }

    fn get_note(&self, note_id: &str) -> Result<Envelope<NoteDetail>> {
        self.get("/notes/getInfo", &[("id", note_id)])
    }

    fn add_note(&self, draft: &NoteDraft) -> Result<Ack> {
        self.post("/notes/add", draft)
    }

    fn edit_note(&self, draft: &NoteDraft) -> Result<Ack> {
        self.post("/notes/edit", draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = ClientConfig {
            api_base_url: "http://localhost:5000/".to_string(),
            ..ClientConfig::default()
        };
        let authority = HttpAuthority::new(&config).unwrap();
        assert_eq!(authority.base_url(), "http://localhost:5000");
        assert_eq!(authority.url("/notes/getAll"), "http://localhost:5000/notes/getAll");
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        let config = ClientConfig {
            // port 9 (discard) on localhost is normally closed
            api_base_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..ClientConfig::default()
        };
        let authority = HttpAuthority::new(&config).unwrap();
        let err = authority.fetch_tree().unwrap_err();
        assert!(matches!(err, NoteTreeError::Transport(_)));
    }
}
