//! Server resource binding
//!
//! A thin typed surface over the generic request pipeline, covering the
//! server list endpoints.

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;

use crate::client::{Client, ListOpts};
use crate::error::Result;
use crate::response::ApiResponse;

/// A server in the project.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Server {
    pub id: u64,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ServerListResponse {
    servers: Vec<Server>,
}

impl Client {
    /// Returns one page of servers for the given list options.
    pub async fn list_servers(&self, opts: &ListOpts) -> Result<(ApiResponse, Vec<Server>)> {
        let query = opts.to_query();
        let path = if query.is_empty() {
            "/servers".to_string()
        } else {
            format!("/servers?{query}")
        };
        let request = self.build_request(Method::GET, &path, None)?;
        let (response, list): (ApiResponse, ServerListResponse) =
            self.fetch_decoded(request).await?;
        Ok((response, list.servers))
    }

    /// Returns all servers, following the server-advertised pagination
    /// until the last page.
    pub async fn all_servers(&self) -> Result<Vec<Server>> {
        let collected = RefCell::new(Vec::new());
        let collected = &collected;
        self.all_pages(move |page| async move {
            let (response, servers) = self
                .list_servers(&ListOpts {
                    page,
                    ..Default::default()
                })
                .await?;
            collected.borrow_mut().extend(servers);
            Ok(response)
        })
        .await?;
        Ok(collected.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_deserializes_from_list_body() {
        let body = r#"{
            "servers": [
                {
                    "id": 42,
                    "name": "my-server",
                    "status": "running",
                    "created": "2016-01-30T23:50:00+00:00",
                    "labels": {"env": "prod"}
                }
            ]
        }"#;
        let list: ServerListResponse = serde_json::from_str(body).unwrap();
        assert_eq!(list.servers.len(), 1);
        let server = &list.servers[0];
        assert_eq!(server.id, 42);
        assert_eq!(server.name, "my-server");
        assert_eq!(server.status, "running");
        assert_eq!(server.labels["env"], "prod");
        assert!(server.created.is_some());
    }

    #[test]
    fn server_tolerates_missing_optional_fields() {
        let server: Server =
            serde_json::from_str(r#"{"id": 1, "name": "a", "status": "off"}"#).unwrap();
        assert!(server.created.is_none());
        assert!(server.labels.is_empty());
    }
}
