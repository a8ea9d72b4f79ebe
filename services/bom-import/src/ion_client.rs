//! ION API Client
//!
//! Blocking GraphQL client for the parts and MBOM endpoints.

use anyhow::{Context, Result};
use ion_models::{LinkHandle, PartHandle, PartInput};
use ion_utils::ApiConfig;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::remote::{PartsApi, RemoteError};

const GET_PARTS: &str = r#"
    query GetParts($filters: PartsInputFilters) {
        parts(filters: $filters) {
            edges { node { id partNumber } }
        }
    }
"#;

const CREATE_PART: &str = r#"
    mutation CreatePart($input: CreatePartInput!) {
        createPart(input: $input) {
            part { id partNumber }
        }
    }
"#;

const CREATE_MBOM_ITEM: &str = r#"
    mutation CreateMbomItem($input: CreateMBomItemInput!) {
        createMbomItem(input: $input) {
            mbomItem { id }
        }
    }
"#;

/// ION GraphQL client
pub struct IonClient {
    client: Client,
    endpoint: String,
    access_token: Option<String>,
}

impl IonClient {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: graphql_endpoint(&config.url),
            access_token: config.access_token.clone(),
        })
    }

    fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, RemoteError> {
        let mut request = self.client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&json!({ "query": query, "variables": variables }));
        if let Some(token) = &self.access_token {
            request = request.header("Authorization", token.as_str());
        }

        let response = request
            .send()
            .map_err(|e| {
                RemoteError::Transport(format!("request to {} failed: {}", self.endpoint, e))
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(RemoteError::Unauthorized(format!("ION answered {}", status)));
        }
        if !status.is_success() {
            return Err(RemoteError::Transport(format!("ION answered {}", status)));
        }

        let body: GraphqlResponse<T> = response
            .json()
            .map_err(|e| RemoteError::Transport(format!("invalid response body: {}", e)))?;

        body.into_result()
    }
}

/// Joins the GraphQL path onto the configured API root
fn graphql_endpoint(base_url: &str) -> String {
    format!("{}/graphql", base_url.trim_end_matches('/'))
}

impl PartsApi for IonClient {
    fn find_part(&mut self, part_number: &str) -> Result<Option<PartHandle>, RemoteError> {
        debug!(part_number, "looking up part");
        let data: PartsData = self.execute(
            GET_PARTS,
            json!({ "filters": { "partNumber": { "eq": part_number } } }),
        )?;
        Ok(data.into_handles().into_iter().find(|p| p.part_number == part_number))
    }

    fn find_parts(&mut self, part_numbers: &[String]) -> Result<Vec<PartHandle>, RemoteError> {
        if part_numbers.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = part_numbers.len(), "looking up parts");
        let data: PartsData = self.execute(
            GET_PARTS,
            json!({ "filters": { "partNumber": { "in": part_numbers } } }),
        )?;
        Ok(data.into_handles())
    }

    fn create_part(&mut self, input: &PartInput) -> Result<PartHandle, RemoteError> {
        debug!(part_number = %input.part_number, "creating part");
        let data: CreatePartData = self.execute(CREATE_PART, json!({ "input": input }))?;
        Ok(data.create_part.part)
    }

    fn create_link(
        &mut self,
        parent: &PartHandle,
        child: &PartHandle,
        quantity: f64,
    ) -> Result<LinkHandle, RemoteError> {
        debug!(
            parent = %parent.part_number,
            child = %child.part_number,
            quantity,
            "creating MBOM item"
        );
        let data: CreateMbomItemData = self.execute(
            CREATE_MBOM_ITEM,
            json!({ "input": { "partId": child.id, "parentId": parent.id, "quantity": quantity } }),
        )?;

        Ok(LinkHandle {
            id: data.create_mbom_item.mbom_item.id,
            parent_id: parent.id,
            child_id: child.id,
            quantity,
        })
    }
}

/// GraphQL response envelope
#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

impl<T> GraphqlResponse<T> {
    /// ION reports validation and uniqueness failures in `errors`
    fn into_result(self) -> Result<T, RemoteError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(RemoteError::Rejected(error.message));
        }
        self.data
            .ok_or_else(|| {
                RemoteError::Transport("response carried neither data nor errors".to_string())
            })
    }
}

#[derive(Debug, Deserialize)]
struct PartsData {
    parts: PartConnection,
}

#[derive(Debug, Deserialize)]
struct PartConnection {
    edges: Vec<PartEdge>,
}

#[derive(Debug, Deserialize)]
struct PartEdge {
    node: PartHandle,
}

impl PartsData {
    fn into_handles(self) -> Vec<PartHandle> {
        self.parts.edges.into_iter().map(|e| e.node).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatePartData {
    create_part: CreatedPart,
}

#[derive(Debug, Deserialize)]
struct CreatedPart {
    part: PartHandle,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMbomItemData {
    create_mbom_item: CreatedMbomItem,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedMbomItem {
    mbom_item: MbomItemId,
}

#[derive(Debug, Deserialize)]
struct MbomItemId {
    #[serde(deserialize_with = "ion_models::id_from_number_or_string")]
    id: i64,
}
