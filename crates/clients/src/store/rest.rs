// Path: crates/clients/src/store/rest.rs
use crate::{build_client, check_status};
use async_trait::async_trait;
use bridge_api::ProposalStore;
use bridge_types::error::BridgeError;
use bridge_types::{ProposalRecord, SubmissionUpdate};
use reqwest::{header, Client, RequestBuilder};

const SERVICE: &str = "store";
const KEY_COLUMN: &str = "contractAddress";

/// A proposal table exposed through a PostgREST-compatible API (e.g. Supabase).
#[derive(Clone)]
pub struct RestProposalStore {
    table_url: String,
    api_key: String,
    client: Client,
}

impl RestProposalStore {
    pub fn new(
        base_url: impl Into<String>,
        table: &str,
        api_key: impl Into<String>,
    ) -> Result<Self, BridgeError> {
        let base_url = base_url.into();
        Ok(Self {
            table_url: format!("{}/rest/v1/{}", base_url.trim_end_matches('/'), table),
            api_key: api_key.into(),
            client: build_client(SERVICE, Client::builder())?,
        })
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        if self.api_key.is_empty() {
            return req;
        }
        req.header("apikey", &self.api_key)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
    }

    async fn select(&self, filter: Option<&str>) -> Result<Vec<ProposalRecord>, BridgeError> {
        let mut query = vec![("select", "*".to_string())];
        if let Some(id) = filter {
            query.push((KEY_COLUMN, format!("eq.{id}")));
        }
        let resp = self
            .authed(self.client.get(&self.table_url).query(&query))
            .send()
            .await
            .map_err(|e| BridgeError::external(SERVICE, format!("select: {e}")))?;
        check_status(SERVICE, "select", resp)
            .await?
            .json::<Vec<ProposalRecord>>()
            .await
            .map_err(|e| BridgeError::external(SERVICE, format!("decode rows: {e}")))
    }
}

#[async_trait]
impl ProposalStore for RestProposalStore {
    async fn get(&self, contract_address: &str) -> Result<Option<ProposalRecord>, BridgeError> {
        Ok(self.select(Some(contract_address)).await?.into_iter().next())
    }

    async fn get_all(&self) -> Result<Vec<ProposalRecord>, BridgeError> {
        self.select(None).await
    }

    /// Upserts only the submission columns. With `merge-duplicates`, PostgREST
    /// updates just the columns present in the payload on conflict.
    async fn put(&self, update: SubmissionUpdate) -> Result<(), BridgeError> {
        let resp = self
            .authed(
                self.client
                    .post(&self.table_url)
                    .query(&[("on_conflict", KEY_COLUMN)])
                    .header("Prefer", "resolution=merge-duplicates,return=minimal")
                    .json(&[&update]),
            )
            .send()
            .await
            .map_err(|e| BridgeError::external(SERVICE, format!("upsert: {e}")))?;
        check_status(SERVICE, "upsert", resp).await?;
        tracing::debug!(target: "store", contract = %update.contract_address, "submission columns upserted");
        Ok(())
    }
}
