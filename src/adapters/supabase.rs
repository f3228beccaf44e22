use crate::domain::model::{Card, Identity, Wager};
use crate::domain::ports::{DecisionSink, MarketSource, UserDirectory};
use crate::utils::error::{Result, SwipeError};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// PostgREST client for the Supabase project backing the app.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    client: Client,
}

#[derive(Serialize)]
struct UserUpsert<'a> {
    privy_user_id: &'a str,
    wallet_address: Option<&'a str>,
}

#[derive(Deserialize)]
struct UserRow {
    id: serde_json::Value,
}

#[derive(Serialize)]
struct MatchMarketsArgs<'a> {
    target_user_id: &'a str,
    match_threshold: f64,
    match_count: usize,
}

impl SupabaseClient {
    pub fn new(base_url: &str, anon_key: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            client,
        })
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Backend error {}: {}", status, body);
        Err(SwipeError::BackendError {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl UserDirectory for SupabaseClient {
    async fn sync_user(&self, identity: &Identity) -> Result<String> {
        let url = self.rest_url("users");
        tracing::debug!("Upserting user {} at {}", identity.provider_user_id, url);

        let response = self
            .authorized(self.client.post(&url))
            .query(&[("on_conflict", "privy_user_id"), ("select", "id")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(&UserUpsert {
                privy_user_id: &identity.provider_user_id,
                wallet_address: identity.wallet_address.as_deref(),
            })
            .send()
            .await?;
        let response = Self::check(response).await?;

        let rows: Vec<UserRow> = response.json().await?;
        let row = rows.into_iter().next().ok_or_else(|| SwipeError::BackendError {
            status: 200,
            body: "user upsert returned no rows".to_string(),
        })?;

        Ok(match row.id {
            serde_json::Value::String(id) => id,
            other => other.to_string(),
        })
    }
}

#[async_trait]
impl MarketSource for SupabaseClient {
    async fn match_markets(
        &self,
        user_id: &str,
        threshold: f64,
        count: usize,
    ) -> Result<Vec<Card>> {
        let response = self
            .authorized(self.client.post(self.rest_url("rpc/match_markets")))
            .json(&MatchMarketsArgs {
                target_user_id: user_id,
                match_threshold: threshold,
                match_count: count,
            })
            .send()
            .await?;
        let cards: Vec<Card> = Self::check(response).await?.json().await?;
        tracing::debug!("match_markets returned {} cards", cards.len());
        Ok(cards)
    }

    async fn open_markets(&self, limit: usize) -> Result<Vec<Card>> {
        let limit = limit.to_string();
        let response = self
            .authorized(self.client.get(self.rest_url("markets")))
            .query(&[
                ("select", "*"),
                ("status", "eq.OPEN"),
                ("order", "created_at.desc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        let cards: Vec<Card> = Self::check(response).await?.json().await?;
        tracing::debug!("Global feed returned {} cards", cards.len());
        Ok(cards)
    }
}

#[async_trait]
impl DecisionSink for SupabaseClient {
    async fn record_decision(&self, wager: &Wager) -> Result<()> {
        let response = self
            .authorized(self.client.post(self.rest_url("bets")))
            .header("Prefer", "return=minimal")
            .json(wager)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
