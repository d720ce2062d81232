use alloy::primitives::Address;
use async_trait::async_trait;
use flowbid_core::{
    error::ServiceError,
    services::{AuctionService, BidRequest},
    types::{
        launch::AuctionLaunch,
        plan::SubmissionPlan,
        primitives::{BlockNumber, PriceQ96, Quantity, RawQuantity, TokenAmount},
    },
};
use reqwest::header::HeaderMap;
use serde::Deserialize;

use super::http::JsonApi;

pub const FLOW_API_BASE_URL: &str = "https://api.flow.bid";

/// Flow launch API: launch metadata and bid transaction plans.
#[derive(Debug, Clone)]
pub struct FlowClient {
    api: JsonApi,
}

impl FlowClient {
    pub fn new() -> Result<Self, ServiceError> {
        Self::with_base_url(FLOW_API_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, ServiceError> {
        Ok(Self {
            api: JsonApi::new("Flow", base_url, HeaderMap::new())?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LaunchResponse {
    currency: Option<Address>,
    token_symbol: Option<String>,
    start_block: Option<RawQuantity>,
    end_block: Option<RawQuantity>,
    claim_block: Option<RawQuantity>,
    total_supply: Option<RawQuantity>,
    floor_price: Option<RawQuantity>,
}

impl LaunchResponse {
    fn into_launch(self, auction: Address, url: &str) -> Result<AuctionLaunch, ServiceError> {
        let required = |field: &'static str, raw: Option<RawQuantity>| {
            raw.ok_or(ServiceError::IncompleteLaunch { auction, field })
                .and_then(|raw| quantity(field, &raw, url))
        };
        let block = |field: &'static str, raw: Option<RawQuantity>| {
            required(field, raw)?
                .to_u64()
                .map(BlockNumber::new)
                .ok_or_else(|| ServiceError::Decode {
                    url: url.to_string(),
                    reason: format!("`{field}` is not a block number"),
                })
        };

        Ok(AuctionLaunch {
            auction,
            currency: self.currency.ok_or(ServiceError::IncompleteLaunch {
                auction,
                field: "currency",
            })?,
            token_symbol: self.token_symbol,
            start_block: block("startBlock", self.start_block)?,
            end_block: block("endBlock", self.end_block)?,
            claim_block: block("claimBlock", self.claim_block)?,
            total_supply: TokenAmount::new(required("totalSupply", self.total_supply)?.as_u256()),
            floor_price: self
                .floor_price
                .map(|raw| quantity("floorPrice", &raw, url).map(|q| PriceQ96::new(q.as_u256())))
                .transpose()?,
        })
    }
}

fn quantity(field: &str, raw: &RawQuantity, url: &str) -> Result<Quantity, ServiceError> {
    raw.parse().map_err(|reason| ServiceError::Decode {
        url: url.to_string(),
        reason: format!("`{field}`: {reason}"),
    })
}

#[async_trait]
impl AuctionService for FlowClient {
    async fn get_launch(&self, auction: Address) -> Result<AuctionLaunch, ServiceError> {
        let path = format!("/launches/{auction}");
        let response: Option<LaunchResponse> = self.api.get(&path).await?;
        let url = self.api.url(&path)?;
        response
            .unwrap_or_default()
            .into_launch(auction, url.as_str())
    }

    async fn build_bid_transactions(
        &self,
        request: &BidRequest,
    ) -> Result<Option<SubmissionPlan>, ServiceError> {
        self.api.post("/bids/build-tx", request).await
    }
}
