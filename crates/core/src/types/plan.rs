use alloy::primitives::{Address, Bytes};
use serde::{Deserialize, Serialize};

use crate::error::PlanError;

use super::primitives::{Quantity, RawQuantity};

/// Transactions the auction service wants signed for one bid, in order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SubmissionPlan {
    #[serde(rename = "transactions", default)]
    pub steps: Vec<PlanStep>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "PlanStepRepr")]
pub struct PlanStep {
    pub transaction: RawTransaction,
    pub description: Option<String>,
}

/// Steps arrive either wrapped (`{ "transaction": {..}, "description": ".." }`)
/// or as a bare transaction object.
#[derive(Deserialize)]
#[serde(untagged)]
enum PlanStepRepr {
    Wrapped {
        transaction: RawTransaction,
        description: Option<String>,
    },
    Bare {
        #[serde(flatten)]
        transaction: RawTransaction,
        description: Option<String>,
    },
}

impl From<PlanStepRepr> for PlanStep {
    fn from(repr: PlanStepRepr) -> Self {
        match repr {
            PlanStepRepr::Wrapped {
                transaction,
                description,
            }
            | PlanStepRepr::Bare {
                transaction,
                description,
            } => Self {
                transaction,
                description,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub to: Option<Address>,
    pub chain_id: Option<RawQuantity>,
    pub value: Option<RawQuantity>,
    pub data: Option<Bytes>,
    pub gas: Option<RawQuantity>,
    pub gas_price: Option<RawQuantity>,
    pub max_fee_per_gas: Option<RawQuantity>,
    pub max_priority_fee_per_gas: Option<RawQuantity>,
    pub nonce: Option<RawQuantity>,
}

/// Canonical shape handed to the custody relay. Wide integers travel as
/// decimal strings; optional fields are omitted unless the plan set them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedTransaction {
    pub to: Address,
    pub chain_id: u64,
    pub value: String,
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStep {
    pub transaction: NormalizedTransaction,
    pub description: String,
}

impl RawTransaction {
    pub fn normalize(&self) -> Result<NormalizedTransaction, String> {
        let to = self.to.ok_or("missing `to`")?;
        let chain_id = quantity("chainId", &self.chain_id)?
            .ok_or("missing `chainId`")?
            .to_u64()
            .ok_or("`chainId` out of range")?;
        let nonce = quantity("nonce", &self.nonce)?
            .map(|nonce| nonce.to_u64().ok_or("`nonce` out of range"))
            .transpose()?;
        let decimal = |field: &str, raw: &Option<RawQuantity>| {
            quantity(field, raw).map(|q| q.map(|q| q.to_string()))
        };

        Ok(NormalizedTransaction {
            to,
            chain_id,
            value: decimal("value", &self.value)?.unwrap_or_else(|| "0".into()),
            data: self.data.clone().unwrap_or_default(),
            gas: decimal("gas", &self.gas)?,
            gas_price: decimal("gasPrice", &self.gas_price)?,
            max_fee_per_gas: decimal("maxFeePerGas", &self.max_fee_per_gas)?,
            max_priority_fee_per_gas: decimal(
                "maxPriorityFeePerGas",
                &self.max_priority_fee_per_gas,
            )?,
            nonce,
        })
    }
}

fn quantity(field: &str, raw: &Option<RawQuantity>) -> Result<Option<Quantity>, String> {
    raw.as_ref()
        .map(|raw| raw.parse().map_err(|err| format!("`{field}`: {err}")))
        .transpose()
}

impl SubmissionPlan {
    /// Normalizes every step up front so a malformed later step never
    /// leaves an earlier one submitted on its own.
    pub fn prepare(&self) -> Result<Vec<PreparedStep>, PlanError> {
        if self.steps.is_empty() {
            return Err(PlanError::Empty);
        }

        let total = self.steps.len();
        self.steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let transaction =
                    step.transaction
                        .normalize()
                        .map_err(|reason| PlanError::MalformedStep {
                            step: index + 1,
                            total,
                            reason,
                        })?;
                let description = step
                    .description
                    .clone()
                    .unwrap_or_else(|| format!("Flow bid tx {}/{}", index + 1, total));
                Ok(PreparedStep {
                    transaction,
                    description,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan(value: serde_json::Value) -> SubmissionPlan {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_wrapped_and_bare_steps() {
        let plan = plan(json!({
            "transactions": [
                {
                    "transaction": {
                        "to": "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
                        "chainId": 8453,
                        "data": "0x095ea7b3"
                    },
                    "description": "Approve USDC"
                },
                {
                    "to": "0xF762AC1553c29Ef36904F9E7F71C627766D878b4",
                    "chainId": "8453",
                    "value": "0",
                    "data": "0xdeadbeef",
                    "maxFeePerGas": "0x3b9aca00",
                    "nonce": 4
                }
            ]
        }));

        let steps = plan.prepare().unwrap();
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].description, "Approve USDC");
        assert_eq!(steps[1].description, "Flow bid tx 2/2");
        assert_eq!(steps[1].transaction.max_fee_per_gas.as_deref(), Some("1000000000"));
        assert_eq!(steps[1].transaction.nonce, Some(4));
    }

    #[test]
    fn normalized_json_omits_unset_fields() {
        let plan = plan(json!({
            "transactions": [{
                "to": "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
                "chainId": 8453,
                "value": "340282366920938463463374607431768211456",
                "gas": 210000
            }]
        }));

        let step = &plan.prepare().unwrap()[0];
        let body = serde_json::to_value(&step.transaction).unwrap();
        assert_eq!(body["chainId"], json!(8453));
        assert_eq!(body["value"], json!("340282366920938463463374607431768211456"));
        assert_eq!(body["gas"], json!("210000"));
        assert_eq!(body["data"], json!("0x"));
        assert!(body.get("gasPrice").is_none());
        assert!(body.get("nonce").is_none());
    }

    #[test]
    fn malformed_step_names_its_position() {
        let plan = plan(json!({
            "transactions": [
                { "to": "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913", "chainId": 8453 },
                { "to": "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913" }
            ]
        }));

        assert_eq!(
            plan.prepare(),
            Err(PlanError::MalformedStep {
                step: 2,
                total: 2,
                reason: "missing `chainId`".into()
            })
        );
    }

    #[test]
    fn unparsable_quantity_is_a_malformed_step() {
        let plan = plan(json!({
            "transactions": [{
                "to": "0x833589fcd6edb6e08f4c7c32d4f71b54bda02913",
                "chainId": 8453,
                "gas": "lots"
            }]
        }));

        match plan.prepare() {
            Err(PlanError::MalformedStep { step: 1, total: 1, reason }) => {
                assert!(reason.starts_with("`gas`"), "{reason}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_plan_is_rejected() {
        assert_eq!(plan(json!({})).prepare(), Err(PlanError::Empty));
        assert_eq!(plan(json!({ "transactions": [] })).prepare(), Err(PlanError::Empty));
    }
}
