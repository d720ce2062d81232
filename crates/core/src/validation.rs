use rust_decimal::Decimal;

use crate::{
    error::{PlanError, ValidationError},
    types::{
        launch::AuctionLaunch,
        phase::Phase,
        plan::{PreparedStep, SubmissionPlan},
        primitives::BlockNumber,
    },
};

/// Agent balances in whole units: ETH for gas and the settlement currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balances {
    pub native: Decimal,
    pub currency: Decimal,
}

pub fn validate_bid_input(amount: Decimal, max_fdv_usd: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::AmountTooSmall);
    }

    if max_fdv_usd <= Decimal::ZERO {
        return Err(ValidationError::MaxValuationTooSmall);
    }

    Ok(())
}

/// Bids are accepted in the pre-bid and clearing phases.
pub fn validate_phase(
    current_block: BlockNumber,
    launch: &AuctionLaunch,
) -> Result<Phase, ValidationError> {
    match launch.phase_at(current_block) {
        Phase::BeforeStart => Err(ValidationError::AuctionNotStarted {
            current_block,
            start_block: launch.start_block,
        }),
        Phase::Ended => Err(ValidationError::AuctionEnded {
            current_block,
            end_block: launch.end_block,
        }),
        phase => Ok(phase),
    }
}

pub fn validate_balances(
    required_currency: Decimal,
    min_native: Decimal,
    balances: &Balances,
) -> Result<(), ValidationError> {
    if balances.currency < required_currency {
        return Err(ValidationError::InsufficientCurrency {
            required: required_currency,
            available: balances.currency,
            shortfall: required_currency - balances.currency,
        });
    }

    if balances.native < min_native {
        return Err(ValidationError::InsufficientNative {
            required: min_native,
            available: balances.native,
            shortfall: min_native - balances.native,
        });
    }

    Ok(())
}

/// Every step is normalized up front so a malformed step never leaves a
/// partially submitted plan behind.
pub fn validate_plan(plan: Option<SubmissionPlan>) -> Result<Vec<PreparedStep>, PlanError> {
    plan.ok_or(PlanError::Missing)?.prepare()
}
