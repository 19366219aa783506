//! Gas margin policy.
//!
//! Every state-changing contract call is submitted with the estimated
//! gas inflated by a fixed safety margin. The margin is a policy
//! constant, not tunable per call.

/// Safety margin applied on top of a gas estimate, in percent.
pub const GAS_MARGIN_PERCENT: u64 = 20;

/// Apply the margin, rounding down, matching `floor(estimate * 1.2)`.
pub fn with_margin(estimate: u64) -> u64 {
    ((estimate as u128 * (100 + GAS_MARGIN_PERCENT) as u128) / 100) as u64
}
