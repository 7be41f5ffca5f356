//! Reward catalog records.

use serde::{Deserialize, Serialize};

/// Reserved reward id meaning "redeem the entire current balance".
///
/// It is never stored in the catalog; front-ends synthesize it.
pub const REDEEM_ALL: i64 = 0;

/// A redeemable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardItem {
    pub id: i64,
    pub name: String,
    pub cost: u64,
    pub description: Option<String>,
    /// Where and how to pick the reward up.
    pub collection_info: String,
    pub is_available: bool,
}

/// Input for adding a catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReward {
    pub name: String,
    pub cost: i64,
    pub description: Option<String>,
    pub collection_info: String,
}

/// What a redemption request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemTarget {
    /// The whole balance.
    All,
    /// A catalog item by id.
    Item(i64),
}

impl RedeemTarget {
    /// Interpret a raw reward id, mapping [`REDEEM_ALL`] to [`RedeemTarget::All`].
    #[must_use]
    pub const fn from_reward_id(reward_id: i64) -> Self {
        if reward_id == REDEEM_ALL {
            Self::All
        } else {
            Self::Item(reward_id)
        }
    }

    #[must_use]
    pub const fn reward_id(self) -> i64 {
        match self {
            Self::All => REDEEM_ALL,
            Self::Item(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_means_redeem_all() {
        assert_eq!(RedeemTarget::from_reward_id(0), RedeemTarget::All);
        assert_eq!(RedeemTarget::from_reward_id(7), RedeemTarget::Item(7));
        assert_eq!(RedeemTarget::All.reward_id(), REDEEM_ALL);
    }
}
