//! Score-threshold badges.
//!
//! A [`BadgeSet`] always holds exactly one [`Badge`] per [`Tier`], in tier
//! order. Unlocking is monotonic; a badge must be unlocked before it can be
//! claimed and claimed before a mint can be recorded against it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Elite,
}

impl Tier {
    /// All tiers in ascending threshold order.
    pub const ALL: [Tier; 4] = [Tier::Bronze, Tier::Silver, Tier::Gold, Tier::Elite];

    /// Score required to unlock this tier.
    pub const fn threshold(self) -> u64 {
        match self {
            Tier::Bronze => 1024,
            Tier::Silver => 2048,
            Tier::Gold => 4096,
            Tier::Elite => 8192,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Elite => "elite",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

impl FromStr for Tier {
    type Err = BadgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BadgeError::UnknownTier(s.to_string()))
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BadgeError {
    #[error("unknown badge tier: {0:?}")]
    UnknownTier(String),
    #[error("{0} badge is not unlocked yet")]
    NotUnlocked(Tier),
    #[error("{0} badge was already claimed")]
    AlreadyClaimed(Tier),
    #[error("{0} badge must be claimed before it can be minted")]
    NotClaimed(Tier),
    #[error("{0} badge already has a mint record")]
    AlreadyMinted(Tier),
}

/// On-chain mint bookkeeping supplied by the minting collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintRecord {
    pub tx_hash: String,
    pub token_id: Option<u64>,
    pub minted_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub tier: Tier,
    pub threshold: u64,
    pub unlocked: bool,
    pub claimed: bool,
    /// Unix seconds of the claim.
    pub claimed_at: Option<u64>,
    pub mint: Option<MintRecord>,
}

impl Badge {
    pub fn locked(tier: Tier) -> Self {
        Badge {
            tier,
            threshold: tier.threshold(),
            unlocked: false,
            claimed: false,
            claimed_at: None,
            mint: None,
        }
    }

    // Canonical threshold, and no claim/mint data without the preceding step.
    fn normalized(mut self) -> Self {
        self.threshold = self.tier.threshold();
        if !self.unlocked {
            self.claimed = false;
        }
        if !self.claimed {
            self.claimed_at = None;
            self.mint = None;
        }
        self
    }
}

/// Exactly one badge per tier.
///
/// Deserializes from any list of badges, filling in missing tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Badge>", into = "Vec<Badge>")]
pub struct BadgeSet {
    badges: [Badge; 4],
}

/// Result of [`unlock_for_score`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unlock {
    pub badges: BadgeSet,
    pub changed: bool,
    /// Tiers unlocked by this call, in threshold order.
    pub newly_unlocked: Vec<Tier>,
}

impl Default for BadgeSet {
    fn default() -> Self {
        BadgeSet { badges: Tier::ALL.map(Badge::locked) }
    }
}

impl BadgeSet {
    /// Build a set from partial data.
    ///
    /// Missing tiers get a locked badge; for duplicated tiers the first entry wins.
    ///
    /// ```
    /// use badge_2048::badges::{Badge, BadgeSet, Tier};
    /// let mut gold = Badge::locked(Tier::Gold);
    /// gold.unlocked = true;
    /// let set = BadgeSet::normalize(vec![gold]);
    /// assert_eq!(set.iter().count(), 4);
    /// assert_eq!(set.unlocked_tiers(), vec![Tier::Gold]);
    /// ```
    pub fn normalize<I: IntoIterator<Item = Badge>>(partial: I) -> Self {
        let mut slots: [Option<Badge>; 4] = Default::default();
        for badge in partial {
            let slot = &mut slots[badge.tier.index()];
            if slot.is_none() {
                *slot = Some(badge.normalized());
            }
        }
        let mut set = BadgeSet::default();
        for (badge, slot) in set.badges.iter_mut().zip(slots) {
            if let Some(found) = slot {
                *badge = found;
            }
        }
        set
    }

    pub fn get(&self, tier: Tier) -> &Badge {
        &self.badges[tier.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Badge> {
        self.badges.iter()
    }

    pub fn unlocked_tiers(&self) -> Vec<Tier> {
        self.iter().filter(|b| b.unlocked).map(|b| b.tier).collect()
    }

    /// Mark an unlocked badge as claimed at `at` (unix seconds).
    pub fn claim(&self, tier: Tier, at: u64) -> Result<BadgeSet, BadgeError> {
        let current = self.get(tier);
        if !current.unlocked {
            return Err(BadgeError::NotUnlocked(tier));
        }
        if current.claimed {
            return Err(BadgeError::AlreadyClaimed(tier));
        }
        let mut next = self.clone();
        let badge = &mut next.badges[tier.index()];
        badge.claimed = true;
        badge.claimed_at = Some(at);
        tracing::info!(%tier, at, "badge claimed");
        Ok(next)
    }

    /// Attach the on-chain mint result to a claimed badge.
    pub fn record_mint(&self, tier: Tier, record: MintRecord) -> Result<BadgeSet, BadgeError> {
        let current = self.get(tier);
        if !current.claimed {
            return Err(BadgeError::NotClaimed(tier));
        }
        if current.mint.is_some() {
            return Err(BadgeError::AlreadyMinted(tier));
        }
        tracing::info!(%tier, tx_hash = %record.tx_hash, "badge mint recorded");
        let mut next = self.clone();
        next.badges[tier.index()].mint = Some(record);
        Ok(next)
    }

    /// Re-lock every badge. Test/reset tooling only.
    pub fn reset(&self) -> BadgeSet {
        tracing::warn!(unlocked = self.unlocked_tiers().len(), "resetting badge state");
        BadgeSet::default()
    }
}

impl From<Vec<Badge>> for BadgeSet {
    fn from(badges: Vec<Badge>) -> Self {
        BadgeSet::normalize(badges)
    }
}

impl From<BadgeSet> for Vec<Badge> {
    fn from(set: BadgeSet) -> Self {
        set.badges.into()
    }
}

/// Unlock every badge whose threshold `score` meets.
///
/// Never re-locks a badge.
///
/// ```
/// use badge_2048::badges::{unlock_for_score, BadgeSet, Tier};
/// let out = unlock_for_score(5000, &BadgeSet::default());
/// assert!(out.changed);
/// assert_eq!(out.newly_unlocked, vec![Tier::Bronze, Tier::Silver, Tier::Gold]);
/// ```
pub fn unlock_for_score(score: u64, badges: &BadgeSet) -> Unlock {
    let mut next = badges.clone();
    let mut newly_unlocked = Vec::new();
    for badge in next.badges.iter_mut() {
        if !badge.unlocked && score >= badge.threshold {
            badge.unlocked = true;
            newly_unlocked.push(badge.tier);
        }
    }
    if !newly_unlocked.is_empty() {
        tracing::info!(score, tiers = ?newly_unlocked, "badges unlocked");
    }
    Unlock { badges: next, changed: !newly_unlocked.is_empty(), newly_unlocked }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mint(tx: &str) -> MintRecord {
        MintRecord { tx_hash: tx.to_string(), token_id: Some(7), minted_at: 1_700_000_100 }
    }

    #[test]
    fn bronze_threshold_unlocks_only_bronze() {
        let out = unlock_for_score(1024, &BadgeSet::default());
        assert!(out.changed);
        assert_eq!(out.newly_unlocked, vec![Tier::Bronze]);
        assert_eq!(out.badges.unlocked_tiers(), vec![Tier::Bronze]);
    }

    #[test]
    fn five_thousand_stops_short_of_elite() {
        let out = unlock_for_score(5000, &BadgeSet::default());
        assert_eq!(out.newly_unlocked, vec![Tier::Bronze, Tier::Silver, Tier::Gold]);
        assert!(!out.badges.get(Tier::Elite).unlocked);
    }

    #[test]
    fn below_every_threshold_changes_nothing() {
        let out = unlock_for_score(1023, &BadgeSet::default());
        assert!(!out.changed);
        assert!(out.newly_unlocked.is_empty());
        assert_eq!(out.badges, BadgeSet::default());
    }

    #[test]
    fn unlocking_is_monotonic() {
        let high = unlock_for_score(9000, &BadgeSet::default()).badges;
        let after_low = unlock_for_score(0, &high);
        assert!(!after_low.changed);
        assert_eq!(after_low.badges.unlocked_tiers(), Tier::ALL.to_vec());
    }

    #[test]
    fn repeated_unlock_reports_only_new_tiers() {
        let first = unlock_for_score(2048, &BadgeSet::default());
        let second = unlock_for_score(4096, &first.badges);
        assert_eq!(second.newly_unlocked, vec![Tier::Gold]);
        let third = unlock_for_score(4096, &second.badges);
        assert!(!third.changed);
    }

    #[test]
    fn claim_requires_unlock() {
        let set = BadgeSet::default();
        assert_eq!(set.claim(Tier::Bronze, 1), Err(BadgeError::NotUnlocked(Tier::Bronze)));

        let set = unlock_for_score(1500, &set).badges;
        let claimed = set.claim(Tier::Bronze, 42).unwrap();
        let bronze = claimed.get(Tier::Bronze);
        assert!(bronze.claimed);
        assert_eq!(bronze.claimed_at, Some(42));
        assert_eq!(claimed.claim(Tier::Bronze, 43), Err(BadgeError::AlreadyClaimed(Tier::Bronze)));
    }

    #[test]
    fn mint_requires_claim() {
        let set = unlock_for_score(2048, &BadgeSet::default()).badges;
        assert_eq!(set.record_mint(Tier::Silver, mint("0xabc")), Err(BadgeError::NotClaimed(Tier::Silver)));

        let set = set.claim(Tier::Silver, 10).unwrap();
        let minted = set.record_mint(Tier::Silver, mint("0xabc")).unwrap();
        assert_eq!(minted.get(Tier::Silver).mint.as_ref().map(|m| m.tx_hash.as_str()), Some("0xabc"));
        assert_eq!(minted.record_mint(Tier::Silver, mint("0xdef")), Err(BadgeError::AlreadyMinted(Tier::Silver)));
    }

    #[test]
    fn normalize_fills_missing_and_repairs_inconsistent_badges() {
        let mut elite = Badge::locked(Tier::Elite);
        elite.threshold = 1;
        elite.claimed = true;
        elite.claimed_at = Some(5);
        let mut silver = Badge::locked(Tier::Silver);
        silver.unlocked = true;
        let duplicate = Badge::locked(Tier::Silver);

        let set = BadgeSet::normalize(vec![elite, silver, duplicate]);
        let tiers: Vec<Tier> = set.iter().map(|b| b.tier).collect();
        assert_eq!(tiers, Tier::ALL.to_vec());

        let elite = set.get(Tier::Elite);
        assert_eq!(elite.threshold, 8192);
        assert!(!elite.claimed);
        assert_eq!(elite.claimed_at, None);
        assert!(set.get(Tier::Silver).unlocked);
        assert!(!set.get(Tier::Bronze).unlocked);
    }

    #[test]
    fn reset_relocks_everything() {
        let set = unlock_for_score(10_000, &BadgeSet::default()).badges;
        assert_eq!(set.reset(), BadgeSet::default());
    }

    #[test]
    fn tier_from_str() {
        assert_eq!("Gold".parse::<Tier>(), Ok(Tier::Gold));
        assert_eq!(" elite ".parse::<Tier>(), Ok(Tier::Elite));
        assert!(matches!("platinum".parse::<Tier>(), Err(BadgeError::UnknownTier(_))));
    }
}
