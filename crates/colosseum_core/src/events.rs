//! # Notification Signals
//!
//! Every mutating operation emits one structured notification carrying an
//! operation tag plus the affected entity ids. External settlers and bots
//! consume the rendered `Tag:<id>[:key=value]` strings to decide when to run
//! their settlement sweeps; in-process consumers can match on the enum
//! directly.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::identity::Address;

/// A structured notification emitted by a mutating operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// A character was created.
    CharacterCreated {
        /// Character id.
        id: String,
    },
    /// A character stat upgrade was purchased with xp.
    CharacterUpgraded {
        /// Character id.
        id: String,
        /// Upgraded stat name.
        stat: String,
    },
    /// Xp was granted to a character.
    XpGranted {
        /// Character id.
        id: String,
        /// Amount granted.
        amount: u64,
        /// Level after any auto-levelling.
        level: u32,
    },
    /// A character learned a skill.
    SkillLearned {
        /// Character id.
        id: String,
        /// Skill id.
        skill: u8,
    },
    /// A learned skill was placed into a slot.
    SkillEquipped {
        /// Character id.
        id: String,
        /// Slot index (1-3).
        slot: u8,
        /// Skill id.
        skill: u8,
    },
    /// Equipment was minted.
    EquipmentMinted {
        /// Equipment id.
        id: String,
        /// Receiving owner.
        owner: Address,
    },
    /// Equipment changed owner.
    EquipmentTransferred {
        /// Equipment id.
        id: String,
        /// New owner.
        to: Address,
    },
    /// Equipment was assigned into a character slot.
    ItemEquipped {
        /// Character id.
        character: String,
        /// Equipment id.
        equipment: String,
    },
    /// A battle was created.
    BattleCreated {
        /// Battle id.
        id: String,
    },
    /// A turn resolved damage.
    TurnResolved {
        /// Battle id.
        battle: String,
        /// Turn number that resolved.
        turn: u32,
        /// Damage applied to the defender.
        damage: u64,
        /// Whether the hit was critical.
        crit: bool,
        /// Whether the defender dodged.
        dodged: bool,
    },
    /// A wildcard event interrupted a turn.
    WildcardTriggered {
        /// Battle id.
        battle: String,
        /// Wildcard kind name.
        kind: String,
        /// Decision deadline (unix seconds).
        deadline: u64,
    },
    /// One side submitted a wildcard decision.
    WildcardDecided {
        /// Battle id.
        battle: String,
        /// Deciding side (1 or 2).
        side: u8,
        /// The decision.
        accepted: bool,
    },
    /// Both wildcard decisions arrived and the effect resolved.
    WildcardResolved {
        /// Battle id.
        battle: String,
        /// Wildcard kind name.
        kind: String,
        /// Whether the effect actually fired (both sides accepted).
        activated: bool,
    },
    /// A wildcard deadline passed; missing decisions counted as decline.
    WildcardExpired {
        /// Battle id.
        battle: String,
    },
    /// A side's HP reached zero and the battle finished.
    BattleFinished {
        /// Battle id.
        battle: String,
        /// Winning side (1 or 2).
        winner: u8,
    },
    /// Post-battle finalize ran: records updated, settlement signal live.
    BattleFinalized {
        /// Battle id.
        battle: String,
        /// Winning side (1 or 2).
        winner: u8,
    },
    /// A stalled battle was forfeited by the side that failed to act.
    BattleForfeited {
        /// Battle id.
        battle: String,
        /// Winning side (1 or 2).
        winner: u8,
    },
    /// A parimutuel pool was created.
    SinglePoolCreated {
        /// Pool id.
        id: String,
        /// Linked battle id.
        battle: String,
    },
    /// A bet entered a pool.
    SingleBetPlaced {
        /// Pool id.
        pool: String,
        /// Bettor address.
        bettor: Address,
        /// Chosen outcome (`A` or `B`).
        outcome: char,
        /// Staked amount (raw asset units).
        amount: u128,
    },
    /// Betting closed and odds were snapshotted.
    SinglePoolClosed {
        /// Pool id.
        id: String,
        /// Fixed-point odds for outcome A (scale 1e6).
        odds_a: u128,
        /// Fixed-point odds for outcome B (scale 1e6).
        odds_b: u128,
    },
    /// An authorized settler recorded the winning outcome.
    SinglePoolSettled {
        /// Pool id.
        pool: String,
        /// Winning outcome (`A` or `B`).
        winner: char,
    },
    /// A bet claim paid out (or recorded a zero-payout loss).
    SingleBetClaimed {
        /// Pool id.
        pool: String,
        /// Bettor address.
        bettor: Address,
        /// Payout transferred (raw asset units, 0 for a losing bet).
        payout: u128,
        /// Streak bonus transferred on top of the payout.
        bonus: u128,
    },
    /// A parlay multipool was created.
    MultipoolCreated {
        /// Multipool id.
        id: String,
    },
    /// A parlay ticket was placed.
    MultibetPlaced {
        /// Betslip id.
        betslip: String,
        /// Multipool id.
        multipool: String,
        /// Staked amount (raw asset units).
        amount: u128,
        /// Combined fixed-point odds across all legs (scale 1e6).
        combined_odds: u128,
    },
    /// A betslip's winner status was accounted against settled pools.
    BetslipAccounted {
        /// Betslip id.
        betslip: String,
        /// Whether every leg matched its settled outcome.
        winner: bool,
    },
    /// A multipool's payouts were frozen.
    MultipoolFinalized {
        /// Multipool id.
        id: String,
    },
    /// A betslip claim paid out (or recorded a zero-payout loss).
    BetslipClaimed {
        /// Betslip id.
        betslip: String,
        /// Payout transferred (raw asset units, 0 for a losing ticket).
        payout: u128,
    },
    /// A role was granted.
    RoleGranted {
        /// Role name.
        role: String,
        /// Grantee.
        addr: Address,
    },
    /// A role was revoked.
    RoleRevoked {
        /// Role name.
        role: String,
        /// Former holder.
        addr: Address,
    },
    /// All mutating entry points paused.
    Paused,
    /// Mutating entry points resumed.
    Unpaused,
    /// An address joined the authorized-settler allow-list.
    SettlerAuthorized {
        /// The settler address.
        addr: Address,
    },
    /// An address left the authorized-settler allow-list.
    SettlerRevoked {
        /// The settler address.
        addr: Address,
    },
    /// Accrued house edge was paid out of the treasury counter.
    TreasuryWithdrawn {
        /// Receiving address.
        to: Address,
        /// Amount withdrawn (raw asset units).
        amount: u128,
    },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CharacterCreated { id } => write!(f, "CharacterCreated:{id}"),
            Self::CharacterUpgraded { id, stat } => write!(f, "CharacterUpgraded:{id}:stat={stat}"),
            Self::XpGranted { id, amount, level } => {
                write!(f, "XpGranted:{id}:amount={amount}:level={level}")
            }
            Self::SkillLearned { id, skill } => write!(f, "SkillLearned:{id}:skill={skill}"),
            Self::SkillEquipped { id, slot, skill } => {
                write!(f, "SkillEquipped:{id}:slot={slot}:skill={skill}")
            }
            Self::EquipmentMinted { id, owner } => write!(f, "EquipmentMinted:{id}:owner={owner}"),
            Self::EquipmentTransferred { id, to } => {
                write!(f, "EquipmentTransferred:{id}:to={to}")
            }
            Self::ItemEquipped {
                character,
                equipment,
            } => write!(f, "ItemEquipped:{character}:equipment={equipment}"),
            Self::BattleCreated { id } => write!(f, "BattleCreated:{id}"),
            Self::TurnResolved {
                battle,
                turn,
                damage,
                crit,
                dodged,
            } => write!(
                f,
                "TurnResolved:{battle}:turn={turn}:damage={damage}:crit={crit}:dodged={dodged}"
            ),
            Self::WildcardTriggered {
                battle,
                kind,
                deadline,
            } => write!(f, "WildcardTriggered:{battle}:kind={kind}:deadline={deadline}"),
            Self::WildcardDecided {
                battle,
                side,
                accepted,
            } => write!(f, "WildcardDecided:{battle}:side={side}:accepted={accepted}"),
            Self::WildcardResolved {
                battle,
                kind,
                activated,
            } => write!(f, "WildcardResolved:{battle}:kind={kind}:activated={activated}"),
            Self::WildcardExpired { battle } => write!(f, "WildcardExpired:{battle}"),
            Self::BattleFinished { battle, winner } => {
                write!(f, "BattleFinished:{battle}:winner={winner}")
            }
            Self::BattleFinalized { battle, winner } => {
                write!(f, "BattleFinalized:{battle}:winner={winner}")
            }
            Self::BattleForfeited { battle, winner } => {
                write!(f, "BattleForfeited:{battle}:winner={winner}")
            }
            Self::SinglePoolCreated { id, battle } => {
                write!(f, "SinglePoolCreated:{id}:battle={battle}")
            }
            Self::SingleBetPlaced {
                pool,
                bettor,
                outcome,
                amount,
            } => write!(
                f,
                "SingleBetPlaced:{pool}:bettor={bettor}:outcome={outcome}:amount={amount}"
            ),
            Self::SinglePoolClosed { id, odds_a, odds_b } => {
                write!(f, "SinglePoolClosed:{id}:oddsA={odds_a}:oddsB={odds_b}")
            }
            Self::SinglePoolSettled { pool, winner } => {
                write!(f, "SinglePoolSettled:{pool}:winner={winner}")
            }
            Self::SingleBetClaimed {
                pool,
                bettor,
                payout,
                bonus,
            } => write!(
                f,
                "SingleBetClaimed:{pool}:bettor={bettor}:payout={payout}:bonus={bonus}"
            ),
            Self::MultipoolCreated { id } => write!(f, "MultipoolCreated:{id}"),
            Self::MultibetPlaced {
                betslip,
                multipool,
                amount,
                combined_odds,
            } => write!(
                f,
                "MultibetPlaced:{betslip}:multipool={multipool}:amount={amount}:odds={combined_odds}"
            ),
            Self::BetslipAccounted { betslip, winner } => {
                write!(f, "BetslipAccounted:{betslip}:winner={winner}")
            }
            Self::MultipoolFinalized { id } => write!(f, "MultipoolFinalized:{id}"),
            Self::BetslipClaimed { betslip, payout } => {
                write!(f, "BetslipClaimed:{betslip}:payout={payout}")
            }
            Self::RoleGranted { role, addr } => write!(f, "RoleGranted:{role}:addr={addr}"),
            Self::RoleRevoked { role, addr } => write!(f, "RoleRevoked:{role}:addr={addr}"),
            Self::Paused => write!(f, "Paused"),
            Self::Unpaused => write!(f, "Unpaused"),
            Self::SettlerAuthorized { addr } => write!(f, "SettlerAuthorized:{addr}"),
            Self::SettlerRevoked { addr } => write!(f, "SettlerRevoked:{addr}"),
            Self::TreasuryWithdrawn { to, amount } => {
                write!(f, "TreasuryWithdrawn:{to}:amount={amount}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settlement_signal_format() {
        let n = Notification::BattleFinalized {
            battle: "b1".into(),
            winner: 1,
        };
        assert_eq!(n.to_string(), "BattleFinalized:b1:winner=1");

        let n = Notification::SinglePoolSettled {
            pool: "p1".into(),
            winner: 'A',
        };
        assert_eq!(n.to_string(), "SinglePoolSettled:p1:winner=A");
    }

    #[test]
    fn test_creation_signal_format() {
        let n = Notification::CharacterCreated { id: "c9".into() };
        assert_eq!(n.to_string(), "CharacterCreated:c9");
    }
}
