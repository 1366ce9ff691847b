pub mod group;
pub mod investigator;
pub mod membership;
pub mod user;

pub use group::{Group, GroupMemberRow, GroupWithInvestigators, InvestigatorGroup, NewGroup};
pub use investigator::{Investigator, InvestigatorWithRole};
pub use membership::{Membership, NewMembership};
pub use user::{Credentials, User};
