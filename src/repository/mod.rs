pub mod groups;
pub mod investigators;
pub mod memberships;
pub mod users;

pub use groups::{GroupFilters, GroupRepository, MemberSpec};
pub use investigators::InvestigatorRepository;
pub use memberships::MembershipRepository;
pub use users::UserRepository;
