pub mod auth;
pub mod groups;
pub mod investigators;
pub mod memberships;
