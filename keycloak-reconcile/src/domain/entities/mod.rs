pub mod authz;
pub mod client;
pub mod common;
pub mod diff;
pub mod group;
pub mod rbac;
pub mod role;
pub mod user;

pub use authz::*;
pub use client::*;
pub use common::*;
pub use diff::*;
pub use group::*;
pub use rbac::*;
pub use role::*;
pub use user::*;
