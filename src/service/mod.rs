//! Service layer over Microsoft Graph.
//!
//! Each service wraps the shared [`GraphClient`](crate::graph::GraphClient)
//! and exposes one domain's operations with typed results. The MCP tools
//! are thin adapters over these.

pub mod applications;
pub mod conditional_access;
pub mod devices;
pub mod groups;
pub mod logs;
pub mod mfa;
pub mod password;
pub mod permissions;
pub mod service_principals;
pub mod users;

pub use applications::ApplicationService;
pub use conditional_access::ConditionalAccessService;
pub use devices::DeviceService;
pub use groups::GroupService;
pub use logs::LogService;
pub use mfa::MfaService;
pub use password::{PasswordReset, PasswordService};
pub use permissions::PermissionService;
pub use service_principals::ServicePrincipalService;
pub use users::UserService;
