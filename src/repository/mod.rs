pub mod group;
pub mod session;

pub use group::GroupRepository;
pub use session::SessionRepository;
