//! Shared identifiers, point categories and the narrow capability traits through which
//! the rest of tally reads the external identity/role directory.

pub mod category;
pub mod directory;
pub mod ids;

pub use category::Category;
pub use directory::{Directory, DirectorySnapshot, Member, MemberRecord, StaticDirectory};
pub use ids::{EntityId, Marker, ScopeId};
