//! Repository traits for portfolio persistence.

pub mod attachments;
pub mod positions;
pub mod profiles;

pub use attachments::AttachmentRepo;
pub use positions::PositionRepo;
pub use profiles::ProfileRepo;
