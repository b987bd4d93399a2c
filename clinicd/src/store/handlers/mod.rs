//! Typed repositories, one per key namespace.

pub mod appointments;
pub mod history;
pub mod notes;
pub mod otp;
pub mod repository;
pub mod reset_tokens;
pub mod users;

pub use appointments::Appointments;
pub use history::History;
pub use notes::Notes;
pub use otp::OtpChallenges;
pub use repository::Repository;
pub use reset_tokens::ResetTokens;
pub use users::Users;
