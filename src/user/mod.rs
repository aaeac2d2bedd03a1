pub mod session;
pub mod store;

pub use session::{customization_key, user_id_for, ProfileUpdate, Session, User, CURRENT_USER_KEY};
pub use store::LocalStore;
