mod current_user;
mod token_store;

pub use current_user::TokenCurrentUser;
pub use token_store::FileTokenStore;
