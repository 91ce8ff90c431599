pub mod home;
pub mod oauth;
pub mod session;
pub mod users;
pub mod votes;
pub mod works;
