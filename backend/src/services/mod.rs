pub mod contact_service;
pub mod session_store;
