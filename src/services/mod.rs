pub mod newsletter;
pub mod oauth;
pub mod storage;
