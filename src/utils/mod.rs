pub mod jwt;
pub mod pagination;
pub mod password;
pub mod seats;
pub mod time;
pub mod validation;
