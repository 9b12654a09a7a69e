mod password;
mod service;
mod verification;

pub use password::{hash_password, verify_password, MIN_PASSWORD_LENGTH};
pub use service::{AccountOptions, AccountService, LinkDetails, Session};
pub use verification::{parse_link_comments, LinkComment, LinkCommentSource, ModPostScraper};
