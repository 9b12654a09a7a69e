mod account;
mod entities;
mod error;
mod models;
pub mod protocol;

pub use account::{AccountLinkRequest, ErrorCode, User, UserProfile};
pub use entities::{LocalMod, LocalModComment, StoredAsset};
pub use error::ModDbError;
pub use models::{
    Asset, GetModsResponse, LatestModComment, ModComment, ModCommentContentType, ModDetails,
    ModDisplay, ModListQuery, ModRelease, ModSortDirection, ModSortType, ModTag, SearchModsRequest,
};
