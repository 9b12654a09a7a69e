mod account_links;
mod cache;
mod mods;
mod sessions;
mod users;
