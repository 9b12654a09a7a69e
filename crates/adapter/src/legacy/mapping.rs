use chrono::{DateTime, Utc};
use domain::protocol::{LegacyComment, LegacyMod, LegacyModDetails, LegacyModRelease, LegacyTag};
use domain::{ModComment, ModCommentContentType, ModDetails, ModDisplay, ModRelease, ModTag};

pub(crate) const UNKNOWN_USER: &str = "unknown user";

pub(crate) fn to_mod_display(m: &LegacyMod) -> ModDisplay {
    ModDisplay {
        id: m.mod_id,
        name: m.name.clone(),
        author: m.author.clone(),
        url_alias: m.url_alias.clone(),
        summary: m.summary.clone(),
        downloads: m.downloads,
        comments: m.comments,
    }
}

pub(crate) fn to_mod_release(r: &LegacyModRelease) -> ModRelease {
    ModRelease {
        file_name: r.file_name.clone(),
        downloads: r.downloads,
        game_versions: r.tags.clone(),
        mod_id: r.mod_id_str.clone(),
        mod_version: r.mod_version.clone(),
        time_created_utc: r.created,
    }
}

/// Tag names missing from the tag table are dropped.
pub(crate) fn to_mod_tags(names: &[String], table: &[LegacyTag]) -> Vec<ModTag> {
    names
        .iter()
        .filter_map(|name| table.iter().find(|t| &t.name == name))
        .map(|t| ModTag {
            value: t.name.clone(),
            color: t.color.clone(),
        })
        .collect()
}

pub(crate) fn to_mod_details(
    details: &LegacyModDetails,
    summary: Option<String>,
    tags: Vec<ModTag>,
) -> ModDetails {
    ModDetails {
        id: details.mod_id,
        name: details.name.clone(),
        summary,
        url_alias: details.url_alias.clone(),
        time_created_utc: details.created,
        time_updated_utc: details.last_modified,
        description: details.text.clone(),
        tags,
        author: details.author.clone(),
        side: details.side.clone(),
        downloads: details.downloads,
        follows: details.follows,
        homepage_url: details.homepage_url.clone(),
        source_code_url: details.source_code_url.clone(),
        issue_tracker_url: details.issue_tracker_url.clone(),
        wiki_url: details.wiki_url.clone(),
        releases: details.releases.iter().map(to_mod_release).collect(),
    }
}

pub(crate) fn to_mod_comment(c: &LegacyComment, author: Option<&str>) -> ModComment {
    ModComment {
        author: author.unwrap_or(UNKNOWN_USER).to_string(),
        comment: c.text.clone(),
        content_type: ModCommentContentType::Html,
        time_created_utc: c.created,
        time_updated_utc: non_epoch(c.last_modified),
    }
}

fn non_epoch(at: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (at != DateTime::<Utc>::default()).then_some(at)
}
