use crate::legacy::LegacyTransport;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::debug;

const COMMENT_SELECTOR: &str = "div.comments > div.editbox.comment[id*='cmt-']";
const TITLE_SELECTOR: &str = "div.title";
const BODY_SELECTOR: &str = "div.body";

/// A comment on the account-link mod post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkComment {
    pub author: String,
    pub comment: String,
}

/// Source of the comments users post their link token in.
#[async_trait]
pub trait LinkCommentSource: Send + Sync {
    async fn fetch_comments(&self) -> anyhow::Result<Vec<LinkComment>>;
}

/// Scrapes the comments off the public mod page HTML.
pub struct ModPostScraper {
    transport: Arc<dyn LegacyTransport>,
    post_url: String,
}

impl ModPostScraper {
    pub fn new(transport: Arc<dyn LegacyTransport>, post_url: impl Into<String>) -> Self {
        Self {
            transport,
            post_url: post_url.into(),
        }
    }
}

#[async_trait]
impl LinkCommentSource for ModPostScraper {
    async fn fetch_comments(&self) -> anyhow::Result<Vec<LinkComment>> {
        let body = self
            .transport
            .get(&self.post_url)
            .await
            .with_context(|| format!("Failed to load link post {}", self.post_url))?;
        let html = String::from_utf8_lossy(&body);
        let comments = parse_link_comments(&html)?;
        debug!(count = comments.len(), "scraped link post comments");
        Ok(comments)
    }
}

fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Bad selector {}: {:?}", css, e))
}

/// The title holds `<a>avatar</a> Name <span>date</span>`; the name is what
/// sits between the first closing anchor and the first span.
fn author_name(title: ElementRef<'_>) -> String {
    let inner = title.inner_html();
    let after_link = match inner.split_once("</a>") {
        Some((_, rest)) => rest,
        None => "",
    };
    let name = match after_link.split_once("<span") {
        Some((name, _)) => name,
        None => after_link,
    };
    name.trim().to_string()
}

pub fn parse_link_comments(html: &str) -> anyhow::Result<Vec<LinkComment>> {
    let comment_sel = selector(COMMENT_SELECTOR)?;
    let title_sel = selector(TITLE_SELECTOR)?;
    let body_sel = selector(BODY_SELECTOR)?;

    let document = Html::parse_document(html);
    let comments = document
        .select(&comment_sel)
        .map(|node| LinkComment {
            author: node
                .select(&title_sel)
                .next()
                .map(author_name)
                .unwrap_or_default(),
            comment: node
                .select(&body_sel)
                .next()
                .map(|b| b.text().collect::<String>())
                .unwrap_or_default(),
        })
        .collect();
    Ok(comments)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POST: &str = r#"
        <html><body>
        <div class="comments">
            <div class="editbox comment" id="cmt-101">
                <div class="title"><a href="/show/user/1"><img src="a.png"></a> alice <span class="date">2 hours ago</span></div>
                <div class="body"><p>my token is <b>abc123</b></p></div>
            </div>
            <div class="editbox comment" id="cmt-102">
                <div class="title"><a href="/show/user/2"></a>bob<span>now</span></div>
                <div class="body">hello</div>
            </div>
            <div class="editbox" id="other">
                <div class="title"><a></a>nobody<span></span></div>
                <div class="body">not a comment</div>
            </div>
        </div>
        </body></html>
    "#;

    #[test]
    fn extracts_author_and_text() {
        let comments = parse_link_comments(POST).unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].author, "alice");
        assert!(comments[0].comment.contains("my token is abc123"));
        assert_eq!(comments[1].author, "bob");
        assert_eq!(comments[1].comment, "hello");
    }

    #[test]
    fn page_without_comments() {
        assert!(parse_link_comments("<html><body></body></html>").unwrap().is_empty());
    }
}
