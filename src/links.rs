use std::sync::LazyLock;

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;

static WIKI_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").expect("valid wiki link regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub start: usize,
    pub end: usize,
    pub destination: String,
    pub text: String,
}

/// Parse Markdown content and extract links with their byte ranges
pub fn extract_links(content: &str) -> Vec<Link> {
    let mut links = Vec::new();
    let parser = Parser::new(content);

    let mut current_link: Option<(usize, String)> = None;
    let mut link_text = String::new();

    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(Tag::Link { dest_url, .. }) => {
                current_link = Some((range.start, dest_url.to_string()));
                link_text.clear();
            }
            Event::Text(text) | Event::Code(text) if current_link.is_some() => {
                link_text.push_str(&text);
            }
            Event::End(TagEnd::Link) => {
                if let Some((start, dest)) = current_link.take() {
                    links.push(Link {
                        start,
                        end: range.end,
                        destination: dest,
                        text: link_text.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    for cap in WIKI_LINK_RE.captures_iter(content) {
        if let (Some(matched), Some(page)) = (cap.get(0), cap.get(1)) {
            links.push(Link {
                start: matched.start(),
                end: matched.end(),
                destination: page.as_str().to_string(),
                text: page.as_str().to_string(),
            });
        }
    }

    links.sort_by_key(|l| l.start);
    links
}

/// The link whose source range starts exactly at `start`
pub fn link_starting_at(links: &[Link], start: usize) -> Option<&Link> {
    links.iter().find(|link| link.start == start)
}
