use scraper::{Html, Selector};

/// The `rel` attribute of an anchor, either as authored or already split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rel {
    Text(String),
    Tokens(Vec<String>),
}

impl Rel {
    /// Case-insensitive token membership, e.g. `nofollow` in `"Noopener NoFollow"`.
    pub fn contains_token(&self, token: &str) -> bool {
        match self {
            Rel::Text(text) => text
                .split_ascii_whitespace()
                .any(|t| t.eq_ignore_ascii_case(token)),
            Rel::Tokens(tokens) => tokens.iter().any(|t| t.trim().eq_ignore_ascii_case(token)),
        }
    }
}

/// Attributes of one `<a>` element, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    pub href: Option<String>,
    pub target: Option<String>,
    pub rel: Option<Rel>,
}

impl Anchor {
    pub fn new(href: &str) -> Self {
        Self {
            href: Some(href.to_string()),
            ..Self::default()
        }
    }

    pub fn with_target(mut self, target: &str) -> Self {
        self.target = Some(target.to_string());
        self
    }

    pub fn with_rel(mut self, rel: Rel) -> Self {
        self.rel = Some(rel);
        self
    }

    pub fn opens_new_window(&self) -> bool {
        self.target.as_deref() == Some("_blank")
    }

    pub fn is_nofollow(&self) -> bool {
        self.rel.as_ref().is_some_and(|rel| rel.contains_token("nofollow"))
    }
}

/// Extracts every anchor element from an HTML document.
pub fn extract_anchors(html: &str) -> Vec<Anchor> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("a").expect("static selector is valid");

    document
        .select(&selector)
        .map(|element| {
            let attrs = element.value();
            Anchor {
                href: attrs.attr("href").map(str::to_string),
                target: attrs.attr("target").map(str::to_string),
                rel: attrs.attr("rel").map(|rel| Rel::Text(rel.to_string())),
            }
        })
        .collect()
}
