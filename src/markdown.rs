use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};
use regex::{Captures, Regex};

/// Inline style forced onto rendered images so layout doesn't jump while
/// they load asynchronously.
const MEDIA_STYLE: &str = "max-width: 100% !important; max-height: 400px !important; width: auto !important; height: auto !important; display: block !important; margin: 1.5rem auto !important; object-fit: contain !important;";

/// Languages that get a `language-*` class on their code fence; anything
/// else renders as a bare escaped block.
const KNOWN_LANGUAGES: &[&str] = &[
    "javascript",
    "typescript",
    "python",
    "bash",
    "json",
    "yaml",
    "html",
    "css",
    "java",
    "go",
    "rust",
    "sql",
];

pub const DEFAULT_BASE: &str = "/content";

/// Which base directory colocated images resolve under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentKind {
    Pattern,
    #[default]
    Blueprint,
}

impl ContentKind {
    fn dir(self) -> &'static str {
        match self {
            ContentKind::Pattern => "build/patterns",
            ContentKind::Blueprint => "build/blueprints",
        }
    }
}

pub struct Renderer {
    base: String,
    image_ref: Regex,
    svg_tag: Regex,
    img_tag: Regex,
    dimension_attr: Regex,
    style_attr: Regex,
    bare_url: Regex,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_BASE)
    }
}

impl Renderer {
    /// `base` is the deployed site's path prefix that rewritten relative
    /// image references are rooted under.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        Renderer {
            base: base.into(),
            image_ref: Regex::new(
                r"(?i)!\[([^\]]*)\]\(\./([^)]+?\.(?:svg|png|jpe?g|gif|webp|bmp|tiff|ico))\)",
            )
            .expect("image reference pattern must compile"),
            svg_tag: Regex::new(r"(?i)<svg([^>]*)>").expect("svg pattern must compile"),
            img_tag: Regex::new(r"(?i)<img([^>]*?)/?>").expect("img pattern must compile"),
            dimension_attr: Regex::new(r#"(?i)\s*(?:width|height)\s*=\s*("[^"]*"|'[^']*')"#)
                .expect("dimension pattern must compile"),
            style_attr: Regex::new(r#"(?i)style\s*=\s*["']([^"']*)["']"#)
                .expect("style pattern must compile"),
            bare_url: Regex::new(r"https?://[^\s<>]+").expect("url pattern must compile"),
        }
    }

    /// Renders markdown to HTML. A context slug makes `./image.ext`
    /// references resolve against the content kind's base directory.
    /// Rendering is total; there is no failure path back to the caller.
    #[must_use]
    pub fn render(&self, markdown: &str, context_slug: Option<&str>, kind: ContentKind) -> String {
        let source = match context_slug {
            Some(slug) => self.rewrite_image_refs(markdown, slug, kind),
            None => markdown.to_owned(),
        };

        let options = Options::ENABLE_TABLES | Options::ENABLE_SMART_PUNCTUATION;
        let events = self.transform(Parser::new_ext(&source, options));

        let mut out = String::new();
        html::push_html(&mut out, events.into_iter());
        self.normalize_media(&out)
    }

    fn rewrite_image_refs(&self, markdown: &str, slug: &str, kind: ContentKind) -> String {
        self.image_ref
            .replace_all(markdown, |caps: &Captures<'_>| {
                format!(
                    "![{}]({}/{}/{slug}/{})",
                    &caps[1],
                    self.base,
                    kind.dir(),
                    &caps[2]
                )
            })
            .into_owned()
    }

    fn transform<'a>(&self, parser: Parser<'a>) -> Vec<Event<'a>> {
        let mut events = Vec::new();
        let mut code: Option<(Option<String>, String)> = None;
        let mut link_depth = 0usize;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(block_kind)) => {
                    let lang = match block_kind {
                        CodeBlockKind::Fenced(tag) if !tag.is_empty() => tag
                            .split_whitespace()
                            .next()
                            .map(str::to_lowercase),
                        _ => None,
                    };
                    code = Some((lang, String::new()));
                }
                Event::Text(text) => {
                    if let Some((_, buffered)) = &mut code {
                        buffered.push_str(&text);
                    } else if link_depth == 0 {
                        self.autolink(text, &mut events);
                    } else {
                        events.push(Event::Text(text));
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, buffered)) = code.take() {
                        events.push(Event::Html(
                            code_block_html(lang.as_deref(), &buffered).into(),
                        ));
                    }
                }
                Event::Start(Tag::Link { .. } | Tag::Image { .. }) => {
                    link_depth += 1;
                    events.push(event);
                }
                Event::End(TagEnd::Link | TagEnd::Image) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(event);
                }
                other => events.push(other),
            }
        }

        events
    }

    /// Splits bare URLs out of a text run into explicit link events.
    fn autolink<'a>(&self, text: CowStr<'a>, events: &mut Vec<Event<'a>>) {
        if !self.bare_url.is_match(&text) {
            events.push(Event::Text(text));
            return;
        }

        let mut last = 0;
        for found in self.bare_url.find_iter(&text) {
            let url = found
                .as_str()
                .trim_end_matches(&['.', ',', ';', ':', '!', '?'][..]);
            if url.is_empty() {
                continue;
            }
            if found.start() > last {
                events.push(Event::Text(text[last..found.start()].to_owned().into()));
            }
            events.push(Event::Start(Tag::Link {
                link_type: LinkType::Autolink,
                dest_url: url.to_owned().into(),
                title: "".into(),
                id: "".into(),
            }));
            events.push(Event::Text(url.to_owned().into()));
            events.push(Event::End(TagEnd::Link));
            last = found.start() + url.len();
        }
        if last < text.len() {
            events.push(Event::Text(text[last..].to_owned().into()));
        }
    }

    /// Strips literal width/height from `<svg>`/`<img>` and pins a
    /// normalized inline style instead.
    fn normalize_media(&self, html: &str) -> String {
        let html = self
            .svg_tag
            .replace_all(html, |caps: &Captures<'_>| {
                let attrs = self.dimension_attr.replace_all(&caps[1], "");
                format!("<svg{attrs} style=\"{MEDIA_STYLE}\">")
            })
            .into_owned();

        self.img_tag
            .replace_all(&html, |caps: &Captures<'_>| {
                let attrs = self.dimension_attr.replace_all(&caps[1], "").into_owned();
                if self.style_attr.is_match(&attrs) {
                    let attrs = self.style_attr.replace(&attrs, |style: &Captures<'_>| {
                        format!("style=\"{}; {MEDIA_STYLE}\"", &style[1])
                    });
                    format!("<img{attrs}>")
                } else {
                    format!("<img{attrs} style=\"{MEDIA_STYLE}\">")
                }
            })
            .into_owned()
    }
}

fn code_block_html(lang: Option<&str>, code: &str) -> String {
    let escaped = escape_html(code);
    match lang.filter(|lang| KNOWN_LANGUAGES.contains(lang)) {
        Some(lang) => format!(
            "<pre class=\"hljs\"><code class=\"hljs language-{lang}\">{escaped}</code></pre>\n"
        ),
        None => format!("<pre class=\"hljs\"><code class=\"hljs\">{escaped}</code></pre>\n"),
    }
}

/// Escaped fragment for callers that must surface a failure in-page.
#[must_use]
pub fn error_fragment(message: &str) -> String {
    format!("<p class=\"error\">{}</p>", escape_html(message))
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
