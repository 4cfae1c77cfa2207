// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScrapingSettings;
use crate::domain::models::scrape_result::PageHeader;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::node::Element;
use scraper::{Html, Node};
use std::collections::HashSet;
use url::Url;

static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// 提取选项
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// 链接上限，0表示不限制
    pub max_links: usize,
    /// 图片上限，0表示不限制
    pub max_images: usize,
    pub extract_images: bool,
    pub extract_headers: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            max_links: 0,
            max_images: 0,
            extract_images: true,
            extract_headers: true,
        }
    }
}

impl From<&ScrapingSettings> for ExtractionOptions {
    fn from(settings: &ScrapingSettings) -> Self {
        Self {
            max_links: settings.max_links,
            max_images: settings.max_images,
            extract_images: settings.extract_images,
            extract_headers: settings.extract_headers,
        }
    }
}

/// 从DOM中提取出的页面数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub author: String,
    pub language: String,
    pub image_url: String,
    pub site_name: String,
    pub links: Vec<String>,
    pub images: Vec<String>,
    pub headers: Vec<PageHeader>,
}

/// 提取服务
///
/// 负责从 HTML 内容中提取结构化数据。整个文档只做一次深度优先遍历。
pub struct ExtractionService {
    options: ExtractionOptions,
}

impl ExtractionService {
    pub fn new(options: ExtractionOptions) -> Self {
        Self { options }
    }

    /// 提取页面数据
    ///
    /// # 参数
    ///
    /// * `html` - 已解码的HTML文本
    /// * `base_url` - 页面自身的URL，用于解析相对链接
    ///
    /// # 返回值
    ///
    /// 提取出的页面数据
    pub fn extract(&self, html: &str, base_url: &Url) -> ExtractedPage {
        let document = Html::parse_document(html);
        let mut visitor = PageVisitor::new(&self.options, base_url);
        for node in document.tree.root().descendants() {
            let first_text = node
                .first_child()
                .and_then(|child| child.value().as_text())
                .map(|text| &**text);
            visitor.visit(node.value(), first_text);
        }
        visitor.page
    }
}

/// 去掉所有标签后按空白统计单词数
pub fn calculate_word_count(content: &str) -> u64 {
    TAG_PATTERN
        .replace_all(content, " ")
        .split_whitespace()
        .count() as u64
}

/// 遍历中关心的元素种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Title,
    Meta,
    Anchor,
    Image,
    Heading(u8),
    Other,
}

impl Tag {
    fn of(name: &str) -> Self {
        match name {
            "title" => Tag::Title,
            "meta" => Tag::Meta,
            "a" => Tag::Anchor,
            "img" => Tag::Image,
            "h1" => Tag::Heading(1),
            "h2" => Tag::Heading(2),
            "h3" => Tag::Heading(3),
            "h4" => Tag::Heading(4),
            "h5" => Tag::Heading(5),
            "h6" => Tag::Heading(6),
            _ => Tag::Other,
        }
    }
}

/// description 的来源，`name=description` 优先于 `og:description`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DescriptionSource {
    Name,
    OpenGraph,
}

struct PageVisitor<'a> {
    options: &'a ExtractionOptions,
    base_url: &'a Url,
    page: ExtractedPage,
    title_seen: bool,
    description_source: Option<DescriptionSource>,
    seen_links: HashSet<String>,
    seen_images: HashSet<String>,
}

impl<'a> PageVisitor<'a> {
    fn new(options: &'a ExtractionOptions, base_url: &'a Url) -> Self {
        Self {
            options,
            base_url,
            page: ExtractedPage::default(),
            title_seen: false,
            description_source: None,
            seen_links: HashSet::new(),
            seen_images: HashSet::new(),
        }
    }

    /// `first_text` 为节点第一个子节点的文本，第一个子节点不是文本时为None
    fn visit(&mut self, node: &Node, first_text: Option<&str>) {
        let Node::Element(element) = node else {
            return;
        };

        match Tag::of(element.name()) {
            Tag::Title => self.visit_title(first_text),
            Tag::Meta => self.visit_meta(element),
            Tag::Anchor => self.visit_anchor(element),
            Tag::Image if self.options.extract_images => self.visit_image(element),
            Tag::Heading(level) if self.options.extract_headers => {
                self.visit_heading(first_text, level)
            }
            _ => {}
        }
    }

    fn visit_title(&mut self, first_text: Option<&str>) {
        if self.title_seen {
            return;
        }
        self.title_seen = true;
        if let Some(text) = first_text {
            self.page.title = text.trim().to_string();
        }
    }

    fn visit_meta(&mut self, element: &Element) {
        let name = element.attr("name").map(str::to_ascii_lowercase);
        let property = element.attr("property").map(str::to_ascii_lowercase);
        let content = element.attr("content").unwrap_or_default().to_string();

        match (name.as_deref(), property.as_deref()) {
            (Some("description"), _) => {
                if self.description_source != Some(DescriptionSource::Name) {
                    self.page.description = content;
                    self.description_source = Some(DescriptionSource::Name);
                }
            }
            (_, Some("og:description")) => {
                if self.description_source.is_none() {
                    self.page.description = content;
                    self.description_source = Some(DescriptionSource::OpenGraph);
                }
            }
            (Some("keywords"), _) => self.page.keywords = content,
            (Some("author"), _) => self.page.author = content,
            (Some("language"), _) | (_, Some("og:locale")) => self.page.language = content,
            (_, Some("og:image")) => self.page.image_url = content,
            (_, Some("og:site_name")) => self.page.site_name = content,
            _ => {}
        }
    }

    fn visit_anchor(&mut self, element: &Element) {
        if at_cap(self.page.links.len(), self.options.max_links) {
            return;
        }
        let Some(href) = element.attr("href").map(str::trim) else {
            return;
        };
        if href.is_empty()
            || href.starts_with('#')
            || href
                .get(..11)
                .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
        {
            return;
        }

        if let Some(absolute) = resolve(self.base_url, href) {
            if self.seen_links.insert(absolute.clone()) {
                self.page.links.push(absolute);
            }
        }
    }

    fn visit_image(&mut self, element: &Element) {
        if at_cap(self.page.images.len(), self.options.max_images) {
            return;
        }
        let Some(src) = element.attr("src").map(str::trim) else {
            return;
        };
        if src.is_empty() {
            return;
        }

        if let Some(absolute) = resolve(self.base_url, src) {
            if self.seen_images.insert(absolute.clone()) {
                self.page.images.push(absolute);
            }
        }
    }

    fn visit_heading(&mut self, first_text: Option<&str>, level: u8) {
        let Some(text) = first_text else {
            return;
        };
        let text = text.trim();
        if !text.is_empty() {
            self.page.headers.push(PageHeader {
                level,
                text: text.to_string(),
            });
        }
    }
}

fn resolve(base: &Url, reference: &str) -> Option<String> {
    base.join(reference).ok().map(String::from)
}

fn at_cap(len: usize, cap: usize) -> bool {
    cap != 0 && len >= cap
}
