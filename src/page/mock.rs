//! In-memory page for tests and the built-in demo.
//!
//! `MockDocument` is a small element tree with a current URL and title.
//! Elements can carry an activation handler: a closure over the mutable
//! document that may navigate, retitle, add or remove nodes, fill values or
//! fail with a message (the equivalent of a click handler that throws).

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::backend::Page;
use super::selector::SelectorList;
use super::types::{ComputedStyle, ElementInfo, PageError, PageResult, Rect};

/// Click handler attached to a mock element
pub type ActivationHandler = Arc<dyn Fn(&mut MockDocument) -> Result<(), String> + Send + Sync>;

/// Identity of a node in a [`MockDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// Builder for a mock element
#[derive(Clone)]
pub struct MockElement {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    style: ComputedStyle,
    rect: Rect,
    value: Option<String>,
    handler: Option<ActivationHandler>,
}

impl fmt::Debug for MockElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockElement")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("text", &self.text)
            .field("style", &self.style)
            .field("rect", &self.rect)
            .field("value", &self.value)
            .field("has_handler", &self.handler.is_some())
            .finish()
    }
}

impl MockElement {
    /// A visible 100x32 element with no attributes
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            style: ComputedStyle::default(),
            rect: Rect::new(0.0, 0.0, 100.0, 32.0),
            value: None,
            handler: None,
        }
    }

    /// Own text (descendant text is appended by `textContent`)
    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn id(self, id: &str) -> Self {
        self.attr("id", id)
    }

    pub fn disabled(self) -> Self {
        self.attr("disabled", "")
    }

    pub fn display(mut self, display: &str) -> Self {
        self.style.display = display.to_string();
        self
    }

    pub fn visibility(mut self, visibility: &str) -> Self {
        self.style.visibility = visibility.to_string();
        self
    }

    pub fn opacity(mut self, opacity: &str) -> Self {
        self.style.opacity = opacity.to_string();
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.rect.width = width;
        self.rect.height = height;
        self
    }

    /// Form control value
    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Inline style text (the `style` attribute)
    pub fn inline_style(self, css: &str) -> Self {
        self.attr("style", css)
    }

    pub fn on_activate<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut MockDocument) -> Result<(), String> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }
}

#[derive(Debug, Clone)]
struct MockNode {
    element: MockElement,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

/// Mutable document state behind a [`MockPage`]
#[derive(Debug, Clone)]
pub struct MockDocument {
    url: String,
    title: String,
    nodes: Vec<MockNode>,
    roots: Vec<NodeId>,
}

impl MockDocument {
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn navigate(&mut self, url: &str) {
        self.url = url.to_string();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Append `element` as the last child of `parent`, or as a new root
    pub fn append(&mut self, parent: Option<NodeId>, element: MockElement) -> NodeId {
        let id = NodeId(self.nodes.len());
        let parent = parent.filter(|p| p.0 < self.nodes.len());
        self.nodes.push(MockNode {
            element,
            parent,
            children: Vec::new(),
            attached: true,
        });
        match parent {
            Some(p) => self.nodes[p.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    /// Detach a node (and with it its subtree) from the document
    pub fn remove(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id.0) else {
            return;
        };
        node.attached = false;
        let parent = node.parent;
        match parent {
            Some(p) => self.nodes[p.0].children.retain(|c| *c != id),
            None => self.roots.retain(|r| *r != id),
        }
    }

    pub fn set_value(&mut self, id: NodeId, value: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.element.value = Some(value.to_string());
        }
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.element
                .attributes
                .insert(name.to_ascii_lowercase(), value.to_string());
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.element.attributes.remove(&name.to_ascii_lowercase());
        }
    }

    /// Replace the activation handler of an existing node
    pub fn set_handler<F>(&mut self, id: NodeId, handler: F)
    where
        F: Fn(&mut MockDocument) -> Result<(), String> + Send + Sync + 'static,
    {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.element.handler = Some(Arc::new(handler));
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(id.0)
            .and_then(|n| n.element.attributes.get(name))
            .map(String::as_str)
    }

    /// Attached nodes in pre-order (document order)
    pub fn document_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            let Some(node) = self.nodes.get(current.0) else {
                return false;
            };
            if !node.attached {
                return false;
            }
            match node.parent {
                Some(p) => current = p,
                None => return self.roots.contains(&current),
            }
        }
    }

    /// Own text followed by the text of every descendant
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        out.push_str(&node.element.text);
        for child in &node.children {
            self.collect_text(*child, out);
        }
    }

    fn ancestors_inclusive(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = self.nodes[id.0].parent;
        while let Some(p) = current {
            chain.push(p);
            current = self.nodes[p.0].parent;
        }
        chain
    }

    /// `display: none` anywhere up the chain collapses the layout box
    fn layout_rect(&self, id: NodeId) -> Rect {
        let hidden = self
            .ancestors_inclusive(id)
            .iter()
            .any(|a| self.nodes[a.0].element.style.display == "none");
        if hidden {
            Rect::default()
        } else {
            self.nodes[id.0].element.rect
        }
    }

    fn info(&self, id: NodeId) -> ElementInfo {
        let element = &self.nodes[id.0].element;
        ElementInfo {
            tag: element.tag.clone(),
            text: self.text_content(id),
            attributes: element.attributes.clone(),
            style: element.style.clone(),
            rect: self.layout_rect(id),
            value: element.value.clone(),
        }
    }

    fn matches(&self, id: NodeId, selector: &SelectorList) -> bool {
        let element = &self.nodes[id.0].element;
        selector.matches(&element.tag, &element.attributes)
    }

    fn require_attached(&self, id: NodeId) -> PageResult<()> {
        if self.is_attached(id) {
            Ok(())
        } else {
            Err(PageError::Detached(format!("{:?}", id)))
        }
    }
}

/// [`Page`] implementation over a [`MockDocument`]
#[derive(Debug)]
pub struct MockPage {
    document: Mutex<MockDocument>,
    activations: Mutex<HashMap<NodeId, usize>>,
}

impl MockPage {
    pub fn new(document: MockDocument) -> Self {
        Self {
            document: Mutex::new(document),
            activations: Mutex::new(HashMap::new()),
        }
    }

    /// Run `f` against the document, e.g. to build the tree or inspect it after a run
    pub fn with_document<R>(&self, f: impl FnOnce(&mut MockDocument) -> R) -> R {
        let mut doc = self.doc();
        f(&mut *doc)
    }

    /// How many times `id` was activated
    pub fn activation_count(&self, id: NodeId) -> usize {
        self.counts().get(&id).copied().unwrap_or(0)
    }

    pub fn total_activations(&self) -> usize {
        self.counts().values().sum()
    }

    fn doc(&self) -> MutexGuard<'_, MockDocument> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn counts(&self) -> MutexGuard<'_, HashMap<NodeId, usize>> {
        self.activations.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Page for MockPage {
    type Handle = NodeId;

    async fn query_all(&self, selector: &str) -> PageResult<Vec<NodeId>> {
        let selector = SelectorList::parse(selector)?;
        let doc = self.doc();
        Ok(doc
            .document_order()
            .into_iter()
            .filter(|id| doc.matches(*id, &selector))
            .collect())
    }

    async fn count(&self, selector: &str) -> PageResult<usize> {
        Ok(self.query_all(selector).await?.len())
    }

    async fn inspect(&self, element: &NodeId) -> PageResult<ElementInfo> {
        let doc = self.doc();
        doc.require_attached(*element)?;
        Ok(doc.info(*element))
    }

    async fn closest(&self, element: &NodeId, selector: &str) -> PageResult<Option<ElementInfo>> {
        let selector = SelectorList::parse(selector)?;
        let doc = self.doc();
        doc.require_attached(*element)?;
        Ok(doc
            .ancestors_inclusive(*element)
            .into_iter()
            .find(|id| doc.matches(*id, &selector))
            .map(|id| doc.info(id)))
    }

    async fn current_url(&self) -> PageResult<String> {
        Ok(self.doc().url.clone())
    }

    async fn title(&self) -> PageResult<String> {
        Ok(self.doc().title.clone())
    }

    async fn inline_style(&self, element: &NodeId) -> PageResult<String> {
        let doc = self.doc();
        doc.require_attached(*element)?;
        Ok(doc.attribute(*element, "style").unwrap_or("").to_string())
    }

    async fn set_inline_style(&self, element: &NodeId, css: &str) -> PageResult<()> {
        let mut doc = self.doc();
        doc.require_attached(*element)?;
        doc.set_attribute(*element, "style", css);
        Ok(())
    }

    async fn scroll_into_view(&self, element: &NodeId) -> PageResult<()> {
        self.doc().require_attached(*element)
    }

    async fn activate(&self, element: &NodeId) -> PageResult<()> {
        let mut doc = self.doc();
        doc.require_attached(*element)?;
        *self.counts().entry(*element).or_insert(0) += 1;

        let node = &doc.nodes[element.0].element;
        // browsers swallow clicks on disabled form controls
        let inert = node.attributes.contains_key("disabled")
            && matches!(node.tag.as_str(), "button" | "input" | "select" | "textarea");
        if inert {
            return Ok(());
        }
        let handler = node.handler.clone();
        let href = (node.tag == "a")
            .then(|| node.attributes.get("href").cloned())
            .flatten();

        if let Some(handler) = handler {
            handler(&mut *doc).map_err(PageError::Activation)?;
        }
        if let Some(href) = href {
            let target = url::Url::parse(&doc.url)
                .and_then(|base| base.join(&href))
                .map(|u| u.to_string())
                .unwrap_or(href);
            doc.navigate(&target);
        }
        Ok(())
    }

    fn source_type(&self) -> &str {
        "mock"
    }
}
