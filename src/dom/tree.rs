// src/dom/tree.rs

//! Read-only document tree facade.
//!
//! Wraps `scraper`'s parsed tree with the handful of lookups the
//! extractors need. Every lookup soft-fails: absent elements come back
//! as `None` or an empty `Vec`, never as an error. Extractors rely on
//! that to distinguish "field absent" from "page shape changed".

use indexmap::IndexMap;
use scraper::{ElementRef, Html};

/// An immutable parsed document.
pub struct Dom {
    html: Html,
}

impl Dom {
    /// Parse normalized markup into a document tree.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    /// Root element of the document (the `<html>` node).
    pub fn root(&self) -> Node<'_> {
        Node {
            elem: self.html.root_element(),
        }
    }

    /// First element with the given `id` attribute.
    pub fn get_element_by_id(&self, id: &str) -> Option<Node<'_>> {
        self.root().find(|n| n.attr("id") == Some(id))
    }

    /// All elements carrying the given class, in document order.
    pub fn get_elements_by_class_name(&self, class: &str) -> Vec<Node<'_>> {
        self.root().find_all(|n| n.has_class(class))
    }

    /// All elements with the given tag name, in document order.
    pub fn get_elements_by_tag_name(&self, tag: &str) -> Vec<Node<'_>> {
        self.root().find_all(|n| n.tag().eq_ignore_ascii_case(tag))
    }

    /// All elements with the given `name` attribute, in document order.
    pub fn get_elements_by_name(&self, name: &str) -> Vec<Node<'_>> {
        self.root().find_all(|n| n.attr("name") == Some(name))
    }
}

/// A borrowed element node in a [`Dom`].
#[derive(Clone, Copy)]
pub struct Node<'a> {
    elem: ElementRef<'a>,
}

impl<'a> Node<'a> {
    /// Lowercased tag name.
    pub fn tag(&self) -> &'a str {
        self.elem.value().name()
    }

    /// Attribute value, if present.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.elem.value().attr(name)
    }

    /// All attributes in document order.
    pub fn attributes(&self) -> IndexMap<String, String> {
        self.elem
            .value()
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Whether the class list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.elem.value().classes().any(|c| c == class)
    }

    /// Ordered element children (text nodes are skipped).
    pub fn children(&self) -> Vec<Node<'a>> {
        self.elem
            .children()
            .filter_map(ElementRef::wrap)
            .map(|elem| Node { elem })
            .collect()
    }

    /// Bounds-checked indexed child access.
    pub fn child(&self, index: usize) -> Option<Node<'a>> {
        self.elem
            .children()
            .filter_map(ElementRef::wrap)
            .nth(index)
            .map(|elem| Node { elem })
    }

    /// First element child.
    pub fn first_child(&self) -> Option<Node<'a>> {
        self.child(0)
    }

    /// Last element child.
    pub fn last_child(&self) -> Option<Node<'a>> {
        self.elem
            .children()
            .filter_map(ElementRef::wrap)
            .last()
            .map(|elem| Node { elem })
    }

    /// Concatenated text of this node and all descendants, untrimmed.
    pub fn text(&self) -> String {
        self.elem.text().collect()
    }

    /// First descendant (excluding self) matching the predicate.
    fn find(&self, pred: impl Fn(&Node<'a>) -> bool) -> Option<Node<'a>> {
        self.descendants().find(|n| pred(n))
    }

    /// All descendants (excluding self) matching the predicate.
    fn find_all(&self, pred: impl Fn(&Node<'a>) -> bool) -> Vec<Node<'a>> {
        self.descendants().filter(|n| pred(n)).collect()
    }

    /// Scoped lookup: descendants carrying the given class.
    pub fn get_elements_by_class_name(&self, class: &str) -> Vec<Node<'a>> {
        self.find_all(|n| n.has_class(class))
    }

    /// Scoped lookup: descendants with the given tag name.
    pub fn get_elements_by_tag_name(&self, tag: &str) -> Vec<Node<'a>> {
        self.find_all(|n| n.tag().eq_ignore_ascii_case(tag))
    }

    fn descendants(&self) -> impl Iterator<Item = Node<'a>> + use<'a> {
        let this = self.elem.id();
        self.elem
            .descendants()
            .filter(move |n| n.id() != this)
            .filter_map(ElementRef::wrap)
            .map(|elem| Node { elem })
    }
}
