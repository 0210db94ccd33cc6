//! The record dataset model.
//!
//! A [`Record`] is an ordered list of [`Element`]s. An element holds text, an
//! integer, a decimal, or a sequence of nested records. Every lookup is
//! depth-first in document order: an element is visited before the items of
//! its sequence, and earlier elements before later ones.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::tag::Tag;

/// Value representation of an element.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vr {
    CS,
    DA,
    DS,
    IS,
    LO,
    PN,
    SH,
    SQ,
    ST,
    TM,
    UI,
    UN,
}

/// Element payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Sequence(Vec<Record>),
    Int(i64),
    Decimal(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: Tag,
    pub vr: Vr,
    pub value: Value,
}

impl Element {
    #[must_use]
    pub fn text(tag: Tag, vr: Vr, value: impl Into<String>) -> Self {
        Self {
            tag,
            vr,
            value: Value::Text(value.into()),
        }
    }

    /// An integer string (`IS`) element.
    #[must_use]
    pub const fn int(tag: Tag, value: i64) -> Self {
        Self {
            tag,
            vr: Vr::IS,
            value: Value::Int(value),
        }
    }

    /// A decimal string (`DS`) element.
    #[must_use]
    pub const fn decimal(tag: Tag, value: f64) -> Self {
        Self {
            tag,
            vr: Vr::DS,
            value: Value::Decimal(value),
        }
    }

    #[must_use]
    pub const fn sequence(tag: Tag, items: Vec<Record>) -> Self {
        Self {
            tag,
            vr: Vr::SQ,
            value: Value::Sequence(items),
        }
    }

    /// The value rendered as text. Sequences have no text form.
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match &self.value {
            Value::Text(text) => Some(Cow::Borrowed(text.trim_end_matches(['\0', ' ']))),
            Value::Int(value) => Some(Cow::Owned(value.to_string())),
            Value::Decimal(value) => Some(Cow::Owned(value.to_string())),
            Value::Sequence(_) => None,
        }
    }

    /// The value as an integer; integer strings are parsed.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match &self.value {
            Value::Int(value) => Some(*value),
            Value::Text(text) => text.trim().parse().ok(),
            Value::Decimal(_) | Value::Sequence(_) => None,
        }
    }

    /// The value as a float; numeric strings are parsed.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match &self.value {
            #[allow(clippy::cast_precision_loss)]
            Value::Int(value) => Some(*value as f64),
            Value::Decimal(value) => Some(*value),
            Value::Text(text) => text.trim().parse().ok(),
            Value::Sequence(_) => None,
        }
    }

    /// Overwrite the value with text, keeping tag and VR.
    pub fn set_text(&mut self, value: impl Into<String>) {
        self.value = Value::Text(value.into());
    }
}

/// An opaque structured data object addressable by tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub elements: Vec<Element>,
}

impl Record {
    #[must_use]
    pub const fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    /// First element with `tag`, searching nested sequences.
    #[must_use]
    pub fn find_first(&self, tag: Tag) -> Option<&Element> {
        self.elements.iter().find_map(|element| {
            if element.tag == tag {
                return Some(element);
            }
            match &element.value {
                Value::Sequence(items) => items.iter().find_map(|item| item.find_first(tag)),
                _ => None,
            }
        })
    }

    pub fn find_first_mut(&mut self, tag: Tag) -> Option<&mut Element> {
        first_mut(&mut self.elements, tag)
    }

    /// Every element with `tag`, in document order.
    #[must_use]
    pub fn find_all(&self, tag: Tag) -> Vec<&Element> {
        let mut found = Vec::new();
        collect(&self.elements, tag, &mut found);
        found
    }

    pub fn find_all_mut(&mut self, tag: Tag) -> Vec<&mut Element> {
        let mut found = Vec::new();
        collect_mut(&mut self.elements, tag, &mut found);
        found
    }

    /// Text value of the first element with `tag`.
    #[must_use]
    pub fn text(&self, tag: Tag) -> Option<Cow<'_, str>> {
        self.find_first(tag).and_then(Element::as_text)
    }

    /// Replace the first element carrying the same tag. Returns `false`, and
    /// leaves the record unchanged, when no such element exists.
    pub fn replace(&mut self, element: Element) -> bool {
        match self.find_first_mut(element.tag) {
            Some(slot) => {
                *slot = element;
                true
            }
            None => false,
        }
    }

    /// Remove every element with `tag` at any depth. Returns how many were removed.
    pub fn remove(&mut self, tag: Tag) -> usize {
        remove_all(&mut self.elements, tag)
    }

    /// Insert a top-level element, keeping top-level tags in ascending order.
    pub fn add(&mut self, element: Element) {
        let position = self
            .elements
            .iter()
            .position(|existing| existing.tag > element.tag)
            .unwrap_or(self.elements.len());
        self.elements.insert(position, element);
    }
}

fn first_mut(elements: &mut [Element], tag: Tag) -> Option<&mut Element> {
    elements.iter_mut().find_map(|element| {
        if element.tag == tag {
            return Some(element);
        }
        match &mut element.value {
            Value::Sequence(items) => items
                .iter_mut()
                .find_map(|item| first_mut(&mut item.elements, tag)),
            _ => None,
        }
    })
}

fn collect<'a>(elements: &'a [Element], tag: Tag, found: &mut Vec<&'a Element>) {
    for element in elements {
        if element.tag == tag {
            found.push(element);
        } else if let Value::Sequence(items) = &element.value {
            for item in items {
                collect(&item.elements, tag, found);
            }
        }
    }
}

fn collect_mut<'a>(elements: &'a mut [Element], tag: Tag, found: &mut Vec<&'a mut Element>) {
    for element in elements {
        if element.tag == tag {
            found.push(element);
        } else if let Value::Sequence(items) = &mut element.value {
            for item in items {
                collect_mut(&mut item.elements, tag, found);
            }
        }
    }
}

fn remove_all(elements: &mut Vec<Element>, tag: Tag) -> usize {
    let before = elements.len();
    elements.retain(|element| element.tag != tag);
    let mut removed = before - elements.len();
    for element in elements.iter_mut() {
        if let Value::Sequence(items) = &mut element.value {
            for item in items {
                removed += remove_all(&mut item.elements, tag);
            }
        }
    }
    removed
}
