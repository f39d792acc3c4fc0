//! Link and Links: the public view of one variable's relations

use super::link_nature::LinkNature;
use crate::shared::models::Variable;
use std::collections::BTreeMap;
use std::fmt;

/// `from nature to`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Link {
    pub from: Variable,
    pub nature: LinkNature,
    pub to: Variable,
}

impl Link {
    pub fn new(from: &Variable, nature: LinkNature, to: &Variable) -> Self {
        Self {
            from: from.clone(),
            nature,
            to: to.clone(),
        }
    }

    pub fn reverse(&self) -> Link {
        Link {
            from: self.to.clone(),
            nature: self.nature.reverse(),
            to: self.from.clone(),
        }
    }

    /// Apply `f` to both endpoints
    pub fn map(&self, f: &mut dyn FnMut(&Variable) -> Variable) -> Link {
        Link {
            from: f(&self.from),
            nature: self.nature.clone(),
            to: f(&self.to),
        }
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.from, self.nature, self.to)
    }
}

/// All links of one primary variable. Every `from` is the primary or one of
/// its fields/elements; the order is the order of insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Links {
    primary: Variable,
    links: Vec<Link>,
}

impl Links {
    pub fn new(primary: &Variable) -> Self {
        Self {
            primary: primary.clone(),
            links: Vec::new(),
        }
    }

    pub fn from_links(primary: &Variable, links: impl IntoIterator<Item = Link>) -> Self {
        let mut result = Self::new(primary);
        for link in links {
            result.push(link);
        }
        result
    }

    /// Builder: add a link from the primary itself
    pub fn with(mut self, nature: LinkNature, to: &Variable) -> Self {
        let primary = self.primary.clone();
        self.push(Link::new(&primary, nature, to));
        self
    }

    pub fn primary(&self) -> &Variable {
        &self.primary
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Link> {
        self.links.iter()
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Add a link unless an identical one is present
    pub fn push(&mut self, link: Link) {
        debug_assert!(
            link.from.is_part_of(&self.primary),
            "{} is not part of {}",
            link.from,
            self.primary
        );
        if !self.links.contains(&link) {
            self.links.push(link);
        }
    }

    /// Union, keeping the order of `self` first
    pub fn merge(&mut self, other: &Links) {
        for link in &other.links {
            if !self.links.contains(link) {
                self.links.push(link.clone());
            }
        }
    }

    pub fn retain(&mut self, f: impl FnMut(&Link) -> bool) {
        self.links.retain(f);
    }

    pub fn contains_target(&self, target: &Variable) -> bool {
        self.links.iter().any(|l| &l.to == target)
    }

    /// Targets reached from the primary itself with `nature`
    pub fn targets(&self, nature: &LinkNature) -> Vec<Variable> {
        self.links
            .iter()
            .filter(|l| l.from == self.primary && &l.nature == nature)
            .map(|l| l.to.clone())
            .collect()
    }

    /// Rebuild with every endpoint (and the primary) mapped through `f`
    pub fn map_variables(&self, f: &mut dyn FnMut(&Variable) -> Variable) -> Links {
        let primary = f(&self.primary);
        let links = self.links.iter().map(|l| l.map(f)).collect();
        Links { primary, links }
    }
}

impl<'a> IntoIterator for &'a Links {
    type Item = &'a Link;
    type IntoIter = std::slice::Iter<'a, Link>;

    fn into_iter(self) -> Self::IntoIter {
        self.links.iter()
    }
}

impl fmt::Display for Links {
    /// Links are rendered relative to the primary: `←0:t,§ts⊆0:in.§ts`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.links.is_empty() {
            return f.write_str("-");
        }
        for (i, link) in self.links.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(
                f,
                "{}{}{}",
                link.from.render_relative(&self.primary),
                link.nature,
                link.to
            )?;
        }
        Ok(())
    }
}

/// Links keyed by their primary
pub type LinkedVariables = BTreeMap<Variable, Links>;

/// Insert `links` under its primary, merging with what is there
pub fn merge_links(target: &mut LinkedVariables, links: &Links) {
    match target.get_mut(links.primary()) {
        Some(existing) => existing.merge(links),
        None => {
            target.insert(links.primary().clone(), links.clone());
        }
    }
}

/// Insert a single link under the primary of its `from`
pub fn add_link(target: &mut LinkedVariables, link: Link) {
    let primary = link.from.primary();
    target
        .entry(primary.clone())
        .or_insert_with(|| Links::new(&primary))
        .push(link);
}
