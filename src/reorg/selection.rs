//! Selection classification
//!
//! Decides whether a set of resources and elements can be moved, copied or
//! deleted as one operation, and which policy applies to it. Classification
//! is a pure function of the workspace state.

use crate::model::{Element, ElementKind, ResourcePath, Workspace};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SelectionPolicy {
	/// Files, folders and source units
	ResourcesAndUnits,
	Packages,
	SourceRoots,
	/// Structural children of one source unit
	Members,
	/// Anything deletable, nested entries removed
	Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
	elements: Vec<Element>,
	policy: SelectionPolicy,
	common_parent_kind: Option<ElementKind>,
}

impl Selection {
	pub fn elements(&self) -> &[Element] {
		&self.elements
	}

	pub fn policy(&self) -> SelectionPolicy {
		self.policy
	}

	/// Kind shared by the parents of every selected element
	pub fn common_parent_kind(&self) -> Option<ElementKind> {
		self.common_parent_kind
	}

	pub fn len(&self) -> usize {
		self.elements.len()
	}

	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	pub(crate) fn retain(&mut self, mut keep: impl FnMut(&Element) -> bool) {
		self.elements.retain(|e| keep(e));
	}
}

/// Merge resources and elements into one ordered, duplicate-free list
///
/// Resources are mapped to the most specific element backed by them.
/// `None` is returned if any entry is missing or does not exist.
fn gather(
	ws: &Workspace, resources: &[Option<ResourcePath>], elements: &[Option<Element>],
) -> Option<Vec<Element>> {
	let mut gathered: Vec<Element> = Vec::with_capacity(resources.len() + elements.len());
	for resource in resources {
		let element = ws.element_at(resource.as_ref()?)?;
		if !gathered.contains(&element) {
			gathered.push(element);
		}
	}
	for element in elements {
		let element = element.as_ref()?;
		if !ws.exists(element) {
			debug!("Selection entry {} no longer exists", element);
			return None;
		}
		if !gathered.contains(element) {
			gathered.push(element.clone());
		}
	}
	if gathered.is_empty() {
		return None;
	}
	Some(gathered)
}

fn common_parent_kind(ws: &Workspace, elements: &[Element]) -> Option<ElementKind> {
	let mut kinds = elements.iter().map(|e| ws.parent(e).map(|p| p.kind()));
	let first = kinds.next()??;
	kinds.all(|k| k == Some(first)).then_some(first)
}

fn has_nested_pair(ws: &Workspace, elements: &[Element]) -> bool {
	elements.iter().enumerate().any(|(i, a)| {
		elements.iter().enumerate().any(|(j, b)| i != j && ws.is_within(a, b))
	})
}

/// Classify a selection for Move or Copy
pub fn classify(
	ws: &Workspace, resources: &[Option<ResourcePath>], elements: &[Option<Element>],
) -> Option<Selection> {
	let elements = gather(ws, resources, elements)?;
	let kinds: Vec<ElementKind> = elements.iter().map(Element::kind).collect();

	if kinds.contains(&ElementKind::Project) {
		return None;
	}
	if has_nested_pair(ws, &elements) {
		debug!("Selection contains an element together with its container");
		return None;
	}

	let policy = if kinds
		.iter()
		.all(|k| matches!(k, ElementKind::File | ElementKind::Folder | ElementKind::SourceUnit))
	{
		SelectionPolicy::ResourcesAndUnits
	} else if kinds.iter().all(|k| *k == ElementKind::Package) {
		let has_default = elements
			.iter()
			.any(|e| matches!(e, Element::Package(package) if package.is_default()));
		if has_default {
			return None;
		}
		SelectionPolicy::Packages
	} else if kinds.iter().all(|k| *k == ElementKind::SourceRoot) {
		if elements.iter().any(|e| matches!(e, Element::SourceRoot(root) if root.is_project())) {
			return None;
		}
		SelectionPolicy::SourceRoots
	} else if kinds.iter().all(|k| k.is_structural() && *k != ElementKind::PackageDeclaration) {
		let unit = elements[0].source_unit()?;
		if elements.iter().any(|e| e.source_unit() != Some(unit)) {
			return None;
		}
		common_parent_kind(ws, &elements)?;
		SelectionPolicy::Members
	} else {
		return None;
	};

	let common_parent_kind = common_parent_kind(ws, &elements);
	Some(Selection { elements, policy, common_parent_kind })
}

/// Classify a selection for Delete; nested entries are dropped instead of rejected
pub fn classify_for_delete(
	ws: &Workspace, resources: &[Option<ResourcePath>], elements: &[Option<Element>],
) -> Option<Selection> {
	let gathered = gather(ws, resources, elements)?;
	let rejected = gathered.iter().any(|e| match e {
		Element::Project(_) => true,
		Element::SourceRoot(root) => root.is_project(),
		_ => false,
	});
	if rejected {
		return None;
	}

	let mut elements: Vec<Element> = Vec::with_capacity(gathered.len());
	for (i, element) in gathered.iter().enumerate() {
		let nested = gathered.iter().enumerate().any(|(j, other)| {
			i != j && ws.is_within(element, other) && !ws.is_within(other, element)
		});
		if !nested {
			elements.push(element.clone());
		}
	}

	let common_parent_kind = common_parent_kind(ws, &elements);
	Some(Selection { elements, policy: SelectionPolicy::Delete, common_parent_kind })
}
