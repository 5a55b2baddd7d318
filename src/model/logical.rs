//! Logical view over the resource tree
//!
//! Source roots, packages and source units are derived from folders and
//! files; structural elements are derived by parsing unit text on demand.

use super::element::{Element, ImportRef, MemberKind, MemberRef, MemberSegment, PackageRef, UnitRef};
use super::path::ResourcePath;
use super::workspace::{NodeKind, Workspace};
use crate::config::ComplianceLevel;
use crate::error::{ReorgError, Result};
use crate::source::{parse, Declaration, SourceStructure};

/// Java-style identifier check used for package segments
pub fn is_valid_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(c) if c == '_' || c == '$' || c.is_alphabetic() => {}
		_ => return false,
	}
	chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}

impl Workspace {
	/// Source root folders of a project, in descriptor order
	pub fn source_roots(&self, project: &str) -> Vec<ResourcePath> {
		let base = ResourcePath::project(project);
		self.project(project)
			.map(|p| p.source_roots.iter().map(|r| base.join_relative(r)).collect())
			.unwrap_or_default()
	}

	pub fn all_source_roots(&self) -> Vec<ResourcePath> {
		self.projects().flat_map(|p| self.source_roots(&p.name)).collect()
	}

	pub fn is_source_root(&self, path: &ResourcePath) -> bool {
		let Some(project) = path.project_name() else {
			return false;
		};
		self.contains(path) && self.source_roots(project).contains(path)
	}

	/// Innermost source root containing `path`
	pub fn source_root_of(&self, path: &ResourcePath) -> Option<ResourcePath> {
		let project = path.project_name()?;
		self.source_roots(project)
			.into_iter()
			.filter(|root| path.starts_with(root) && self.contains(root))
			.max_by_key(ResourcePath::len)
	}

	/// The package a folder stands for, if any
	pub fn package_for_folder(&self, folder: &ResourcePath) -> Option<PackageRef> {
		if !self.is_container(folder) {
			return None;
		}
		let root = self.source_root_of(folder)?;
		let segments = folder.strip_prefix(&root)?;
		if !segments.iter().all(|s| is_valid_identifier(s)) {
			return None;
		}
		Some(PackageRef::new(root, &segments.join(".")))
	}

	pub fn package_exists(&self, package: &PackageRef) -> bool {
		self.is_source_root(&package.root)
			&& package.segments().all(is_valid_identifier)
			&& (package.is_default() || self.is_folder(&package.folder()))
			&& self.source_root_of(&package.folder()).as_ref() == Some(&package.root)
	}

	/// All packages of a root, default package first, in path order
	pub fn packages(&self, root: &ResourcePath) -> Vec<PackageRef> {
		if !self.is_source_root(root) {
			return Vec::new();
		}
		let mut packages = vec![PackageRef::default_package(root.clone())];
		for (path, node) in self.subtree(root).into_iter().skip(1) {
			if node.kind != NodeKind::Folder {
				continue;
			}
			if let Some(package) = self.package_for_folder(&path) {
				if &package.root == root {
					packages.push(package);
				}
			}
		}
		packages
	}

	/// Packages nested below `package` at any depth
	pub fn sub_packages(&self, package: &PackageRef) -> Vec<PackageRef> {
		if package.is_default() {
			return self.packages(&package.root).into_iter().filter(|p| !p.is_default()).collect();
		}
		self.packages(&package.root)
			.into_iter()
			.filter(|p| p.is_sub_package_of(package))
			.collect()
	}

	pub fn is_source_file(&self, path: &ResourcePath) -> bool {
		self.is_file(path) && path.extension() == Some(self.config.source_extension.as_str())
	}

	pub fn unit_for_file(&self, path: &ResourcePath) -> Option<UnitRef> {
		if !self.is_source_file(path) {
			return None;
		}
		let package = self.package_for_folder(&path.parent()?)?;
		Some(UnitRef::new(package, path.name()?))
	}

	pub fn units(&self, package: &PackageRef) -> Vec<UnitRef> {
		if !self.package_exists(package) {
			return Vec::new();
		}
		self.child_paths(&package.folder())
			.into_iter()
			.filter(|p| self.is_source_file(p))
			.filter_map(|p| p.name().map(|name| UnitRef::new(package.clone(), name)))
			.collect()
	}

	/// Direct children of a package folder that are neither units nor packages
	pub fn non_package_children(&self, package: &PackageRef) -> Vec<ResourcePath> {
		self.child_paths(&package.folder())
			.into_iter()
			.filter(|p| {
				if self.is_file(p) {
					!self.is_source_file(p)
				} else {
					self.package_for_folder(p).map_or(true, |sub| sub.root != package.root)
						&& !self.is_source_root(p)
				}
			})
			.collect()
	}

	/// Package with no units and no other files; sub-packages do not count
	pub fn is_package_empty(&self, package: &PackageRef) -> bool {
		self.units(package).is_empty() && self.non_package_children(package).is_empty()
	}

	pub fn parse_unit(&self, unit: &UnitRef) -> Result<(String, SourceStructure)> {
		let text = self.content(&unit.file())?.to_string();
		let structure = parse(&text)?;
		Ok((text, structure))
	}

	/// Locate a member declaration, returning the unit text alongside it
	pub fn member_declaration(&self, member: &MemberRef) -> Result<(String, Declaration)> {
		let (text, structure) = self.parse_unit(&member.unit)?;
		let declaration = structure
			.find(&member.path)
			.cloned()
			.ok_or_else(|| ReorgError::element_not_found(Element::member(member.clone())))?;
		Ok((text, declaration))
	}

	pub fn unit_compliance(&self, unit: &UnitRef) -> ComplianceLevel {
		self.compliance(unit.package.root.project_name().unwrap_or_default())
	}

	pub fn project_of(&self, element: &Element) -> Option<String> {
		if let Element::Project(name) = element {
			return Some(name.clone());
		}
		let path = self.resource_of(element).or_else(|| element.source_unit().map(UnitRef::file))?;
		path.project_name().map(str::to_string)
	}

	// --- element facade ---

	pub fn exists(&self, element: &Element) -> bool {
		match element {
			Element::Project(name) => {
				self.node(&ResourcePath::project(name)).is_some_and(|n| n.kind == NodeKind::Project)
			}
			Element::Folder(path) => self.is_folder(path),
			Element::File(path) => self.is_file(path),
			Element::SourceRoot(path) => self.is_source_root(path),
			Element::Package(package) => self.package_exists(package),
			Element::SourceUnit(unit) => self.unit_exists(unit),
			Element::Type(member)
			| Element::Method(member)
			| Element::Field(member)
			| Element::Initializer(member) => self.unit_exists(&member.unit)
				&& self.parse_unit(&member.unit).is_ok_and(|(_, s)| s.find(&member.path).is_some()),
			Element::ImportContainer(unit) => self.unit_exists(unit)
				&& self.parse_unit(unit).is_ok_and(|(_, s)| !s.imports.is_empty()),
			Element::ImportDeclaration(import) => self.unit_exists(&import.unit)
				&& self.parse_unit(&import.unit).is_ok_and(|(_, s)| {
					s.imports.iter().any(|i| i.written_name() == import.name && i.is_static == import.is_static)
				}),
			Element::PackageDeclaration(unit) => self.unit_exists(unit)
				&& self.parse_unit(unit).is_ok_and(|(_, s)| s.package.is_some()),
		}
	}

	fn unit_exists(&self, unit: &UnitRef) -> bool {
		self.package_exists(&unit.package) && self.is_source_file(&unit.file())
	}

	/// Backing resource; `None` for structural elements
	pub fn resource_of(&self, element: &Element) -> Option<ResourcePath> {
		match element {
			Element::Project(name) => Some(ResourcePath::project(name)),
			Element::Folder(path) | Element::File(path) | Element::SourceRoot(path) => Some(path.clone()),
			Element::Package(package) => Some(package.folder()),
			Element::SourceUnit(unit) => Some(unit.file()),
			_ => None,
		}
	}

	/// Logical parent for logical elements, resource parent for resources
	pub fn parent(&self, element: &Element) -> Option<Element> {
		match element {
			Element::Project(_) => None,
			Element::Folder(path) | Element::File(path) => {
				let parent = path.parent()?;
				if parent.is_root() {
					None
				} else if parent.is_project() {
					Some(Element::Project(parent.project_name()?.to_string()))
				} else {
					Some(Element::Folder(parent))
				}
			}
			Element::SourceRoot(path) => Some(Element::Project(path.project_name()?.to_string())),
			Element::Package(package) => Some(Element::SourceRoot(package.root.clone())),
			Element::SourceUnit(unit) => Some(Element::Package(unit.package.clone())),
			Element::Type(member)
			| Element::Method(member)
			| Element::Field(member)
			| Element::Initializer(member) => match member.declaring_type() {
				Some(declaring) => Some(Element::Type(declaring)),
				None => Some(Element::SourceUnit(member.unit.clone())),
			},
			Element::ImportContainer(unit) | Element::PackageDeclaration(unit) => {
				Some(Element::SourceUnit(unit.clone()))
			}
			Element::ImportDeclaration(import) => Some(Element::ImportContainer(import.unit.clone())),
		}
	}

	pub fn children(&self, element: &Element) -> Vec<Element> {
		match element {
			Element::Project(name) => self.resource_children(&ResourcePath::project(name)),
			Element::Folder(path) => self.resource_children(path),
			Element::File(_) => Vec::new(),
			Element::SourceRoot(root) => self.packages(root).into_iter().map(Element::Package).collect(),
			Element::Package(package) => {
				self.units(package).into_iter().map(Element::SourceUnit).collect()
			}
			Element::SourceUnit(unit) => {
				let Ok((_, structure)) = self.parse_unit(unit) else {
					return Vec::new();
				};
				let mut children = Vec::new();
				if structure.package.is_some() {
					children.push(Element::PackageDeclaration(unit.clone()));
				}
				if !structure.imports.is_empty() {
					children.push(Element::ImportContainer(unit.clone()));
				}
				for (occurrence, declaration) in structure.types_with_occurrence() {
					children.push(Element::Type(MemberRef {
						unit: unit.clone(),
						path: vec![MemberSegment {
							kind: MemberKind::Type,
							name: declaration.name.clone(),
							occurrence,
						}],
					}));
				}
				children
			}
			Element::Type(member) => {
				let Ok((_, declaration)) = self.member_declaration(member) else {
					return Vec::new();
				};
				declaration
					.children_with_occurrence()
					.into_iter()
					.map(|(occurrence, child)| {
						Element::member(member.child(child.kind, &child.name, occurrence))
					})
					.collect()
			}
			Element::ImportContainer(unit) => match self.parse_unit(unit) {
				Ok((_, structure)) => structure
					.imports
					.iter()
					.map(|i| {
						Element::ImportDeclaration(ImportRef {
							unit: unit.clone(),
							name: i.written_name(),
							is_static: i.is_static,
						})
					})
					.collect(),
				Err(_) => Vec::new(),
			},
			_ => Vec::new(),
		}
	}

	fn resource_children(&self, path: &ResourcePath) -> Vec<Element> {
		self.child_paths(path)
			.into_iter()
			.map(|p| if self.is_file(&p) { Element::File(p) } else { Element::Folder(p) })
			.collect()
	}

	/// True if `element` is `container` or lies inside it, logically or on disk
	pub fn is_within(&self, element: &Element, container: &Element) -> bool {
		if element == container {
			return true;
		}
		match (element, container) {
			(Element::Package(package), Element::Package(other)) if other.is_default() => {
				package.root == other.root && package.is_default()
			}
			(_, Element::Package(package)) if package.is_default() => {
				let direct_child = self
					.resource_of(element)
					.or_else(|| element.source_unit().map(UnitRef::file))
					.and_then(|p| p.parent())
					.is_some_and(|parent| parent == package.root);
				direct_child
			}
			(Element::ImportDeclaration(import), Element::ImportContainer(unit)) => &import.unit == unit,
			_ => {
				if let (Some(member), Some(other)) = (element.as_member(), container.as_member()) {
					return member.is_within(other);
				}
				if container.kind().is_structural() {
					return false;
				}
				let path = self
					.resource_of(element)
					.or_else(|| element.source_unit().map(UnitRef::file));
				match (path, self.resource_of(container)) {
					(Some(path), Some(container)) => path.starts_with(&container),
					_ => false,
				}
			}
		}
	}

	/// Most specific element backed by `path`
	pub fn element_at(&self, path: &ResourcePath) -> Option<Element> {
		let node = self.node(path)?;
		match node.kind {
			NodeKind::Project => Some(Element::Project(path.project_name()?.to_string())),
			NodeKind::Folder if self.is_source_root(path) => Some(Element::SourceRoot(path.clone())),
			NodeKind::Folder => Some(
				self.package_for_folder(path)
					.filter(|p| !p.is_default())
					.map(Element::Package)
					.unwrap_or_else(|| Element::Folder(path.clone())),
			),
			NodeKind::File => Some(
				self.unit_for_file(path)
					.map(Element::SourceUnit)
					.unwrap_or_else(|| Element::File(path.clone())),
			),
		}
	}

	/// Resolve `/P/src/p/A.java#A.run`, `...#imports`, `...#import:java.util.List` or `...#package`
	pub fn resolve(&self, spec: &str) -> Result<Element> {
		let (resource, fragment) = match spec.split_once('#') {
			Some((resource, fragment)) => (resource, Some(fragment)),
			None => (spec, None),
		};
		let path = ResourcePath::parse(resource)?;
		let element = self.element_at(&path).ok_or_else(|| ReorgError::resource_not_found(&path))?;
		let Some(fragment) = fragment else {
			return Ok(element);
		};

		let Element::SourceUnit(unit) = element else {
			return Err(ReorgError::element_not_found(spec));
		};
		let resolved = if fragment == "imports" {
			Element::ImportContainer(unit)
		} else if fragment == "package" {
			Element::PackageDeclaration(unit)
		} else if let Some(name) = fragment.strip_prefix("import:") {
			let (_, structure) = self.parse_unit(&unit)?;
			let import = structure
				.imports
				.iter()
				.find(|i| i.written_name() == name)
				.ok_or_else(|| ReorgError::element_not_found(spec))?;
			Element::ImportDeclaration(ImportRef {
				unit,
				name: import.written_name(),
				is_static: import.is_static,
			})
		} else {
			let (_, structure) = self.parse_unit(&unit)?;
			let member = resolve_member(&structure, unit, fragment).ok_or_else(|| ReorgError::element_not_found(spec))?;
			Element::member(member)
		};

		if self.exists(&resolved) {
			Ok(resolved)
		} else {
			Err(ReorgError::element_not_found(spec))
		}
	}

	/// Whether the element or, for containers, anything below it is read-only
	pub fn is_read_only(&self, element: &Element) -> bool {
		let path = match self.resource_of(element) {
			Some(path) => path,
			None => match element.source_unit() {
				Some(unit) => unit.file(),
				None => return false,
			},
		};
		match element {
			Element::Package(package) => {
				self.units(package).iter().any(|u| self.node(&u.file()).is_some_and(|n| n.read_only))
					|| self.node(&path).is_some_and(|n| n.read_only)
			}
			_ => self.subtree(&path).iter().any(|(_, n)| n.read_only),
		}
	}
}

/// Dotted member path; `{...}` names an initializer, `name@n` picks the n-th overload
fn resolve_member(structure: &SourceStructure, unit: UnitRef, dotted: &str) -> Option<MemberRef> {
	let mut level: Vec<(usize, &Declaration)> = structure.types_with_occurrence();
	let mut path = Vec::new();
	for part in dotted.split('.') {
		let (name, wanted) = match part.rsplit_once('@') {
			Some((name, n)) => (name, n.parse().ok()?),
			None => (part, 0),
		};
		let name = if name == "{...}" { "" } else { name };
		let (occurrence, declaration) = level
			.into_iter()
			.filter(|(_, d)| d.name == name)
			.find(|(occurrence, _)| *occurrence == wanted)?;
		path.push(MemberSegment { kind: declaration.kind, name: declaration.name.clone(), occurrence });
		level = declaration.children_with_occurrence();
	}
	if path.is_empty() {
		return None;
	}
	Some(MemberRef { unit, path })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::ElementKind;

	fn workspace() -> (Workspace, PackageRef) {
		let mut ws = Workspace::default();
		ws.create_project("P").unwrap();
		let root = ws.add_source_root("P", "src").unwrap();
		let package = ws.create_package(&root, "p.q").unwrap();
		ws.create_unit(
			&package,
			"A.java",
			"package p.q;\n\nimport java.util.List;\n\nclass A {\n\tint x;\n\tvoid run() {}\n\tvoid run(int a) {}\n}\n",
		)
		.unwrap();
		ws.create_file(&package.folder().join("notes.txt"), "n").unwrap();
		ws.create_folder(&root.join("META-INF")).unwrap();
		(ws, package)
	}

	#[test]
	fn test_packages_of_root() {
		let (ws, package) = workspace();
		let names: Vec<_> = ws.packages(&package.root).iter().map(|p| p.name.clone()).collect();
		assert_eq!(names, vec!["", "p", "p.q"]);
		assert_eq!(ws.sub_packages(&PackageRef::new(package.root.clone(), "p")), vec![package.clone()]);
		assert_eq!(ws.units(&package).len(), 1);
		assert_eq!(ws.non_package_children(&package).len(), 1);
		assert!(ws.is_package_empty(&PackageRef::new(package.root.clone(), "p")));
	}

	#[test]
	fn test_element_at_and_resolve() {
		let (ws, package) = workspace();
		let root = package.root.clone();
		assert_eq!(ws.element_at(&root).unwrap().kind(), ElementKind::SourceRoot);
		assert_eq!(ws.element_at(&root.join("META-INF")).unwrap().kind(), ElementKind::Folder);
		assert_eq!(ws.element_at(&package.folder()).unwrap(), Element::Package(package.clone()));

		let second_run = ws.resolve("/P/src/p/q/A.java#A.run@1").unwrap();
		assert_eq!(second_run.kind(), ElementKind::Method);
		assert_eq!(second_run.as_member().unwrap().path[1].occurrence, 1);
		assert!(ws.resolve("/P/src/p/q/A.java#A.missing").is_err());

		let import = ws.resolve("/P/src/p/q/A.java#import:java.util.List").unwrap();
		assert_eq!(ws.parent(&import).unwrap().kind(), ElementKind::ImportContainer);
	}

	#[test]
	fn test_children_of_unit() {
		let (ws, package) = workspace();
		let unit = Element::SourceUnit(UnitRef::new(package, "A.java"));
		let kinds: Vec<_> = ws.children(&unit).iter().map(Element::kind).collect();
		assert_eq!(
			kinds,
			vec![ElementKind::PackageDeclaration, ElementKind::ImportContainer, ElementKind::Type]
		);
	}

	#[test]
	fn test_containment() {
		let (ws, package) = workspace();
		let parent = Element::Package(PackageRef::new(package.root.clone(), "p"));
		let unit = UnitRef::new(package.clone(), "A.java");
		let field = ws.resolve("/P/src/p/q/A.java#A.x").unwrap();

		assert!(ws.is_within(&Element::Package(package.clone()), &parent));
		assert!(ws.is_within(&field, &Element::SourceUnit(unit)));
		assert!(ws.is_within(&field, &Element::SourceRoot(package.root.clone())));
		assert!(!ws.is_within(&parent, &Element::Package(package.clone())));
		assert!(!ws.is_within(&parent, &Element::Package(PackageRef::default_package(package.root))));
	}

	#[test]
	fn test_identifiers() {
		assert!(is_valid_identifier("otherPackage"));
		assert!(!is_valid_identifier("META-INF"));
		assert!(!is_valid_identifier("1abc"));
	}
}
