//! Import updates for units that change package
//!
//! Only import declarations are rewritten. Qualified names inside code
//! bodies are left alone, and simple names are never replaced. A unit is
//! considered to use a type when the type's simple name appears among its
//! identifiers.

use crate::error::Result;
use crate::model::{Element, PackageRef, UnitRef, Workspace};
use crate::source::{ImportDecl, SourceStructure};
use crate::status::{RefactoringStatus, Severity};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// A unit that ends up in another package, possibly with its primary type renamed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRelocation {
	pub unit: UnitRef,
	pub new_package: PackageRef,
	/// `(old, new)` simple name of the primary type
	pub renamed_type: Option<(String, String)>,
}

/// Import changes for one unit, by index into its import list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
	/// New written name, `.*` included for on-demand imports
	pub rewrites: BTreeMap<usize, String>,
	pub removals: BTreeSet<usize>,
	/// Qualified names of single-type imports to add
	pub additions: BTreeSet<String>,
}

impl ImportPlan {
	pub fn is_empty(&self) -> bool {
		self.rewrites.is_empty() && self.removals.is_empty() && self.additions.is_empty()
	}
}

#[derive(Debug, Clone)]
struct TypeMove {
	old_package: String,
	old_name: String,
	new_package: String,
	new_name: String,
	declaring_unit: UnitRef,
}

impl TypeMove {
	fn old_qualified(&self) -> String {
		qualify(&self.old_package, &self.old_name)
	}

	fn new_qualified(&self) -> String {
		qualify(&self.new_package, &self.new_name)
	}
}

fn qualify(package: &str, name: &str) -> String {
	if package.is_empty() {
		name.to_string()
	} else {
		format!("{package}.{name}")
	}
}

fn package_of(qualified: &str) -> &str {
	qualified.rfind('.').map(|dot| &qualified[..dot]).unwrap_or("")
}

fn has_single_import_of(structure: &SourceStructure, simple_name: &str) -> bool {
	structure.imports_simple_name(simple_name)
}

fn has_on_demand_import_of(structure: &SourceStructure, package: &str) -> bool {
	structure.imports.iter().any(|i| i.on_demand && !i.is_static && i.name == package)
}

/// Compute import plans for every unit affected by the relocations
///
/// `package_renames` lists whole packages that move to a new name; their
/// on-demand imports are rewritten instead of being expanded.
pub fn plan_import_updates(
	ws: &Workspace, relocations: &[UnitRelocation], package_renames: &[(String, String)],
) -> Result<(BTreeMap<UnitRef, ImportPlan>, RefactoringStatus)> {
	let mut status = RefactoringStatus::new();
	let mut plans = BTreeMap::new();

	let relocated: BTreeMap<&UnitRef, &PackageRef> =
		relocations.iter().map(|r| (&r.unit, &r.new_package)).collect();

	let mut moves: Vec<TypeMove> = Vec::new();
	for relocation in relocations {
		let (_, structure) = ws.parse_unit(&relocation.unit)?;
		for declaration in &structure.types {
			let new_name = match &relocation.renamed_type {
				Some((old, new)) if *old == declaration.name => new.clone(),
				_ => declaration.name.clone(),
			};
			let type_move = TypeMove {
				old_package: relocation.unit.package.name.clone(),
				old_name: declaration.name.clone(),
				new_package: relocation.new_package.name.clone(),
				new_name,
				declaring_unit: relocation.unit.clone(),
			};
			if type_move.old_qualified() != type_move.new_qualified() {
				moves.push(type_move);
			}
		}
	}

	let renames_anything = package_renames.iter().any(|(old, new)| old != new);
	if moves.is_empty() && !renames_anything {
		return Ok((plans, status));
	}

	let by_old_name: BTreeMap<String, &TypeMove> = moves.iter().map(|m| (m.old_qualified(), m)).collect();

	for root in ws.all_source_roots() {
		for package in ws.packages(&root) {
			for unit in ws.units(&package) {
				let structure = match ws.parse_unit(&unit) {
					Ok((_, structure)) => structure,
					Err(e) => {
						warn!("Skipping reference update in {}: {}", unit.file(), e);
						status.add_entry(
							Severity::Warning,
							format!("References in '{}' were not updated: {}", unit.name, e),
							Some(Element::SourceUnit(unit.clone())),
						);
						continue;
					}
				};
				let new_package = relocated.get(&unit).map(|p| p.name.clone()).unwrap_or_else(|| unit.package.name.clone());
				let mut planner = UnitPlanner {
					ws,
					unit: &unit,
					structure: &structure,
					new_package: &new_package,
					relocated: relocated.contains_key(&unit),
					legacy_compliance: ws.unit_compliance(&unit).allows_default_package_imports(),
					plan: ImportPlan::default(),
					status: &mut status,
				};
				planner.plan_declared_imports(&by_old_name, package_renames);
				planner.plan_implicit_uses(&moves, package_renames);
				if planner.relocated {
					planner.plan_left_behind(&relocated)?;
				}
				let plan = planner.plan;
				if !plan.is_empty() {
					debug!(
						"{}: {} rewrites, {} removals, {} additions",
						unit.file(),
						plan.rewrites.len(),
						plan.removals.len(),
						plan.additions.len()
					);
					plans.insert(unit.clone(), plan);
				}
			}
		}
	}

	Ok((plans, status))
}

struct UnitPlanner<'a> {
	ws: &'a Workspace,
	unit: &'a UnitRef,
	structure: &'a SourceStructure,
	/// Package the unit lives in after the operation
	new_package: &'a str,
	relocated: bool,
	legacy_compliance: bool,
	plan: ImportPlan,
	status: &'a mut RefactoringStatus,
}

impl UnitPlanner<'_> {
	fn element(&self) -> Element {
		Element::SourceUnit(self.unit.clone())
	}

	fn report(&mut self, message: String) {
		let element = self.element();
		self.status.add_error_for(message, &element);
	}

	fn plan_declared_imports(&mut self, by_old_name: &BTreeMap<String, &TypeMove>, package_renames: &[(String, String)]) {
		let structure = self.structure;
		for (index, import) in structure.imports.iter().enumerate() {
			if import.is_static {
				self.plan_static_import(index, import, by_old_name);
			} else if import.on_demand {
				if let Some((_, new)) = package_renames.iter().find(|(old, new)| *old == import.name && old != new) {
					if new == self.new_package {
						self.plan.removals.insert(index);
					} else {
						self.plan.rewrites.insert(index, format!("{new}.*"));
					}
				}
			} else if let Some(type_move) = by_old_name.get(&import.name) {
				if type_move.declaring_unit == *self.unit {
					continue;
				}
				self.plan_single_import(index, import, type_move);
			} else if self.relocated && package_of(&import.name) == self.new_package && !self.new_package.is_empty() {
				// The imported type now shares the unit's package
				self.plan.removals.insert(index);
			}
		}
	}

	fn plan_single_import(&mut self, index: usize, import: &ImportDecl, type_move: &TypeMove) {
		if type_move.old_package.is_empty() && self.legacy_compliance {
			self.report(format!(
				"Import '{}' in '{}' was not updated: potential match for '{}' in the default package",
				import.name,
				self.unit.name,
				type_move.old_name
			));
			return;
		}
		if type_move.new_package == self.new_package {
			self.plan.removals.insert(index);
		} else if type_move.new_package.is_empty() && !self.legacy_compliance {
			self.report(format!(
				"Import '{}' in '{}' cannot be updated: '{}' moves to the default package",
				import.name,
				self.unit.name,
				type_move.new_name
			));
		} else {
			self.plan.rewrites.insert(index, type_move.new_qualified());
		}
	}

	fn plan_static_import(&mut self, index: usize, import: &ImportDecl, by_old_name: &BTreeMap<String, &TypeMove>) {
		let matched = by_old_name.iter().find(|(old, _)| {
			import.name == **old || import.name.starts_with(&format!("{old}."))
		});
		let Some((old, type_move)) = matched else {
			return;
		};
		if type_move.new_package.is_empty() {
			self.report(format!(
				"Static import '{}' in '{}' cannot be updated: '{}' moves to the default package",
				import.name,
				self.unit.name,
				type_move.new_name
			));
			return;
		}
		let rest = &import.name[old.len()..];
		let mut rewritten = format!("{}{rest}", type_move.new_qualified());
		if import.on_demand {
			rewritten.push_str(".*");
		}
		self.plan.rewrites.insert(index, rewritten);
	}

	/// Units that saw a moved type through their package or an on-demand import
	fn plan_implicit_uses(&mut self, moves: &[TypeMove], package_renames: &[(String, String)]) {
		for type_move in moves {
			if type_move.declaring_unit == *self.unit
				|| !self.structure.references_name(&type_move.old_name)
				|| has_single_import_of(self.structure, &type_move.old_name)
			{
				continue;
			}
			let same_old_package = self.unit.package.name == type_move.old_package;
			let package_follows = package_renames
				.iter()
				.any(|(old, new)| *old == type_move.old_package && *new == type_move.new_package);
			let via_on_demand = has_on_demand_import_of(self.structure, &type_move.old_package) && !package_follows;
			if !(same_old_package || via_on_demand) || type_move.new_package == self.new_package {
				continue;
			}
			if same_old_package && self.relocated && package_follows {
				continue;
			}

			if type_move.new_package.is_empty() && !self.legacy_compliance {
				self.report(format!(
					"'{}' uses '{}', which cannot be imported from the default package",
					self.unit.name,
					type_move.new_name
				));
			} else {
				self.plan.additions.insert(type_move.new_qualified());
			}
		}
	}

	/// A relocated unit keeps access to the types it leaves behind
	fn plan_left_behind(&mut self, relocated: &BTreeMap<&UnitRef, &PackageRef>) -> Result<()> {
		let unit = self.unit;
		let old_package = &unit.package;
		if old_package.name == self.new_package {
			return Ok(());
		}
		let project = old_package.root.project_name().unwrap_or_default().to_string();
		let mut siblings = Vec::new();
		for root in self.ws.source_roots(&project) {
			let package = PackageRef::new(root, &old_package.name);
			siblings.extend(self.ws.units(&package).into_iter().filter(|u| !relocated.contains_key(u)));
		}

		for sibling in siblings {
			let Ok((_, structure)) = self.ws.parse_unit(&sibling) else {
				continue;
			};
			for declaration in &structure.types {
				let name = &declaration.name;
				if !self.structure.references_name(name) || has_single_import_of(self.structure, name) {
					continue;
				}
				if old_package.is_default() && !self.legacy_compliance {
					self.report(format!(
						"'{}' uses '{}' from the default package, which cannot be imported",
						self.unit.name, name
					));
					continue;
				}
				self.plan.additions.insert(old_package.qualify(name));
			}
		}
		Ok(())
	}
}
