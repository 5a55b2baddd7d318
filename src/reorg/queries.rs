//! Pluggable answers to naming conflicts and confirmations
//!
//! The engine never decides on its own what to call a copy or whether to
//! touch a read-only resource; it asks through these traits. Implementations
//! here cover the non-interactive cases: fixed answers, accepting the
//! suggestion, cancelling, confirming everything.

use crate::model::{Element, ElementKind};
use std::collections::HashMap;
use std::sync::Mutex;

/// One question about one conflicting element
pub trait NameQuery {
	/// New name, or `None` to cancel the whole operation
	fn get_new_name(&self) -> Option<String>;
}

pub trait NameQueries: Send + Sync {
	fn create_name_query(&self, element: &Element, suggestion: &str) -> Box<dyn NameQuery + '_>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
	Yes,
	/// Skip the element the question was about
	No,
	Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfirmationKind {
	ReadOnly,
	Overwrite,
}

pub trait ConfirmQuery {
	fn confirm(&self, question: &str) -> Confirmation;
}

pub trait ReorgQueries: Send + Sync {
	fn create_confirm_query(&self, kind: ConfirmationKind) -> Box<dyn ConfirmQuery + '_>;
}

/// The two query services handed to a processor
#[derive(Clone, Copy)]
pub struct Queries<'a> {
	pub names: &'a dyn NameQueries,
	pub confirmations: &'a dyn ReorgQueries,
}

impl<'a> Queries<'a> {
	pub fn new(names: &'a dyn NameQueries, confirmations: &'a dyn ReorgQueries) -> Self {
		Self { names, confirmations }
	}
}

struct Answer(Option<String>);

impl NameQuery for Answer {
	fn get_new_name(&self) -> Option<String> {
		self.0.clone()
	}
}

/// Always takes the suggested name
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptSuggestedNames;

impl NameQueries for AcceptSuggestedNames {
	fn create_name_query(&self, _element: &Element, suggestion: &str) -> Box<dyn NameQuery + '_> {
		Box::new(Answer(Some(suggestion.to_string())))
	}
}

/// Cancels at the first conflict
#[derive(Debug, Default, Clone, Copy)]
pub struct CancelNameQueries;

impl NameQueries for CancelNameQueries {
	fn create_name_query(&self, _element: &Element, _suggestion: &str) -> Box<dyn NameQuery + '_> {
		Box::new(Answer(None))
	}
}

/// Answers keyed by the conflicting element's current name
///
/// Unknown names fall back to the suggestion, or cancel when
/// `cancel_unknown` is set. Every question asked is logged.
#[derive(Debug, Default)]
pub struct FixedNameQueries {
	answers: HashMap<String, String>,
	cancel_unknown: bool,
	asked: Mutex<Vec<String>>,
}

impl FixedNameQueries {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_name(mut self, old: &str, new: &str) -> Self {
		self.answers.insert(old.to_string(), new.to_string());
		self
	}

	pub fn cancel_unknown(mut self) -> Self {
		self.cancel_unknown = true;
		self
	}

	/// Names of the elements queried so far, in order
	pub fn asked(&self) -> Vec<String> {
		self.asked.lock().map(|a| a.clone()).unwrap_or_default()
	}
}

impl NameQueries for FixedNameQueries {
	fn create_name_query(&self, element: &Element, suggestion: &str) -> Box<dyn NameQuery + '_> {
		let name = element.name();
		if let Ok(mut asked) = self.asked.lock() {
			asked.push(name.clone());
		}
		let answer = match self.answers.get(&name) {
			Some(answer) => Some(answer.clone()),
			None if self.cancel_unknown => None,
			None => Some(suggestion.to_string()),
		};
		Box::new(Answer(answer))
	}
}

struct Fixed(Confirmation);

impl ConfirmQuery for Fixed {
	fn confirm(&self, _question: &str) -> Confirmation {
		self.0
	}
}

/// Gives the same answer to every confirmation
#[derive(Debug, Clone, Copy)]
pub struct ConfirmAll(pub Confirmation);

impl Default for ConfirmAll {
	fn default() -> Self {
		ConfirmAll(Confirmation::Yes)
	}
}

impl ReorgQueries for ConfirmAll {
	fn create_confirm_query(&self, _kind: ConfirmationKind) -> Box<dyn ConfirmQuery + '_> {
		Box::new(Fixed(self.0))
	}
}

/// Suggested name for a copy placed next to an existing `name`; `attempt` starts at 1
pub fn copy_name_suggestion(element: &Element, name: &str, attempt: usize) -> String {
	match element.kind() {
		ElementKind::SourceUnit | ElementKind::Type => {
			if attempt <= 1 {
				format!("CopyOf{name}")
			} else {
				format!("Copy{attempt}Of{name}")
			}
		}
		ElementKind::Package => {
			if attempt <= 1 {
				format!("{name}_copy")
			} else {
				format!("{name}_copy{attempt}")
			}
		}
		ElementKind::Method | ElementKind::Field => {
			let mut chars = name.chars();
			let capitalized = match chars.next() {
				Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
				None => String::new(),
			};
			if attempt <= 1 {
				format!("copyOf{capitalized}")
			} else {
				format!("copy{attempt}Of{capitalized}")
			}
		}
		_ => {
			if attempt <= 1 {
				format!("Copy of {name}")
			} else {
				format!("Copy ({attempt}) of {name}")
			}
		}
	}
}
