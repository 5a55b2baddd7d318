use anyhow::{anyhow, bail, Context};
use clap::{Args, Parser, Subcommand};
use source_reorg::change::ChangeHistory;
use source_reorg::model::BatchRecorder;
use source_reorg::reorg::{ConfirmAll, Confirmation, FixedNameQueries, Queries};
use source_reorg::{
	perform, CancellationToken, CopyProcessor, DeleteProcessor, Element, MoveProcessor, ParticipantRegistry,
	RefactoringStatus, ReorgConfig, ReorgProcessor, Workspace,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn, Level};

#[derive(Parser)]
#[command(name = "reorg")]
#[command(about = "Move, copy and delete source roots, packages, source units and their members")]
struct Cli {
	/// Workspace directory holding the descriptor and one folder per project
	#[arg(short, long, default_value = ".")]
	workspace: PathBuf,

	/// Enable verbose logging
	#[arg(short, long)]
	verbose: bool,

	#[command(subcommand)]
	command: Command,
}

#[derive(Args)]
struct ApplyOptions {
	/// Answer a name conflict for the element named OLD with NEW
	#[arg(long = "rename", value_name = "OLD=NEW", value_parser = parse_rename)]
	renames: Vec<(String, String)>,

	/// Print the change as JSON instead of performing it
	#[arg(long)]
	dry_run: bool,

	/// Answer yes to read-only and overwrite questions
	#[arg(short, long)]
	yes: bool,

	/// Proceed even when the checks report errors
	#[arg(long)]
	force: bool,
}

#[derive(Subcommand)]
enum Command {
	/// List projects, or the children of an element
	List { element: Option<String> },

	/// Move elements to a destination
	Move {
		#[arg(required = true)]
		elements: Vec<String>,

		#[arg(long)]
		to: String,

		/// Leave imports in other units untouched
		#[arg(long)]
		no_update_references: bool,

		#[command(flatten)]
		options: ApplyOptions,
	},

	/// Copy elements to a destination
	Copy {
		#[arg(required = true)]
		elements: Vec<String>,

		#[arg(long)]
		to: String,

		#[command(flatten)]
		options: ApplyOptions,
	},

	/// Delete elements
	Delete {
		#[arg(required = true)]
		elements: Vec<String>,

		/// Also delete the sub-packages of selected packages
		#[arg(long)]
		sub_packages: bool,

		#[command(flatten)]
		options: ApplyOptions,
	},

	/// Revert the last performed operation
	Undo,
}

fn parse_rename(value: &str) -> Result<(String, String), String> {
	match value.split_once('=') {
		Some((old, new)) if !old.is_empty() && !new.is_empty() => Ok((old.to_string(), new.to_string())),
		_ => Err(format!("expected OLD=NEW, got '{value}'")),
	}
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();

	let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
	tracing_subscriber::fmt().with_max_level(level).init();

	let token = CancellationToken::new();
	let interrupt = token.clone();
	tokio::spawn(async move {
		if tokio::signal::ctrl_c().await.is_ok() {
			warn!("Interrupted, cancelling the running operation...");
			interrupt.cancel();
		}
	});

	let dir = cli.workspace;
	let command = cli.command;
	tokio::task::spawn_blocking(move || run(&dir, command, &token)).await?
}

/// Workspace state shared by every command
struct Session<'a> {
	dir: &'a Path,
	ws: Workspace,
	recorder: BatchRecorder,
	history_path: PathBuf,
}

impl<'a> Session<'a> {
	fn open(dir: &'a Path) -> anyhow::Result<Self> {
		let config = ReorgConfig::default();
		let history_path = dir.join(&config.history_file);
		let mut ws = Workspace::load(dir, config).with_context(|| format!("loading {}", dir.display()))?;
		let recorder = BatchRecorder::new();
		ws.add_listener(recorder.clone());
		Ok(Self { dir, ws, recorder, history_path })
	}

	fn resolve_all(&self, specs: &[String]) -> anyhow::Result<Vec<Option<Element>>> {
		specs
			.iter()
			.map(|spec| self.ws.resolve(spec).map(Some).with_context(|| format!("resolving '{spec}'")))
			.collect()
	}

	/// Mirror recorded batches to disk
	fn write_back(&self) -> anyhow::Result<()> {
		for batch in self.recorder.take() {
			self.ws.write_back(self.dir, &batch)?;
		}
		Ok(())
	}
}

fn run(dir: &Path, command: Command, token: &CancellationToken) -> anyhow::Result<()> {
	let mut session = Session::open(dir)?;

	match command {
		Command::List { element } => list(&session.ws, element.as_deref()),
		Command::Undo => undo(&mut session, token),
		Command::Move { elements, to, no_update_references, options } => {
			let selection = session.resolve_all(&elements)?;
			let mut processor = MoveProcessor::create(&session.ws, &[], &selection)
				.ok_or_else(|| anyhow!("The selection cannot be moved"))?;
			processor.set_update_references(!no_update_references);
			let status = processor.set_destination(&session.ws, Some(session.ws.resolve(&to)?));
			check_destination(&status)?;
			apply(&mut session, &mut processor, &options, token)
		}
		Command::Copy { elements, to, options } => {
			let selection = session.resolve_all(&elements)?;
			let mut processor = CopyProcessor::create(&session.ws, &[], &selection)
				.ok_or_else(|| anyhow!("The selection cannot be copied"))?;
			let status = processor.set_destination(&session.ws, Some(session.ws.resolve(&to)?));
			check_destination(&status)?;
			apply(&mut session, &mut processor, &options, token)
		}
		Command::Delete { elements, sub_packages, options } => {
			let selection = session.resolve_all(&elements)?;
			let mut processor = DeleteProcessor::create(&session.ws, &[], &selection)
				.ok_or_else(|| anyhow!("The selection cannot be deleted"))?;
			processor.set_delete_sub_packages(sub_packages);
			apply(&mut session, &mut processor, &options, token)
		}
	}
}

fn list(ws: &Workspace, element: Option<&str>) -> anyhow::Result<()> {
	let children = match element {
		Some(spec) => ws.children(&ws.resolve(spec)?),
		None => ws.projects().map(|p| Element::Project(p.name.clone())).collect(),
	};
	for child in children {
		println!("{:<20} {}", child.kind().label(), child);
	}
	Ok(())
}

fn report(status: &RefactoringStatus) {
	for entry in status.entries() {
		println!("{}: {}", entry.severity, entry.message);
	}
}

fn check_destination(status: &RefactoringStatus) -> anyhow::Result<()> {
	report(status);
	if status.has_fatal_error() {
		bail!("Invalid destination");
	}
	Ok(())
}

fn apply(
	session: &mut Session<'_>, processor: &mut dyn ReorgProcessor, options: &ApplyOptions, token: &CancellationToken,
) -> anyhow::Result<()> {
	let names = options
		.renames
		.iter()
		.fold(FixedNameQueries::new(), |queries, (old, new)| queries.with_name(old, new));
	let confirmations = ConfirmAll(if options.yes { Confirmation::Yes } else { Confirmation::Cancel });
	let queries = Queries::new(&names, &confirmations);
	let registry = ParticipantRegistry::new();
	let label = processor.label();

	if options.dry_run {
		let status = processor.check_final_conditions(&session.ws, &queries);
		report(&status);
		if !status.can_proceed(options.force) {
			bail!("'{label}' cannot be performed");
		}
		let reorg = processor.create_change(&session.ws, &registry)?;
		report(&reorg.status);
		println!("{}", serde_json::to_string_pretty(&reorg.change)?);
		return Ok(());
	}

	let outcome = perform(&mut session.ws, processor, &queries, &registry, token, options.force);
	report(&outcome.status);
	let Some(undo) = outcome.undo else {
		if outcome.retryable {
			println!("The workspace is unchanged; running the command again may succeed");
		}
		if outcome.cancelled {
			bail!("'{label}' was cancelled");
		}
		bail!("'{label}' was not performed");
	};

	session.write_back()?;
	let mut history = ChangeHistory::load(&session.history_path)?;
	let id = history.record(label.clone(), undo);
	history.save(&session.history_path)?;
	debug!("Recorded '{}' as {}", label, id);
	info!("{}", label);
	Ok(())
}

fn undo(session: &mut Session<'_>, token: &CancellationToken) -> anyhow::Result<()> {
	let mut history = ChangeHistory::load(&session.history_path)?;
	let Some(label) = history.peek_undo().map(|entry| entry.label.clone()) else {
		println!("Nothing to undo");
		return Ok(());
	};
	let Some(outcome) = history.undo(&mut session.ws, token) else {
		return Ok(());
	};
	report(&outcome.status);
	if !outcome.succeeded() {
		if outcome.retryable {
			println!("'{label}' is still on the undo stack; run undo again to retry");
		}
		bail!("Undo of '{label}' failed");
	}
	session.write_back()?;
	history.save(&session.history_path)?;
	info!("Undid '{}'", label);
	Ok(())
}
