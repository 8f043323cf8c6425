//! featdoc command line tool
//!
//! Inspect, recompute and dump saved documents.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use featdoc_core::{AppConfig, Application, Document};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let file = || {
        Arg::new("file")
            .required(true)
            .value_parser(value_parser!(PathBuf))
            .help("Saved document")
    };

    Command::new("featdoc")
        .version(featdoc_core::VERSION)
        .about("Parametric document runtime")
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("inspect")
                .about("List the objects of a document with their state")
                .arg(file())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("recompute")
                .about("Recompute a document and report failures")
                .arg(file())
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Execute every object, not only changed ones"),
                )
                .arg(
                    Arg::new("save")
                        .long("save")
                        .action(ArgAction::SetTrue)
                        .help("Write the result back to the file"),
                ),
        )
        .subcommand(
            Command::new("dump")
                .about("Write the document content as a standalone dump")
                .arg(file())
                .arg(
                    Arg::new("level")
                        .long("level")
                        .default_value("0")
                        .value_parser(value_parser!(i32))
                        .help("zstd compression level, 0 for plain JSON"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Destination file; stdout if omitted"),
                ),
        )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("featdoc=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => AppConfig::default(),
    };
    let mut app = Application::new(config);

    match matches.subcommand() {
        Some(("inspect", args)) => inspect(&mut app, args),
        Some(("recompute", args)) => recompute(&mut app, args),
        Some(("dump", args)) => dump(&mut app, args),
        _ => Ok(()),
    }
}

/// Open the `file` argument and return the document name
fn open(app: &mut Application, args: &ArgMatches) -> Result<String> {
    let Some(path) = args.get_one::<PathBuf>("file") else {
        bail!("no document given");
    };
    app.open(path)
        .with_context(|| format!("opening {}", path.display()))
}

fn document<'a>(app: &'a mut Application, name: &str) -> Result<&'a mut Document> {
    app.document_mut(name)
        .with_context(|| format!("document {name} is not open"))
}

fn inspect(app: &mut Application, args: &ArgMatches) -> Result<()> {
    let name = open(app, args)?;
    let doc = document(app, &name)?;

    if args.get_flag("json") {
        let objects = doc
            .objects()
            .map(|o| {
                serde_json::json!({
                    "name": o.name(),
                    "label": o.label(),
                    "type": o.type_name(),
                    "id": o.id().get(),
                    "state": o.status().state_names(),
                    "out_list": doc.out_list(o.name()).unwrap_or_default(),
                })
            })
            .collect::<Vec<_>>();
        let report = serde_json::json!({
            "name": doc.name(),
            "label": doc.label(),
            "uid": doc.uid(),
            "objects": objects,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Document {} ({})", doc.label(), doc.name());
    println!("  File: {}", doc.file_name());
    println!("  Objects: {}", doc.object_count());
    println!();
    for object in doc.objects() {
        println!(
            "  {:<24} {:<32} {}",
            object.name(),
            object.type_name(),
            object.status().state_names().join(", ")
        );
        for (path, formula) in doc.expressions(object.name())? {
            println!("      {path} = {formula}");
        }
    }
    Ok(())
}

fn recompute(app: &mut Application, args: &ArgMatches) -> Result<()> {
    let name = open(app, args)?;
    let doc = document(app, &name)?;

    if args.get_flag("force") {
        let names: Vec<String> = doc.object_names().into_iter().map(String::from).collect();
        for object in &names {
            doc.enforce_recompute(object)?;
        }
    }
    let executed = doc.recompute()?;
    let invalid: Vec<&str> = doc
        .objects()
        .filter(|o| !o.is_valid())
        .map(|o| o.name())
        .collect();

    println!("Executed: {executed}");
    for object in &invalid {
        println!("  invalid: {object}");
    }
    let failed = !invalid.is_empty();

    if args.get_flag("save") {
        doc.save().context("saving document")?;
        tracing::info!(document = %name, "recompute result saved");
    }
    if failed {
        std::process::exit(1);
    }
    Ok(())
}

fn dump(app: &mut Application, args: &ArgMatches) -> Result<()> {
    let name = open(app, args)?;
    let doc = document(app, &name)?;
    let level = args.get_one::<i32>("level").copied().unwrap_or(0);
    let bytes = doc.dump_content(level)?;

    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            std::fs::write(path, &bytes)
                .with_context(|| format!("writing {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = bytes.len(), "dump written");
        }
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&bytes)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn dump_level_defaults_to_plain() {
        let matches = cli().get_matches_from(["featdoc", "dump", "doc.fdoc"]);
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<i32>("level"), Some(&0));
        assert!(args.get_one::<PathBuf>("output").is_none());
    }
}
