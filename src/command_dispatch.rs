//! Purpose: Hold top-level CLI command dispatch for `recfile`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Mutating commands load, change, and save the whole file in one call.
//! Invariants: Assignments go through the field table, so CLI input follows file coercion rules.

use std::path::Path;

use clap::CommandFactory;
use recfile::api::{Assign, FieldIssue, LoadReport, Schema, Store};
use tracing::warn;

use super::*;
use crate::user::User;

pub(super) fn dispatch_command(
    command: Command,
    options: LoadOptions,
) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "recfile", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::List { file, json } => {
            let store = Store::<User>::open_with(&file, options)?;
            if json {
                emit_json(json!(store.get_all()));
            } else {
                print!("{}", recfile::api::encode_records(store.get_all(), store.schema()));
            }
            Ok(RunOutcome::ok())
        }
        Command::Add { file, assignments } => {
            let mut store = open_for_write(&file, options)?;
            let mut user = User::default();
            apply_assignments(store.schema(), &mut user, &assignments)?;
            store.create(user.clone());
            store.save()?;
            emit_json(json!({ "created": user, "records": store.len() }));
            Ok(RunOutcome::ok())
        }
        Command::Set {
            file,
            field,
            key,
            assignments,
        } => {
            let mut store = open_for_write(&file, options)?;
            let key_value = store.schema().parse_key(&field, &key)?;
            let schema = Schema::<User>::new();
            let mut applied = Ok(());
            let mut updated = None;
            let found = store.update(&field, &*key_value, |user| {
                applied = apply_assignments(&schema, user, &assignments);
                updated = Some(user.clone());
            })?;
            if !found {
                return Err(not_found(&field, &key));
            }
            applied?;
            store.save()?;
            emit_json(json!({ "updated": updated }));
            Ok(RunOutcome::ok())
        }
        Command::Remove { file, field, key } => {
            let mut store = open_for_write(&file, options)?;
            let key_value = store.schema().parse_key(&field, &key)?;
            let removed = store.find(&field, &*key_value)?.cloned();
            if !store.delete(&field, &*key_value)? {
                return Err(not_found(&field, &key));
            }
            store.save()?;
            emit_json(json!({ "removed": removed, "records": store.len() }));
            Ok(RunOutcome::ok())
        }
        Command::Check { file, json } => {
            let store = Store::<User>::open_with(&file, options)?;
            let report = store.last_report();
            if json {
                emit_json(report_json(&file, report));
            } else {
                emit_report_human(&file, report);
            }
            let exit_code = if report.is_clean() {
                0
            } else {
                to_exit_code(ErrorKind::Coercion)
            };
            Ok(RunOutcome::with_code(exit_code))
        }
    }
}

fn open_for_write(file: &Path, options: LoadOptions) -> Result<Store<User>, Error> {
    let store = Store::<User>::open_with(file, options)?;
    let issues = store.last_report().issues.len();
    if issues > 0 {
        warn!(
            path = %file.display(),
            issues,
            "unreadable values will be dropped when the file is saved"
        );
    }
    Ok(store)
}

fn apply_assignments(
    schema: &Schema<User>,
    user: &mut User,
    assignments: &[String],
) -> Result<(), Error> {
    for assignment in assignments {
        let Some((key, raw)) = assignment.split_once('=') else {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!("expected FIELD=VALUE, got {assignment:?}"))
                .with_hint("Quote list values, e.g. \"tags=[a, b]\"."));
        };
        let key = key.trim();
        match schema.assign(user, key, raw.trim()) {
            Assign::Set => {}
            Assign::Ignored => {
                return Err(Error::new(ErrorKind::UnknownField)
                    .with_message(format!("field '{key}' not found"))
                    .with_field(key)
                    .with_hint(format!("Known fields: {}.", schema.field_names().join(", "))));
            }
            Assign::Failed(coercion) => {
                return Err(Error::new(ErrorKind::Coercion)
                    .with_message(coercion.to_string())
                    .with_field(key)
                    .with_source(coercion));
            }
        }
    }
    Ok(())
}

fn not_found(field: &str, key: &str) -> Error {
    Error::new(ErrorKind::NotFound)
        .with_message(format!("no record with {field} = {key}"))
        .with_field(field)
}

fn issue_json(issue: &FieldIssue) -> Value {
    json!({
        "record": issue.record,
        "line": issue.line,
        "key": issue.key,
        "raw": issue.raw,
        "reason": issue.reason.as_str(),
    })
}

fn report_json(file: &Path, report: &LoadReport) -> Value {
    let issues = report.issues.iter().map(issue_json).collect::<Vec<_>>();
    json!({
        "path": file.display().to_string(),
        "status": if report.is_clean() { "ok" } else { "issues" },
        "records": report.records,
        "assigned": report.assigned,
        "ignored": report.ignored,
        "issues": issues,
    })
}

fn emit_report_human(file: &Path, report: &LoadReport) {
    println!(
        "{}: {} records, {} fields read, {} ignored",
        file.display(),
        report.records,
        report.assigned,
        report.ignored
    );
    for issue in &report.issues {
        println!(
            "  line {}: {}: {} ({:?})",
            issue.line,
            issue.key,
            issue.reason.as_str(),
            issue.raw
        );
    }
}
