//! `rbook` - CLI for recordbook
//!
//! This binary loads the workspace, applies one catalog operation, and saves
//! the workspace again when the operation changed it.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;

use recordbook::cli::{
    Cli, Command, ConfigCommand, FieldCommand, FileCommand, KeyFileCommand, NoteCommand,
    PersonCommand, ProgramCommand, StructCommand, ValidCommand,
};
use recordbook::config::OutputFormat;
use recordbook::model::{DataStructureSpec, Field, File, PersonRole, Program, ValidDataSpec};
use recordbook::{init_logging, Config, Workspace};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    let format = cli.output_format(config.output.format);

    match cli.command {
        Command::Config(cmd) => handle_config(&config, cmd, format),
        command => {
            let path = cli
                .workspace
                .clone()
                .unwrap_or_else(|| config.workspace_path());
            run(command, &path, &config, format)
        }
    }
}

/// Load the workspace, apply one command, and save if it changed anything.
fn run(command: Command, path: &Path, config: &Config, format: OutputFormat) -> Result<()> {
    let mut workspace = Workspace::load(path)
        .with_context(|| format!("loading workspace {}", path.display()))?;
    let mutating = command.is_mutating();

    match command {
        Command::File(cmd) => handle_file(&mut workspace, cmd, format)?,
        Command::Field(cmd) => handle_field(&mut workspace, cmd, format)?,
        Command::Valid(cmd) => handle_valid(&mut workspace, cmd, format)?,
        Command::Struct(cmd) => handle_struct(&mut workspace, cmd, format)?,
        Command::Program(cmd) => handle_program(&mut workspace, cmd, format)?,
        Command::Person(cmd) => handle_person(&mut workspace, cmd, format)?,
        Command::Keyfile(cmd) => handle_key_file(&mut workspace, cmd, format)?,
        Command::Note(cmd) => handle_note(&mut workspace, cmd, format)?,
        Command::Config(cmd) => handle_config(config, cmd, format)?,
    }

    if mutating {
        save(&workspace, path, config.storage.pretty_json)?;
    }
    Ok(())
}

fn save(workspace: &Workspace, path: &Path, pretty: bool) -> Result<()> {
    workspace
        .save(path, pretty)
        .with_context(|| format!("saving workspace {}", path.display()))
}

/// Print `value` as JSON, or run `table` for plain output.
fn emit<T: Serialize>(format: OutputFormat, value: &T, table: impl FnOnce()) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Table => table(),
    }
    Ok(())
}

fn print_file(file: &File) {
    println!("File {}: {}", file.id, file.short_name);
    println!("  Long name:  {}", file.long_name);
    println!("  Location:   {}", file.location);
    println!("  Size:       {}", file.size_bytes);
    println!("  Doc link:   {}", file.doc_link);
    println!("  Archived:   {}", file.archived);
}

fn print_fields<'a>(fields: impl IntoIterator<Item = &'a Field>) {
    println!("{:>6}  {:<24} {:>6} {:>6} {:>6}  PACKED", "ID", "NAME", "SIZE", "BEG", "END");
    for field in fields {
        println!(
            "{:>6}  {:<24} {:>6} {:>6} {:>6}  {}",
            field.id,
            field.name,
            field.size_bytes,
            field.beg_pos,
            field.end_pos,
            if field.packed { "yes" } else { "" }
        );
    }
}

fn print_program(program: &Program) {
    println!("Program {}: {}", program.id, program.name);
    println!("  Type:             {}", program.program_type);
    println!("  Runs on:          {}", program.run_location);
    println!("  Source:           {}", program.source_location);
    println!("  Description:      {}", program.description);
    println!("  Key programmers:  {}", program.key_programmers);
    println!("  Key users:        {}", program.key_users);
    println!("  Archived:         {}", program.archived);
}

fn handle_file(workspace: &mut Workspace, cmd: FileCommand, format: OutputFormat) -> Result<()> {
    match cmd {
        FileCommand::Create(args) => {
            let file = workspace.files.create_file(args.into())?;
            emit(format, &file, || println!("Created file {} ({})", file.id, file.short_name))
        }
        FileCommand::List => {
            let files: Vec<&File> = workspace.files.files().collect();
            emit(format, &files, || {
                println!("{:>6}  {:<12} {:<32} {:>6}", "ID", "SHORT", "LONG NAME", "FIELDS");
                for file in &files {
                    println!(
                        "{:>6}  {:<12} {:<32} {:>6}",
                        file.id,
                        file.short_name,
                        file.long_name,
                        workspace.files.fields_of(file.id).count()
                    );
                }
            })
        }
        FileCommand::Show { file_id } => {
            let Some(file) = workspace.files.file(file_id) else {
                bail!("file not found: {file_id}");
            };
            let fields: Vec<&Field> = workspace.files.fields_of(file_id).collect();
            let view = serde_json::json!({ "file": file, "fields": fields });
            emit(format, &view, || {
                print_file(file);
                println!();
                print_fields(fields.iter().copied());
            })
        }
        FileCommand::Update(args) => {
            let (file_id, patch) = args.into_patch();
            let file = workspace.files.update_file(file_id, patch)?;
            emit(format, &file, || print_file(&file))
        }
        FileCommand::Delete { file_id } => {
            let removal = workspace.files.delete_file(file_id);
            emit(format, &removal, || {
                if removal.is_noop() {
                    println!("No file {file_id}; nothing deleted");
                } else {
                    println!(
                        "Deleted file {} with {} fields, {} valid data, {} data structures",
                        file_id,
                        removal.fields.len(),
                        removal.valid_data,
                        removal.data_structures
                    );
                }
            })
        }
        FileCommand::Relayout { file_id } => {
            let fields = workspace.files.recompute_positions(file_id)?;
            emit(format, &fields, || print_fields(&fields))
        }
    }
}

fn handle_field(workspace: &mut Workspace, cmd: FieldCommand, format: OutputFormat) -> Result<()> {
    match cmd {
        FieldCommand::Add(args) => {
            let file_id = args.file_id;
            let field = workspace.files.add_field(file_id, args.into())?;
            emit(format, &field, || {
                println!(
                    "Added field {} ({}) at {}",
                    field.id,
                    field.name,
                    field.span()
                );
            })
        }
        FieldCommand::Update(args) => {
            let (field_id, patch) = args.into_patch();
            let field = workspace.files.update_field(field_id, patch)?;
            emit(format, &field, || print_fields([&field]))
        }
        FieldCommand::Delete { field_id } => {
            let removal = workspace.files.delete_field(field_id);
            emit(format, &removal, || {
                if removal.is_noop() {
                    println!("No field {field_id}; nothing deleted");
                } else {
                    println!(
                        "Deleted field {} with {} valid data, {} data structures",
                        field_id, removal.valid_data, removal.data_structures
                    );
                }
            })
        }
        FieldCommand::List { file_id } => {
            if workspace.files.file(file_id).is_none() {
                bail!("file not found: {file_id}");
            }
            let fields: Vec<&Field> = workspace.files.fields_of(file_id).collect();
            emit(format, &fields, || print_fields(fields.iter().copied()))
        }
    }
}

fn handle_valid(workspace: &mut Workspace, cmd: ValidCommand, format: OutputFormat) -> Result<()> {
    match cmd {
        ValidCommand::Add {
            field_id,
            value,
            description,
        } => {
            let entry = workspace
                .files
                .add_valid_data(field_id, ValidDataSpec::new(value, description))?;
            emit(format, &entry, || {
                println!("Added valid data {}/{}", entry.field_id, entry.seq_id);
            })
        }
        ValidCommand::Delete { field_id, seq_id } => {
            let removed = workspace.files.delete_valid_data(field_id, seq_id);
            emit(format, &removed, || match &removed {
                Some(entry) => println!("Deleted valid data {}/{}", field_id, entry.seq_id),
                None => println!("No valid data {field_id}/{seq_id}; nothing deleted"),
            })
        }
        ValidCommand::List { field_id } => {
            let entries: Vec<_> = workspace.files.valid_data_of(field_id).collect();
            emit(format, &entries, || {
                println!("{:>6}  {:<16} DESCRIPTION", "SEQ", "VALUE");
                for entry in &entries {
                    println!(
                        "{:>6}  {:<16} {}",
                        entry.seq_id, entry.value, entry.description
                    );
                }
            })
        }
    }
}

fn handle_struct(
    workspace: &mut Workspace,
    cmd: StructCommand,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        StructCommand::Add {
            field_id,
            name,
            beg,
            end,
            description,
        } => {
            let spec = DataStructureSpec {
                description,
                ..DataStructureSpec::new(name, beg, end)
            };
            let entry = workspace.files.add_data_structure(field_id, spec)?;
            emit(format, &entry, || {
                println!(
                    "Added data structure {}/{} at {}",
                    entry.field_id,
                    entry.ds_id,
                    entry.span()
                );
            })
        }
        StructCommand::Delete { field_id, ds_id } => {
            let removed = workspace.files.delete_data_structure(field_id, ds_id);
            emit(format, &removed, || match &removed {
                Some(entry) => println!("Deleted data structure {}/{}", field_id, entry.ds_id),
                None => println!("No data structure {field_id}/{ds_id}; nothing deleted"),
            })
        }
        StructCommand::List { field_id } => {
            let entries: Vec<_> = workspace.files.data_structures_of(field_id).collect();
            emit(format, &entries, || {
                println!("{:>6}  {:<24} {:>6} {:>6}", "DS", "NAME", "BEG", "END");
                for entry in &entries {
                    println!(
                        "{:>6}  {:<24} {:>6} {:>6}",
                        entry.ds_id, entry.name, entry.beg_pos, entry.end_pos
                    );
                }
            })
        }
    }
}

fn handle_program(
    workspace: &mut Workspace,
    cmd: ProgramCommand,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        ProgramCommand::Create(args) => {
            let program = workspace.programs.create_program(args.into())?;
            emit(format, &program, || {
                println!("Created program {} ({})", program.id, program.name);
            })
        }
        ProgramCommand::List => {
            let programs: Vec<&Program> = workspace.programs.programs().collect();
            emit(format, &programs, || {
                println!(
                    "{:>6}  {:<16} {:<12} {:>9} {:>6}",
                    "ID", "NAME", "TYPE", "KEY FILES", "NOTES"
                );
                for program in &programs {
                    println!(
                        "{:>6}  {:<16} {:<12} {:>9} {:>6}",
                        program.id,
                        program.name,
                        program.program_type,
                        workspace.programs.key_file_count(program.id),
                        workspace.programs.note_count(program.id)
                    );
                }
            })
        }
        ProgramCommand::Show { program_id } => {
            let Some(program) = workspace.programs.program(program_id) else {
                bail!("program not found: {program_id}");
            };
            let key_files = workspace.key_file_views(program_id);
            let notes: Vec<_> = workspace.programs.notes_of(program_id).collect();
            let view = serde_json::json!({
                "program": program,
                "key_files": key_files,
                "notes": notes,
            });
            emit(format, &view, || {
                print_program(program);
                println!();
                println!("Key files:");
                for view in &key_files {
                    println!(
                        "  {:>4}  {:<12} {}",
                        view.reference.seq_id,
                        view.file_name.as_deref().unwrap_or("?"),
                        view.reference.notes
                    );
                }
                println!("Notes:");
                for note in &notes {
                    println!("  {:>4}  [{}] {}", note.seq_id, note.author_id, note.text);
                }
            })
        }
        ProgramCommand::Update(args) => {
            let (program_id, patch) = args.into_patch();
            let program = workspace.programs.update_program(program_id, patch)?;
            emit(format, &program, || print_program(&program))
        }
        ProgramCommand::Delete { program_id } => {
            let removal = workspace.programs.delete_program(program_id);
            emit(format, &removal, || {
                if removal.is_noop() {
                    println!("No program {program_id}; nothing deleted");
                } else {
                    println!(
                        "Deleted program {} with {} key files, {} notes",
                        program_id, removal.key_files, removal.notes
                    );
                }
            })
        }
    }
}

fn handle_person(
    workspace: &mut Workspace,
    cmd: PersonCommand,
    format: OutputFormat,
) -> Result<()> {
    let program = match cmd {
        PersonCommand::Add(args) => {
            workspace
                .programs
                .add_person(args.program_id, args.role.into(), &args.name)?
        }
        PersonCommand::Remove(args) => {
            workspace
                .programs
                .remove_person(args.program_id, args.role.into(), &args.name)?
        }
    };
    emit(format, &program, || {
        println!(
            "{}: {}",
            PersonRole::Programmer,
            program.people(PersonRole::Programmer)
        );
        println!("{}: {}", PersonRole::User, program.people(PersonRole::User));
    })
}

fn handle_key_file(
    workspace: &mut Workspace,
    cmd: KeyFileCommand,
    format: OutputFormat,
) -> Result<()> {
    let patch = cmd.patch();
    match cmd {
        KeyFileCommand::Add {
            program_id,
            file_id,
            notes,
        } => {
            let reference = workspace.programs.add_key_file(program_id, file_id, notes)?;
            emit(format, &reference, || {
                println!(
                    "Added key file {}/{} -> file {}",
                    program_id, reference.seq_id, reference.file_id
                );
            })
        }
        KeyFileCommand::Update {
            program_id, seq_id, ..
        } => {
            let patch = patch.unwrap_or_default();
            let reference = workspace.programs.update_key_file(program_id, seq_id, patch)?;
            emit(format, &reference, || {
                println!("Updated key file {}/{}", program_id, reference.seq_id);
            })
        }
        KeyFileCommand::Delete { program_id, seq_id } => {
            let removed = workspace.programs.delete_key_file(program_id, seq_id);
            emit(format, &removed, || match &removed {
                Some(_) => println!("Deleted key file {program_id}/{seq_id}"),
                None => println!("No key file {program_id}/{seq_id}; nothing deleted"),
            })
        }
        KeyFileCommand::List { program_id } => {
            if workspace.programs.program(program_id).is_none() {
                bail!("program not found: {program_id}");
            }
            let views = workspace.key_file_views(program_id);
            emit(format, &views, || {
                println!("{:>6}  {:>6}  {:<12} NOTES", "SEQ", "FILE", "NAME");
                for view in &views {
                    println!(
                        "{:>6}  {:>6}  {:<12} {}",
                        view.reference.seq_id,
                        view.reference.file_id,
                        view.file_name.as_deref().unwrap_or("?"),
                        view.reference.notes
                    );
                }
            })
        }
    }
}

fn handle_note(workspace: &mut Workspace, cmd: NoteCommand, format: OutputFormat) -> Result<()> {
    let patch = cmd.patch();
    match cmd {
        NoteCommand::Add {
            program_id,
            text,
            author,
        } => {
            let note = workspace.programs.add_note(program_id, &text, &author)?;
            emit(format, &note, || {
                println!("Added note {}/{}", program_id, note.seq_id);
            })
        }
        NoteCommand::Update {
            program_id, seq_id, ..
        } => {
            let patch = patch.unwrap_or_default();
            let note = workspace.programs.update_note(program_id, seq_id, patch)?;
            emit(format, &note, || {
                println!("Updated note {}/{}", program_id, note.seq_id);
            })
        }
        NoteCommand::Delete { program_id, seq_id } => {
            let removed = workspace.programs.delete_note(program_id, seq_id);
            emit(format, &removed, || match &removed {
                Some(_) => println!("Deleted note {program_id}/{seq_id}"),
                None => println!("No note {program_id}/{seq_id}; nothing deleted"),
            })
        }
        NoteCommand::List { program_id } => {
            let notes: Vec<_> = workspace.programs.notes_of(program_id).collect();
            emit(format, &notes, || {
                for note in &notes {
                    println!(
                        "{:>4}  {}  [{}] {}",
                        note.seq_id,
                        note.updated_at.format("%Y-%m-%d %H:%M"),
                        note.author_id,
                        note.text
                    );
                }
            })
        }
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand, format: OutputFormat) -> Result<()> {
    match cmd {
        ConfigCommand::Show => emit(format, config, || {
            println!("Current Configuration");
            println!("=====================");
            println!();
            println!("[Storage]");
            println!("  Workspace path:     {}", config.workspace_path().display());
            println!("  Pretty JSON:        {}", config.storage.pretty_json);
            println!();
            println!("[Output]");
            println!("  Format:             {}", config.output.format);
        }),
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
            Ok(())
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
            Ok(())
        }
    }
}
