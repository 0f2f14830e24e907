use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use sheetfold_engine::{
    FlattenOptions, Flattener, JsonInput, UnflattenOptions, Unflattener, WarningSink,
};
use sheetfold_spec::SchemaIndex;
use std::path::PathBuf;

mod sheets_io;

#[derive(Parser)]
#[command(
    name = "sheetfold",
    version,
    about = "Convert between nested JSON documents and flat spreadsheets"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Flatten a JSON document into a main sheet plus sub-sheets.
    Flatten(FlattenArgs),
    /// Rebuild nested JSON from a directory of CSVs or a JSON sheet file.
    Unflatten(UnflattenArgs),
}

#[derive(Args)]
struct FlattenArgs {
    /// Input JSON document.
    input: PathBuf,
    /// Output directory for CSVs, or the output file with --json.
    #[arg(long, default_value = "flattened")]
    out: PathBuf,
    /// JSON Schema guiding shapes, sheet names, and rollup.
    #[arg(long)]
    schema: Option<PathBuf>,
    /// Identifier field carried onto every sub-sheet.
    #[arg(long, default_value = "ocid", conflicts_with = "no_root_id")]
    root_id: String,
    /// Use no root id at all.
    #[arg(long)]
    no_root_id: bool,
    /// Copy schema-listed fields of single-item arrays onto the main sheet.
    #[arg(long)]
    rollup: bool,
    /// Key holding the record list when the document root is an object.
    #[arg(long, default_value = "main")]
    root_list_path: String,
    /// Write one JSON file of sheets instead of CSVs.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct UnflattenArgs {
    /// Directory of CSV sheets, or a JSON file of `{sheet: [rows, ...]}`.
    input: PathBuf,
    /// Output JSON file; stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
    /// JSON Schema guiding shapes, coercion, and titles.
    #[arg(long)]
    schema: Option<PathBuf>,
    /// Identifier field tying sheets together.
    #[arg(long, default_value = "ocid", conflicts_with = "no_root_id")]
    root_id: String,
    /// Use no root id at all.
    #[arg(long)]
    no_root_id: bool,
    /// Resolve column headings through schema titles.
    #[arg(long)]
    convert_titles: bool,
}

fn main() -> Result<()> {
    init_tracing();
    match Cli::parse().command {
        Command::Flatten(args) => run_flatten(args),
        Command::Unflatten(args) => run_unflatten(args),
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_schema(path: Option<&PathBuf>) -> Result<Option<SchemaIndex>> {
    path.map(|path| {
        SchemaIndex::from_file(path)
            .with_context(|| format!("loading schema {}", path.display()))
    })
    .transpose()
}

fn report_warnings(warnings: &WarningSink) {
    for message in warnings.messages() {
        eprintln!("{message}");
    }
}

fn run_flatten(args: FlattenArgs) -> Result<()> {
    let schema = load_schema(args.schema.as_ref())?;
    let options = FlattenOptions {
        root_id: if args.no_root_id {
            String::new()
        } else {
            args.root_id
        },
        root_list_path: args.root_list_path,
        rollup: args.rollup,
    };
    let mut flattener = Flattener::new(options);
    if let Some(schema) = &schema {
        flattener = flattener.with_schema(schema);
    }
    flattener
        .flatten(JsonInput::from_file(&args.input))
        .with_context(|| format!("flattening {}", args.input.display()))?;
    report_warnings(flattener.warnings());

    if args.json {
        sheets_io::write_json_sheets(&args.out, &flattener)
    } else {
        sheets_io::write_csv_sheets(&args.out, &flattener)
    }
}

fn run_unflatten(args: UnflattenArgs) -> Result<()> {
    let schema = load_schema(args.schema.as_ref())?;
    let sheets = if args.input.is_dir() {
        sheets_io::read_csv_dir(&args.input)?
    } else {
        sheets_io::read_json_sheets(&args.input)?
    };
    let options = UnflattenOptions {
        root_id: if args.no_root_id {
            String::new()
        } else {
            args.root_id
        },
        convert_titles: args.convert_titles,
    };
    let mut unflattener = Unflattener::new(options);
    if let Some(schema) = &schema {
        unflattener = unflattener.with_schema(schema);
    }
    let output = unflattener
        .unflatten(&sheets)
        .with_context(|| format!("unflattening {}", args.input.display()))?;
    report_warnings(unflattener.warnings());

    let rendered = serde_json::to_string_pretty(&serde_json::Value::Array(output))
        .context("serializing output")?;
    match args.out {
        Some(path) => std::fs::write(&path, rendered + "\n")
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{rendered}"),
    }
    Ok(())
}
