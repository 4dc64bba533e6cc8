use clap::{Parser, Subcommand};
use royalbit_cellxfer::cli;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cellxfer")]
#[command(about = "Copy cells from source spreadsheets into fresh copies of a template.")]
#[command(long_about = "cellxfer - batch spreadsheet cell transfer

For every source file, a fresh copy of the base template is filled with
values read from the source, optionally transformed by a formula in X,
and saved under the source's file name in an output folder next to the
template.

COMMANDS:
  run           - Transfer cells from source files into template copies
  test-formula  - Preview a transform formula (X=1 by default)
  column        - Show the number of a column label (a=1, zz=702)

EXAMPLES:
  cellxfer run jan.xlsx feb.xlsx -t base.xlsx -o filled -m 2,c,5,a:X*10
  cellxfer run --job monthly.yaml
  cellxfer test-formula \"round(x * 1.1, 2)\" --x 7
  cellxfer column ab")]
#[command(version)]
struct Cli {
    /// Show per-mapping detail (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(long_about = "Transfer cells from source files into template copies.

MAPPINGS:
  Each --map is FROM_ROW,FROM_COL,TO_ROW,TO_COL with an optional
  :FORMULA suffix. Columns are letters a-zz; rows start at 1.

    -m 2,c,5,a           copy C2 into A5
    -m 2,c,5,a:X*10      write C2 * 10 into A5
    -m \"3,b,6,a:round(x / 3, 2)\"

  A formula that fails for a value writes the original value instead.

JOB FILES:
  template: base.xlsx
  output: filled
  sources: [jan.xlsx, feb.xlsx]
  mappings:
    - { from_row: 2, from_col: c, to_row: 5, to_col: a, formula: \"X*10\" }

  Paths are relative to the job file. Flags override job values;
  --map entries replace the job's mappings.

EXIT STATUS:
  Non-zero when the inputs are invalid or no source file was processed.")]
    /// Transfer cells from source files into template copies
    Run {
        /// Source spreadsheet files (first sheet is read)
        sources: Vec<PathBuf>,

        /// Base template spreadsheet
        #[arg(short, long, env = "CELLXFER_TEMPLATE")]
        template: Option<PathBuf>,

        /// Output folder name, created next to the template
        #[arg(short, long)]
        output: Option<String>,

        /// Mapping: FROM_ROW,FROM_COL,TO_ROW,TO_COL[:FORMULA] (repeatable)
        #[arg(short, long = "map")]
        map: Vec<String>,

        /// YAML job file with template, output, sources and mappings
        #[arg(short, long)]
        job: Option<PathBuf>,

        /// Print the batch report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview a transform formula
    TestFormula {
        /// Formula in X, e.g. "X * 2.54" or "round(x / 3, 2)"
        formula: String,

        /// Value to bind to X (defaults to 1)
        #[arg(long, allow_hyphen_values = true)]
        x: Option<String>,
    },

    /// Show the number of a column label
    Column {
        /// Column label, a-zz (case-insensitive)
        label: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            sources,
            template,
            output,
            map,
            job,
            json,
        } => cli::run(cli::RunOptions {
            sources,
            template,
            output,
            maps: map,
            job,
            json,
        })?,

        Commands::TestFormula { formula, x } => cli::test_formula(formula, x)?,

        Commands::Column { label } => cli::column(label)?,
    }

    Ok(())
}
