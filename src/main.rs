use clap::Parser as ClapParser;
use jpio::{
    FunctionRegistry,
    cli::{self, CliError, RunOptions},
};
use std::{
    fs,
    io::{self, Read, Write},
    path::PathBuf,
};

#[derive(ClapParser)]
#[command(name = "jpio")]
#[command(about = "jpio - query and transform JSON documents in place")]
#[command(version)]
struct Cli {
    /// The query to execute (defaults to returning the document)
    #[arg(default_value = "")]
    query: String,

    /// Read data from a file instead of stdin
    #[arg(short = 'f', long)]
    infile: Option<PathBuf>,

    /// Write output to a file instead of stdout
    #[arg(short, long)]
    outfile: Option<PathBuf>,

    /// Print each element of a list result on its own line
    #[arg(short, long)]
    splitlist: bool,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Read queries from stdin against the document in --infile
    #[arg(short, long)]
    interactive: bool,

    /// List the available functions
    #[arg(long)]
    list_functions: bool,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let functions = FunctionRegistry::default();

    if cli.list_functions {
        print!("{}", cli::list_functions(&functions));
        return Ok(());
    }

    let input = match &cli.infile {
        Some(path) => Some(fs::read_to_string(path)?),
        None if !atty::is(atty::Stream::Stdin) && !cli.interactive => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = RunOptions {
        query: cli.query,
        input,
        pretty: cli.pretty,
        split: cli.splitlist,
    };

    if cli.interactive {
        let text = match (&cli.infile, &options.input) {
            (Some(_), Some(text)) => text,
            _ => return Err(CliError::InteractiveNeedsFile),
        };
        println!("Loading file ... ");
        let document = cli::load_document(text)?;
        let stdin = io::stdin();
        return cli::run_interactive(
            &document,
            &functions,
            options.printer(),
            stdin.lock(),
            &mut io::stdout(),
            &mut io::stderr(),
        );
    }

    let lines = cli::execute_run(&options, &functions)?;
    match &cli.outfile {
        Some(path) => {
            let mut file = fs::File::create(path)?;
            for line in &lines {
                writeln!(file, "{}", line)?;
            }
        }
        None => {
            for line in &lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
