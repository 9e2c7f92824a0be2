use std::fs::File;
use std::io::BufReader;
use std::io::Read;
use std::path::PathBuf;

use clap::Parser as ClapParser;
use clap::Subcommand;

use treelox::ast_printer::AstPrinter;
use treelox::parser::Parser;
use treelox::scanner::Scanner;
use treelox::session::Lox;
use treelox::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes the provided input from a given valid filepath
    Tokenize { filename: PathBuf },

    /// Parses the provided input and prints the AST
    Parse { filename: PathBuf },

    /// Runs a Lox script
    Run { filename: PathBuf },

    /// Starts an interactive session
    Repl,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Cli = Cli::parse();

    match args.commands {
        Commands::Tokenize { filename } => {
            let source: String = read_source(&filename)?;

            let mut tokenized: bool = true;

            for item in Scanner::new(source.as_bytes()) {
                match item {
                    Ok(token) => println!("{}", token),

                    Err(e) => {
                        tokenized = false;
                        eprintln!("{}", e);
                    }
                }
            }

            if !tokenized {
                std::process::exit(65);
            }
        }

        Commands::Parse { filename } => {
            let source: String = read_source(&filename)?;

            let tokens: Vec<Token> = Scanner::new(source.as_bytes())
                .filter_map(Result::ok)
                .collect();

            let mut parser: Parser = Parser::new(tokens, 0);
            let statements = parser.parse();

            if parser.had_error() {
                for e in parser.errors() {
                    eprintln!("{}", e);
                }
                std::process::exit(65);
            }

            let printer = AstPrinter;
            for statement in &statements {
                println!("{}", printer.print_stmt(statement));
            }
        }

        Commands::Run { filename } => {
            let mut lox: Lox = Lox::new();

            lox.run_file(&filename)?;

            let code: i32 = lox.exit_code();
            if code != 0 {
                std::process::exit(code);
            }
        }

        Commands::Repl => {
            let mut lox: Lox = Lox::new();

            lox.repl()?;
        }
    }

    Ok(())
}

fn read_source(path: &PathBuf) -> anyhow::Result<String> {
    let mut buf: Vec<u8> = Vec::new();
    let mut reader: BufReader<File> = BufReader::new(File::open(path)?);
    let _ = reader.read_to_end(&mut buf)?;

    Ok(String::from_utf8_lossy(&buf).into_owned())
}
