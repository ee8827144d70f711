use anyhow::Context as _;
use clap::Parser;
use larix::{first_sets::FirstSets, lr1::Automaton, parse_table::ParseTable, syntax};
use std::{fs, path::PathBuf};

/// Dump the LR(1) artifacts derived from a rule-definition file.
#[derive(Debug, Parser)]
#[command(name = "larix", version)]
struct Args {
    /// Path to the rule-definition file.
    grammar: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let source = fs::read_to_string(&args.grammar)
        .with_context(|| format!("reading {}", args.grammar.display()))?;

    let grammar = syntax::parse(&source).context("parsing rule definitions")?;
    let table = ParseTable::generate(&grammar).context("building parse table")?;

    println!("{}", grammar);
    println!("first sets:\n{}", FirstSets::new(&grammar));
    println!("automaton:\n{}", Automaton::generate(&grammar).display(&grammar));
    println!("table:\n{}", table);

    Ok(())
}
