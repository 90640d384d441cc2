use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use pdfrag_core::config::{Config, Settings};
use pdfrag_core::corpus::{load_corpus, save_corpus, CorpusBuilder};
use pdfrag_core::Error;
use pdfrag_embed::load_embedder;
use pdfrag_query::{Answer, QueryEngine, QueryResult};
use pdfrag_vector::{FlatIndex, VectorIndex};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage:
  pdfrag build [pdf_dir] [--out <corpus.json>]
  pdfrag ask [-k <n>] [--corpus <corpus.json>] [question...]";

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    (cmd, args)
}

fn flag_value(args: &[String], i: usize, flag: &str) -> String {
    match args.get(i + 1) {
        Some(v) => v.clone(),
        None => { eprintln!("Error: {flag} requires a value"); std::process::exit(1); }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let (cmd, args) = parse_args();
    if matches!(cmd.as_str(), "-h" | "--help" | "help") {
        println!("{USAGE}");
        return Ok(());
    }
    let settings = Config::load().settings().map_err(|e| { eprintln!("Error loading config: {e}"); e })?;
    match cmd.as_str() {
        "build" => run_build(&settings, &args),
        "ask" => run_ask(&settings, &args),
        other => { eprintln!("Unknown command: {other}\n{USAGE}"); std::process::exit(1); }
    }
}

fn run_build(settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let mut pdf_dir = settings.data.pdf_dir();
    let mut out = settings.data.corpus_path();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--out" | "-o" => { out = PathBuf::from(flag_value(args, i, "--out")); i += 1; }
            a if !a.starts_with('-') => pdf_dir = PathBuf::from(a),
            a => { eprintln!("Unknown flag: {a}\n{USAGE}"); std::process::exit(1); }
        }
        i += 1;
    }

    println!("PDF directory: {}", pdf_dir.display());
    let builder = CorpusBuilder::new(settings.chunking)?;
    let report = builder.build(&pdf_dir)?;
    for failure in &report.failures {
        eprintln!("⚠️  Skipped {}: {}", failure.path.display(), failure.error);
    }
    for source in &report.empty_documents {
        eprintln!("⚠️  {source} has no extractable text (scanned?)");
    }
    save_corpus(&out, &report.chunks)?;
    println!("=== Job Done, Total Chunks: {} ===", report.chunks.len());
    println!("=== Saved at: {} ===", out.display());
    Ok(())
}

fn run_ask(settings: &Settings, args: &[String]) -> anyhow::Result<()> {
    let mut k = settings.retrieval.k;
    let mut corpus_path = settings.data.corpus_path();
    let mut words = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-k" | "--k" => {
                let raw = flag_value(args, i, "-k");
                k = match raw.parse::<usize>() {
                    Ok(n) if n > 0 => n,
                    _ => { eprintln!("Error: -k requires a positive number"); std::process::exit(1); }
                };
                i += 1;
            }
            "--corpus" => { corpus_path = PathBuf::from(flag_value(args, i, "--corpus")); i += 1; }
            word => words.push(word.to_string()),
        }
        i += 1;
    }

    let chunks = load_corpus(&corpus_path).map_err(|e| {
        if matches!(e, Error::NotFound(_)) { eprintln!("❌ Corpus not found. Run `pdfrag build` first."); }
        e
    })?;
    println!("📚 Loaded {} chunks from {}", chunks.len(), corpus_path.display());
    let embedder = load_embedder(&settings.embedding)?;
    let index = FlatIndex::build(chunks, embedder.as_ref())?;

    let mut settings = settings.clone();
    settings.retrieval.k = k;
    if let Err(e) = settings.completion.credential() {
        eprintln!("⚠️  Warning: {e}. Answers will show retrieved documents only.");
    }
    let engine = QueryEngine::new(index, embedder, &settings)?;
    println!(
        "✅ Index ready: {} vectors, top {} per question, model {}",
        engine.index().len(),
        engine.k(),
        settings.completion.model
    );

    if !words.is_empty() {
        let question = words.join(" ");
        return match engine.ask(&question) {
            Ok(result) => { print_result(&result); Ok(()) }
            Err(Error::EmptyQuestion) => { eprintln!("Please enter a question."); std::process::exit(2); }
            Err(e) => Err(e.into()),
        };
    }
    interactive_loop(&engine)
}

fn interactive_loop<VI: VectorIndex>(engine: &QueryEngine<VI>) -> anyhow::Result<()> {
    println!("Ask a question about the documents (/quit to exit).");
    let stdin = io::stdin();
    loop {
        print!("question> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 { break; }
        let input = input.trim();
        if input == "/quit" || input == "/q" { break; }
        match engine.ask(input) {
            Ok(result) => print_result(&result),
            Err(Error::EmptyQuestion) => println!("Please enter a question."),
            Err(e) => println!("❌ {e}"),
        }
    }
    Ok(())
}

fn print_result(result: &QueryResult) {
    println!("\nAnswer");
    match &result.answer {
        Answer::Generated(text) => println!("{text}"),
        Answer::Unavailable { warning } => println!("⚠️  Warning: {warning}"),
    }
    println!("\nReferenced documents");
    for (i, (chunk, score)) in result.supporting_chunks.iter().zip(&result.scores).enumerate() {
        println!("DOC {} - source: {}, chunk_id: {} (score {:.3})", i + 1, chunk.source, chunk.chunk_id, score);
        println!("    {}", excerpt(&chunk.text, 300));
    }
    println!();
}

fn excerpt(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars { out.push('…'); }
    out
}
