//! `assetwright configure` — Build a configuration conversationally.
//!
//! Every line the user types is one turn. `done` accepts the current
//! configuration, `quit` abandons it. Commands ignore case.

use std::io::Write;
use std::sync::Arc;

use assetwright_core::Domain;
use assetwright_corpus::CorpusStore;
use assetwright_engine::{ConfigEngine, ConfigState, ProtocolClassifier, Session, TurnOutcome};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

pub async fn run(domain: Option<Domain>, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_with_api_key()?;
    let oracle = super::oracle_from_config(&config)?;

    let mut engine = ConfigEngine::new(oracle.clone());
    if config.corpus.record_interactions {
        engine = engine.with_corpus(Arc::new(CorpusStore::new(config.corpus_dir())));
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let first = match message {
        Some(msg) => msg,
        None => {
            println!();
            println!("  Describe what you want to set up.");
            prompt()?;
            match lines.next_line().await? {
                Some(line) if !line.trim().is_empty() => line,
                _ => return Ok(()),
            }
        }
    };

    let (domain, first) = match domain {
        Some(domain) => (domain, first),
        None => {
            eprint!("  Classifying...");
            let classification = ProtocolClassifier::new(oracle.clone()).classify(&first).await;
            eprint!("\r                  \r");
            let classification = classification?;
            (classification.target, classification.prompt)
        }
    };

    let policy = config.domains.policy_for(domain);
    let mut session = engine.start_session(domain, policy);

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║       assetwright — Interactive Configure      ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Domain:    {domain}");
    println!("  Policy:    {policy}");
    println!("  Model:     {}", oracle.model());
    println!();
    println!("  Describe changes and press Enter.");
    println!("  Type 'done' to accept, 'quit' to abandon.");
    println!();

    let outcome = engine.turn(&mut session, &first).await?;
    print_outcome(&outcome);

    match converse(&engine, &mut session, &mut lines).await? {
        Some(state) => {
            println!();
            println!("  ✅ Final configuration:");
            println!("{}", state.to_pretty_json());
        }
        None => {
            println!();
            println!("  Configuration abandoned.");
        }
    }
    println!();

    Ok(())
}

/// Read turns until `done`, `quit` or end of input.
///
/// Returns the accepted configuration, or `None` if the session was
/// abandoned.
pub(crate) async fn converse<R>(
    engine: &ConfigEngine,
    session: &mut Session,
    lines: &mut Lines<R>,
) -> Result<Option<ConfigState>, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            session.cancel()?;
            return Ok(None);
        };
        let text = line.trim();
        let command = text.to_ascii_lowercase();

        match command.as_str() {
            "" => continue,
            "done" => match session.finish() {
                Ok(state) => return Ok(Some(state)),
                Err(e) => eprintln!("  [Error] {e}"),
            },
            "quit" | "exit" => {
                session.cancel()?;
                return Ok(None);
            }
            _ => {
                eprint!("  ...");
                let outcome = engine.turn(session, text).await;
                eprint!("\r     \r");
                print_outcome(&outcome?);
            }
        }
    }
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn print_outcome(outcome: &TurnOutcome) {
    println!();
    if let Some(warning) = &outcome.warning {
        eprintln!("  ⚠️  {}", warning.user_hint());
        eprintln!("     ({warning})");
    }
    if outcome.applied {
        if !outcome.changed_fields.is_empty() {
            println!("  Changed: {}", outcome.changed_fields.join(", "));
        }
        for coercion in &outcome.coercions {
            println!(
                "  Adjusted {}: {} -> {}",
                coercion.field, coercion.rejected, coercion.replacement
            );
        }
    }
    if let Some(state) = &outcome.state {
        for line in state.to_pretty_json().lines() {
            println!("  {line}");
        }
    }
    println!();
}
