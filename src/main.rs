use anyhow::Result;
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;

// Import from our modular crates
use genba_cli::{display_banner, handle_input_with_history, print_help};
use genba_core::locale::{Locale, messages};
use genba_core::{
    ConversationMemory, DEFAULT_TOKEN_CEILING, Error, LlmProvider, Session, TokenCounter,
};
use genba_mail::InquiryForwarder;
use genba_openai::OpenAiClient;
use genba_rag::{AnswerChain, IndexStore};

mod logging;

#[derive(Parser)]
#[command(name = "genba")]
#[command(about = "Retrieval-augmented inquiry chatbot for construction-site residents", long_about = None)]
struct Cli {
    /// Folder tree holding the site documents
    #[arg(long, default_value = "./data/rag")]
    data_dir: PathBuf,

    /// Directory the vector index is persisted under
    #[arg(long, default_value = "./.db_all")]
    index_dir: PathBuf,

    /// Directory for rotating log files
    #[arg(long, default_value = "./logs")]
    log_dir: PathBuf,

    /// Initial answer language (ja or en)
    #[arg(long, default_value = "ja")]
    lang: String,

    /// Delete the persisted index and rebuild it from the source tree
    #[arg(long)]
    rebuild: bool,

    /// Start with inquiry mode on (messages go straight to the staff)
    #[arg(long)]
    inquiry: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    logging::init(&cli.log_dir);

    let locale = Locale::parse(&cli.lang).unwrap_or(Locale::Ja);

    // Initialize components
    let provider = Arc::new(OpenAiClient::from_env()?);
    let counter = TokenCounter::for_model(provider.model_id())?;
    let mut session = Session::new(locale, ConversationMemory::new(counter, DEFAULT_TOKEN_CEILING));
    session.inquiry_mode = cli.inquiry;

    if cli.rebuild && cli.index_dir.exists() {
        std::fs::remove_dir_all(&cli.index_dir)?;
    }

    let store = IndexStore::new(provider.clone(), &cli.data_dir);
    let index = match store.get_or_build(&cli.index_dir).await {
        Ok(index) => index,
        Err(e) => {
            tracing::error!(session_id = %session.id, error = %e, "{}", messages::initialize_error(session.locale));
            eprintln!(
                "{}",
                build_error_message(messages::initialize_error(session.locale), session.locale)
                    .red()
            );
            return Err(e.into());
        }
    };

    let mut chain = AnswerChain::new(provider.clone(), index, session.locale);
    let forwarder = InquiryForwarder::from_env(provider.clone());

    display_banner(session.locale);
    tracing::info!(session_id = %session.id, "{}", messages::boot_message(session.locale));

    let mut input_history = Vec::new();

    loop {
        let input = handle_input_with_history(&mut input_history).await?;

        if input.is_empty() {
            continue;
        }

        let lowered = input.to_lowercase();

        // Handle special commands
        if lowered == "exit" || lowered == "quit" {
            break;
        }

        if lowered == "help" {
            print_help(session.locale);
            continue;
        }

        if lowered == "inquiry on" || lowered == "inquiry off" {
            session.inquiry_mode = lowered.ends_with("on");
            let state = if session.inquiry_mode { "on" } else { "off" };
            println!("{}", format!("inquiry mode: {}", state).dimmed());
            continue;
        }

        if let Some(rest) = lowered.strip_prefix("lang ") {
            match Locale::parse(rest) {
                Some(new_locale) => {
                    if new_locale != session.locale {
                        session.locale = new_locale;
                        // Prompts are baked into the chain at construction;
                        // a locale switch rebuilds it over a fresh index load.
                        let index = store.get_or_build(&cli.index_dir).await?;
                        chain = AnswerChain::new(provider.clone(), index, session.locale);
                    }
                    println!("{}", format!("language: {}", session.locale).dimmed());
                }
                None => println!("{}", "usage: lang ja|en".dimmed()),
            }
            continue;
        }

        // Admission check before anything else touches the message.
        if let Err(e) = session.memory.admit(&input) {
            let text = match e {
                Error::InputTooLarge { limit, .. } => {
                    messages::input_limit_error(session.locale, limit)
                }
                other => other.to_string(),
            };
            println!("{}", text.red());
            continue;
        }

        tracing::info!(session_id = %session.id, message = %input, "user message");

        let answer = if session.inquiry_mode {
            println!("{}", messages::spinner_contact(session.locale).dimmed());
            forwarder.send_inquiry(&input, session.locale).await
        } else {
            println!("{}", messages::spinner_search(session.locale).dimmed());
            match chain.answer(&input, &session.memory.messages()).await {
                Ok(answer) => answer,
                Err(e) => {
                    tracing::error!(
                        session_id = %session.id,
                        error = %e,
                        "{}",
                        messages::chain_execution_error(session.locale)
                    );
                    println!(
                        "{}",
                        build_error_message(
                            messages::main_process_error(session.locale),
                            session.locale
                        )
                        .red()
                    );
                    continue;
                }
            }
        };

        session.memory.record_turn(input.as_str(), answer.as_str());
        tracing::info!(session_id = %session.id, message = %answer, "assistant message");

        println!();
        println!("{}", answer);
        println!();
    }

    let goodbye = match session.locale {
        Locale::Ja => "ご利用ありがとうございました。",
        Locale::En => "Goodbye!",
    };
    println!("{}", goodbye.green());

    Ok(())
}

/// Join a failure message with the common contact-the-administrator suffix
fn build_error_message(message: &str, locale: Locale) -> String {
    format!("{}\n{}", message, messages::common_error(locale))
}
