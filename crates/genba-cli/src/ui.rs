//! UI utilities for the CLI

use colored::*;
use crossterm::{
    event::{self, Event, KeyCode},
    terminal::{disable_raw_mode, enable_raw_mode, size},
};
use std::io::{self, IsTerminal, Write};

use genba_core::Result;
use genba_core::locale::{Locale, messages};

/// Display the startup banner
pub fn display_banner(locale: Locale) {
    let terminal_width = size().map(|(w, _)| w as usize).unwrap_or(80);
    let banner_width = std::cmp::min(67, terminal_width.saturating_sub(4));

    let top_border = format!("┌{}┐", "─".repeat(banner_width - 2));
    let bottom_border = format!("└{}┘", "─".repeat(banner_width - 2));
    let empty_line = format!("│{}│", " ".repeat(banner_width - 2));

    println!();
    println!("{}", top_border.yellow());
    println!("{}", empty_line.yellow());

    let title = "genba - Construction Site Inquiry Chatbot";
    let title_line = format!(
        "│  {}{}│",
        title.yellow().bold(),
        " ".repeat(banner_width.saturating_sub(title.len() + 4))
    );
    println!("{}", title_line);

    println!("{}", empty_line.yellow());

    let feature_lines = vec![
        "Ask about the construction work in plain language.",
        "",
        "Commands:",
        "- lang ja|en     switch the answer language",
        "- inquiry on|off forward messages straight to the staff",
        "- help           show the command list",
        "- exit           leave the chat",
    ];

    for line in feature_lines {
        if line.is_empty() {
            println!("{}", empty_line.yellow());
        } else {
            let content = format!(
                "│  {}{}│",
                line,
                " ".repeat(banner_width.saturating_sub(line.len() + 4))
            );
            println!("{}", content.yellow());
        }
    }

    println!("{}", empty_line.yellow());
    println!("{}", bottom_border.yellow());
    println!();
    println!("{}", messages::chat_helper(locale).dimmed());
    println!();
}

/// Handle input with command history navigation
pub async fn handle_input_with_history(history: &mut Vec<String>) -> Result<String> {
    // Piped input: read a line from stdin directly.
    if !io::stdin().is_terminal() {
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_string();
        if !input.is_empty() {
            history.push(input.clone());
        }
        return Ok(input);
    }

    enable_raw_mode()?;
    let mut input = String::new();
    let mut history_index: Option<usize> = None;
    let mut cursor_pos = 0;

    print!("{} ", "genba>".green().bold());
    io::stdout().flush()?;

    loop {
        if let Event::Key(key_event) = event::read()? {
            match key_event.code {
                KeyCode::Enter => {
                    disable_raw_mode()?;
                    println!();
                    if !input.is_empty() {
                        history.push(input.clone());
                    }
                    return Ok(input);
                }
                KeyCode::Char(c) => {
                    input.insert(cursor_pos, c);
                    cursor_pos += 1;
                    print!("\r{} {}", "genba>".green().bold(), input);
                    io::stdout().flush()?;
                }
                KeyCode::Backspace => {
                    if cursor_pos > 0 {
                        input.remove(cursor_pos - 1);
                        cursor_pos -= 1;
                        print!(
                            "\r{} {}  \r{} {}",
                            "genba>".green().bold(),
                            input,
                            "genba>".green().bold(),
                            input
                        );
                        io::stdout().flush()?;
                    }
                }
                KeyCode::Up => {
                    if !history.is_empty() {
                        let new_index = match history_index {
                            None => history.len() - 1,
                            Some(idx) if idx > 0 => idx - 1,
                            Some(idx) => idx,
                        };
                        history_index = Some(new_index);
                        input = history[new_index].clone();
                        cursor_pos = input.len();
                        print!(
                            "\r{} {}  \r{} {}",
                            "genba>".green().bold(),
                            " ".repeat(50),
                            "genba>".green().bold(),
                            input
                        );
                        io::stdout().flush()?;
                    }
                }
                KeyCode::Down => {
                    if let Some(idx) = history_index {
                        if idx < history.len() - 1 {
                            let new_index = idx + 1;
                            history_index = Some(new_index);
                            input = history[new_index].clone();
                        } else {
                            history_index = None;
                            input.clear();
                        }
                        cursor_pos = input.len();
                        print!(
                            "\r{} {}  \r{} {}",
                            "genba>".green().bold(),
                            " ".repeat(50),
                            "genba>".green().bold(),
                            input
                        );
                        io::stdout().flush()?;
                    }
                }
                KeyCode::Esc => {
                    disable_raw_mode()?;
                    println!();
                    return Ok(String::new());
                }
                _ => {}
            }
        }
    }
}

/// Display the in-chat command list
pub fn print_help(locale: Locale) {
    match locale {
        Locale::Ja => {
            println!("{}", "利用できるコマンド:".bold());
            println!("  {} - 工事に関する質問をそのまま入力してください", "質問".green());
            println!("  {} - 回答言語を切り替えます", "lang ja|en".green());
            println!("  {} - 問い合わせモードを切り替えます", "inquiry on|off".green());
            println!("  {} - このヘルプを表示します", "help".green());
            println!("  {} - チャットを終了します", "exit/quit".green());
        }
        Locale::En => {
            println!("{}", "Available commands:".bold());
            println!("  {} - Type construction-related questions as-is", "question".green());
            println!("  {} - Switch the answer language", "lang ja|en".green());
            println!("  {} - Toggle direct-to-staff inquiry mode", "inquiry on|off".green());
            println!("  {} - Show this help message", "help".green());
            println!("  {} - Exit the application", "exit/quit".green());
        }
    }
    println!();
}
