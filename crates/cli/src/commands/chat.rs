//! `parley chat` — Interactive or single-message chat mode.

use std::io::Write;

use parley_agent::{PersonaEngine, Reply, ReplyRoute, Session};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{bootstrap, GlobalOpts};

/// What a line typed at the `You:` prompt asks for.
#[derive(Debug, PartialEq, Eq)]
enum LineCommand {
    Empty,
    Help,
    Reset,
    Quit,
    Say(String),
}

fn parse_line(line: &str) -> LineCommand {
    let trimmed = line.trim();
    match trimmed.to_lowercase().as_str() {
        "" => LineCommand::Empty,
        "help" | "?" => LineCommand::Help,
        "reset" => LineCommand::Reset,
        "quit" | "exit" | "bye" => LineCommand::Quit,
        _ => LineCommand::Say(trimmed.to_string()),
    }
}

/// Outcome of reading one line from stdin.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Line(String),
    Unreadable,
    Eof,
}

/// Invalid UTF-8 costs one line, not the session.
fn classify(read: std::io::Result<Option<String>>) -> std::io::Result<Input> {
    match read {
        Ok(Some(line)) => Ok(Input::Line(line)),
        Ok(None) => Ok(Input::Eof),
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            tracing::warn!(error = %e, "Skipping unreadable input line");
            Ok(Input::Unreadable)
        }
        Err(e) => Err(e),
    }
}

fn print_banner(runtime: &bootstrap::Runtime) {
    let mode = if runtime.engine.is_online() {
        format!("{} ({})", runtime.config.provider.name, runtime.config.provider.model)
    } else {
        "offline".to_string()
    };

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        CAPTAIN JACK SPARROW AI CHATBOT       ║");
    println!("  ║     Not all treasure is silver and gold      ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Persona:   {}", runtime.engine.persona().name);
    println!("  Model:     {mode}");
    println!("  Knowledge: {} facts ({})", runtime.knowledge.len(), runtime.knowledge.embedder_name());
    println!("  Memory:    last {} turns", runtime.config.memory.window_size);
    println!();
    println!("  Type 'help' for commands, 'quit' to leave.");
    println!();
}

fn print_help() {
    println!();
    println!("  Commands:");
    println!("    help, ?            Show this help");
    println!("    reset              Forget the conversation so far");
    println!("    quit, exit, bye    Say goodbye and leave");
    println!();
    println!("  Things to try:");
    println!("    Tell me about the Black Pearl");
    println!("    My name is Elizabeth   (then ask: What's my name?)");
    println!("    Calculate 25 * 4");
    println!();
}

fn print_reply(engine: &PersonaEngine, reply: &Reply) {
    println!("  {}: {}", engine.persona().short_name, reply.text);
    if let ReplyRoute::Offline { reason } = &reply.route {
        tracing::debug!(%reason, "Reply produced offline");
    }
    println!();
}

async fn say(engine: &PersonaEngine, session: &mut Session, utterance: &str) {
    let reply = engine.respond(session, utterance).await;
    print_reply(engine, &reply);
}

pub async fn run(opts: &GlobalOpts, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = bootstrap::build(opts).await?;
    let engine = &runtime.engine;
    let mut session = runtime.session();

    if let Some(msg) = message {
        // Single message mode
        let reply = engine.respond(&mut session, &msg).await;
        println!("{}", reply.text);
        return Ok(());
    }

    print_banner(&runtime);
    say(engine, &mut session, "Hello!").await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You: ");
        std::io::stdout().flush()?;

        let line = match classify(lines.next_line().await)? {
            Input::Line(line) => line,
            Input::Unreadable => {
                println!("  (that line was not valid text, try again)");
                continue;
            }
            Input::Eof => {
                println!();
                break;
            }
        };

        match parse_line(&line) {
            LineCommand::Empty => continue,
            LineCommand::Help => print_help(),
            LineCommand::Reset => {
                session.reset();
                println!("  (memory cleared)");
                println!();
            }
            LineCommand::Quit => {
                say(engine, &mut session, "Goodbye!").await;
                break;
            }
            LineCommand::Say(text) => say(engine, &mut session, &text).await,
        }
    }

    println!("  Fair winds and following seas!");
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_loop_commands() {
        assert_eq!(parse_line("  "), LineCommand::Empty);
        assert_eq!(parse_line("help"), LineCommand::Help);
        assert_eq!(parse_line("?"), LineCommand::Help);
        assert_eq!(parse_line("RESET"), LineCommand::Reset);
        for quit in ["quit", "exit", "Bye "] {
            assert_eq!(parse_line(quit), LineCommand::Quit);
        }
    }

    #[test]
    fn everything_else_is_said() {
        assert_eq!(
            parse_line("  Where's the rum?\n"),
            LineCommand::Say("Where's the rum?".into())
        );
        assert_eq!(parse_line("help me"), LineCommand::Say("help me".into()));
    }

    #[tokio::test]
    async fn invalid_utf8_line_is_skipped() {
        let input: &[u8] = b"ahoy\n\xff\xfe bad\nstill here\n";
        let mut lines = BufReader::new(input).lines();

        let mut seen = Vec::new();
        loop {
            match classify(lines.next_line().await).unwrap() {
                Input::Line(line) => seen.push(line),
                Input::Unreadable => seen.push("<skipped>".into()),
                Input::Eof => break,
            }
        }
        assert_eq!(seen, vec!["ahoy", "<skipped>", "still here"]);
    }

    #[test]
    fn other_read_errors_end_the_session() {
        let broken = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        assert!(classify(Err(broken)).is_err());
        assert_eq!(classify(Ok(None)).unwrap(), Input::Eof);
    }
}
