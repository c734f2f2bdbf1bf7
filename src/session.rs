//! Session lifecycle: one tool-server connection and one conversation for
//! the life of the process.
//!
//! A session is opened once (handshake, discovery, system prompt), then fed
//! user lines until an exit keyword, end of input or an interrupt. [`Session::shutdown`]
//! releases the tool server and asks the endpoint to unload the model; errors
//! from that cleanup are swallowed.

use std::future::Future;
use std::io::{BufRead, Write};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::agent::{AgentLoop, ChatClient, Conversation, OllamaClient, TurnOutcome};
use crate::config::Config;
use crate::mcp::StdioMcpClient;
use crate::tools::{build_tools_schema, ToolProvider, ToolSchema};
use crate::ui;
use crate::Result;

/// Inputs that end the session (case-insensitive).
pub const EXIT_COMMANDS: [&str; 3] = ["exit", "quit", "bye"];

pub fn is_exit_command(input: &str) -> bool {
    EXIT_COMMANDS
        .iter()
        .any(|cmd| input.trim().eq_ignore_ascii_case(cmd))
}

/// User lines fed to [`Session::run`]. A closed channel is end of input.
pub type InputLines = mpsc::Receiver<std::io::Result<String>>;

/// Read stdin line by line on a dedicated thread.
///
/// The blocking read stays off the runtime, so a pending read never holds up
/// shutdown after an interrupt.
pub fn stdin_lines() -> InputLines {
    let (tx, rx) = mpsc::channel(1);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let failed = line.is_err();
            if tx.blocking_send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

/// How the input loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    ExitCommand,
    EndOfInput,
    Interrupted,
}

pub struct Session<C: ChatClient, P: ToolProvider> {
    agent: AgentLoop<C>,
    tools: P,
    schema: Vec<ToolSchema>,
    conversation: Conversation,
}

/// Session against a real chat endpoint and a spawned tool server.
pub type LiveSession = Session<OllamaClient, StdioMcpClient>;

impl LiveSession {
    /// Connect everything described by `config`.
    pub async fn start(config: &Config) -> Result<Self> {
        let tools = StdioMcpClient::connect(config).await?;
        let agent = AgentLoop::from_config(OllamaClient::from_config(config), config);
        Session::open(agent, tools, &config.system_prompt).await
    }
}

impl<C: ChatClient, P: ToolProvider> Session<C, P> {
    /// Discover tools on an initialized provider and start the conversation.
    pub async fn open(agent: AgentLoop<C>, mut tools: P, system_prompt: &str) -> Result<Self> {
        let descriptors = tools.list_tools().await?;
        let schema = build_tools_schema(&descriptors);
        info!("session opened with {} tools", schema.len());

        Ok(Self {
            agent,
            tools,
            schema,
            conversation: Conversation::new(system_prompt),
        })
    }

    pub fn tools(&self) -> &[ToolSchema] {
        &self.schema
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Append `input` as a user message and run one turn.
    pub async fn handle_turn(&mut self, input: &str) -> Result<TurnOutcome> {
        self.conversation.push_user(input);
        self.agent
            .run(&mut self.conversation, &mut self.tools, &self.schema)
            .await
    }

    /// Read user lines from `input`, writing prompts and answers to `out`.
    ///
    /// The loop ends when `interrupt` completes while waiting for input. A
    /// failed turn is reported on stderr and the loop keeps going.
    pub async fn run<W, F>(&mut self, mut input: InputLines, out: &mut W, interrupt: F) -> Result<SessionEnd>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        tokio::pin!(interrupt);

        loop {
            write!(out, "> ")?;
            out.flush()?;

            let line = tokio::select! {
                line = input.recv() => line,
                () = &mut interrupt => {
                    writeln!(out)?;
                    return Ok(SessionEnd::Interrupted);
                }
            };

            let Some(line) = line.transpose()? else {
                writeln!(out)?;
                return Ok(SessionEnd::EndOfInput);
            };

            let text = line.trim();
            if text.is_empty() {
                continue;
            }
            if is_exit_command(text) {
                return Ok(SessionEnd::ExitCommand);
            }

            match self.handle_turn(text).await {
                Ok(outcome) => {
                    debug!(
                        "turn finished: hops={}, tool_calls={}, stop={:?}",
                        outcome.hops, outcome.tool_calls, outcome.stop
                    );
                    // Only this turn's text; a turn without any prints an empty line.
                    writeln!(out, "{}", outcome.answer.unwrap_or_default())?;
                }
                Err(e) => ui::print_error(&e.to_string()),
            }
        }
    }

    /// Release the tool server and unload the model. Never fails.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.tools.close().await {
            warn!("closing tool server failed: {}", e);
        }
        if let Err(e) = self.agent.client().unload().await {
            debug!("model unload failed (ignored): {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::llm::{ChatResponse, ScriptedChatClient};
    use crate::agent::Role;
    use crate::error::Error;
    use crate::tools::ScriptedTools;
    use std::future::pending;
    use std::time::Duration;

    /// Lines followed by end of input.
    fn lines(text: &str) -> InputLines {
        let (tx, rx) = mpsc::channel(text.lines().count().max(1));
        for line in text.lines() {
            tx.try_send(Ok(line.to_string())).unwrap();
        }
        rx
    }

    async fn session(
        responses: Vec<ChatResponse>,
        tools: ScriptedTools,
    ) -> Session<ScriptedChatClient, ScriptedTools> {
        let agent = AgentLoop::new(ScriptedChatClient::new(responses), 5);
        Session::open(agent, tools, "system prompt").await.unwrap()
    }

    #[test]
    fn test_exit_keywords() {
        for word in ["exit", "EXIT", "Quit", "bye", "  Bye "] {
            assert!(is_exit_command(word), "{}", word);
        }
        for word in ["exiting", "q", "goodbye", ""] {
            assert!(!is_exit_command(word), "{}", word);
        }
    }

    #[tokio::test]
    async fn test_exit_keywords_end_loop_without_user_message() {
        for word in ["exit", "EXIT", "Quit", "bye"] {
            let mut s = session(vec![], ScriptedTools::new()).await;
            let input = format!("\n{}\nnever read\n", word);
            let mut out = Vec::new();

            let end = s.run(lines(&input), &mut out, pending()).await.unwrap();

            assert_eq!(end, SessionEnd::ExitCommand);
            assert_eq!(s.conversation().len(), 1);
            assert_eq!(s.agent.client().request_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_end_of_input() {
        let mut s = session(vec![], ScriptedTools::new()).await;
        let mut out = Vec::new();
        let end = s.run(lines(""), &mut out, pending()).await.unwrap();
        assert_eq!(end, SessionEnd::EndOfInput);
    }

    #[tokio::test]
    async fn test_prints_final_answer() {
        let mut s = session(
            vec![
                ChatResponse::with_tool_calls(None, &[("get_time", "{}")]),
                ChatResponse::text("It is ten o'clock."),
            ],
            ScriptedTools::new().with_text("get_time", "2024-05-01T10:00:00"),
        )
        .await;
        let mut out = Vec::new();

        s.run(lines("what time is it?\nbye\n"), &mut out, pending())
            .await
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed, "> It is ten o'clock.\n> ");
        assert_eq!(s.tools().len(), 1);
        assert_eq!(s.conversation().len(), 4);
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_session_alive() {
        let mut s = session(
            vec![
                ChatResponse::with_tool_calls(None, &[("read_text", "{}")]),
                ChatResponse::text("Hello again."),
            ],
            ScriptedTools::new().with_failure("read_text", "boom"),
        )
        .await;
        let mut out = Vec::new();

        let end = s.run(lines("read it\nhi\n"), &mut out, pending()).await.unwrap();

        assert_eq!(end, SessionEnd::EndOfInput);
        assert!(String::from_utf8(out).unwrap().contains("Hello again."));
        let users = s
            .conversation()
            .messages()
            .iter()
            .filter(|m| m.role == Role::User)
            .count();
        assert_eq!(users, 2);
    }

    #[tokio::test]
    async fn test_turn_without_content_prints_empty_line() {
        // Earlier answers are not repeated for a turn that produced no text.
        let mut s = session(
            vec![ChatResponse::text("first answer"), ChatResponse::default()],
            ScriptedTools::new(),
        )
        .await;
        let mut out = Vec::new();

        s.run(lines("one\ntwo\nbye\n"), &mut out, pending()).await.unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "> first answer\n> \n> ");
    }

    #[tokio::test]
    async fn test_interrupt_while_waiting_for_input() {
        let mut s = session(vec![], ScriptedTools::new()).await;
        let (_tx, rx) = mpsc::channel(1);
        let mut out = Vec::new();

        let end = s.run(rx, &mut out, async {}).await.unwrap();

        assert_eq!(end, SessionEnd::Interrupted);
        assert_eq!(String::from_utf8(out).unwrap(), "> \n");
        assert_eq!(s.agent.client().request_count(), 0);
    }

    #[tokio::test]
    async fn test_interrupt_after_a_turn() {
        let mut s = session(vec![ChatResponse::text("Hello!")], ScriptedTools::new()).await;
        let (tx, rx) = mpsc::channel(1);
        tx.send(Ok("hi".to_string())).await.unwrap();
        let mut out = Vec::new();

        let end = s
            .run(rx, &mut out, tokio::time::sleep(Duration::from_millis(100)))
            .await
            .unwrap();

        assert_eq!(end, SessionEnd::Interrupted);
        assert_eq!(String::from_utf8(out).unwrap(), "> Hello!\n> \n");
        drop(tx);
    }

    #[tokio::test]
    async fn test_input_error_ends_loop() {
        let mut s = session(vec![], ScriptedTools::new()).await;
        let (tx, rx) = mpsc::channel(1);
        tx.send(Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin gone"))).await.unwrap();
        let mut out = Vec::new();

        let result = s.run(rx, &mut out, pending()).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn test_history_accumulates_across_turns() {
        let mut s = session(
            vec![ChatResponse::text("one"), ChatResponse::text("two")],
            ScriptedTools::new(),
        )
        .await;

        s.handle_turn("first").await.unwrap();
        s.handle_turn("second").await.unwrap();

        let requests = s.agent.client().requests();
        assert_eq!(requests[1].messages.len(), 4);
        assert_eq!(requests[1].messages[2].content, "one");
        assert_eq!(requests[1].tool_count, 0);
    }

    #[tokio::test]
    async fn test_shutdown_swallows_cleanup_errors() {
        let mut s = session(vec![], ScriptedTools::new()).await;
        s.shutdown().await;

        assert!(s.tools.closed);
        assert_eq!(s.agent.client().unload_count(), 1);
    }
}
