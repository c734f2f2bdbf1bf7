use colored::*;
use terminal_size::{Width, Height, terminal_size};

use crate::tools::ToolSchema;

pub fn print_header(host: &str, model: &str, server_cmd: &str) {
    let (width, _) = terminal_size().unwrap_or((Width(80), Height(24)));
    let width = (width.0 as usize).min(100);

    let line = "─".repeat(width);
    println!("{}", line.black().bold());

    let name = "toolbridge".yellow().bold();
    let version = format!("v{}", env!("CARGO_PKG_VERSION")).black().bold();
    println!("  {} {}", name, version);

    let info = format!("  {}  •  {}", host, model).cyan();
    println!("{}", info);
    println!("  tools: {}", server_cmd.black().bold());

    println!("{}", line.black().bold());
    println!("  Type {}, {} or {} to leave.\n", "exit".cyan(), "quit".cyan(), "bye".cyan());
}

pub fn print_tools(tools: &[ToolSchema]) {
    if tools.is_empty() {
        print_warning("The tool server advertises no tools");
        return;
    }
    for tool in tools {
        println!("  {} {}", "•".green(), tool.function.name.bold());
        if !tool.function.description.is_empty() {
            println!("      {}", tool.function.description);
        }
    }
}

pub fn print_step(msg: &str) {
    println!("  {} {}", "•".green(), msg);
}

pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠️ ".yellow().bold(), msg.yellow());
}

/// Errors go to stderr so stdout stays the conversation.
pub fn print_error(msg: &str) {
    eprintln!("  {} {}", "❌".red().bold(), msg.red());
}
